use chrono::{DateTime, SecondsFormat, Utc};
use recall_core::constants::VALID_TIME_FIELD;
use recall_core::models::{FieldCondition, RangeCondition, StoreFilter, TemporalFilter};

/// ISO-8601, millisecond precision, `Z` suffix: `2024-01-01T00:00:00.000Z`.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Range filter on `valid_time`. `None` when the filter has no bounds.
pub fn build_temporal_filter(filter: &TemporalFilter) -> Option<StoreFilter> {
    build_temporal_filter_on(filter, VALID_TIME_FIELD)
}

/// Range filter on `field_name` with inclusive bounds.
pub fn build_temporal_filter_on(filter: &TemporalFilter, field_name: &str) -> Option<StoreFilter> {
    if !filter.has_bounds() {
        return None;
    }
    Some(StoreFilter {
        must: vec![FieldCondition::range(
            field_name,
            RangeCondition {
                gte: filter.after.map(format_timestamp),
                lte: filter.before.map(format_timestamp),
            },
        )],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn filter(after: Option<DateTime<Utc>>, before: Option<DateTime<Utc>>) -> TemporalFilter {
        TemporalFilter {
            after,
            before,
            expression: String::new(),
            sort_by_recency: false,
        }
    }

    #[test]
    fn empty_filter_builds_nothing() {
        assert!(build_temporal_filter(&filter(None, None)).is_none());
    }

    #[test]
    fn recency_only_filter_builds_nothing() {
        let mut f = filter(None, None);
        f.sort_by_recency = true;
        assert!(build_temporal_filter(&f).is_none());
    }

    #[test]
    fn after_only_is_a_single_gte_clause() {
        let d = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let built = build_temporal_filter(&filter(Some(d), None)).unwrap();
        assert_eq!(built.must.len(), 1);
        let clause = &built.must[0];
        assert_eq!(clause.key, "valid_time");
        let range = clause.range.as_ref().unwrap();
        assert_eq!(range.gte.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        assert!(range.lte.is_none());
    }

    #[test]
    fn both_bounds_and_custom_field() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(999);
        let built = build_temporal_filter_on(&filter(Some(a), Some(b)), "timestamp").unwrap();
        let range = built.must[0].range.as_ref().unwrap();
        assert_eq!(built.must[0].key, "timestamp");
        assert_eq!(range.lte.as_deref(), Some("2024-01-31T23:59:59.999Z"));
    }
}
