use serde::{Deserialize, Serialize};

/// Inclusive range bounds, ISO-8601 encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchValue {
    pub value: String,
}

/// A single clause: either `{ key, range }` or `{ key, match }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeCondition>,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_value: Option<MatchValue>,
}

impl FieldCondition {
    pub fn range(key: impl Into<String>, range: RangeCondition) -> Self {
        Self {
            key: key.into(),
            range: Some(range),
            match_value: None,
        }
    }

    pub fn matches(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            range: None,
            match_value: Some(MatchValue {
                value: value.into(),
            }),
        }
    }
}

/// Store-native filter: every clause in `must` has to hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreFilter {
    pub must: Vec<FieldCondition>,
}

impl StoreFilter {
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }

    /// Append the clauses of `other`.
    pub fn extend(&mut self, other: StoreFilter) {
        self.must.extend(other.must);
    }

    /// `None` when there are no clauses, so callers never send an empty filter.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_clause_serializes_without_missing_bounds() {
        let filter = StoreFilter {
            must: vec![FieldCondition::range(
                "valid_time",
                RangeCondition {
                    gte: Some("2024-01-01T00:00:00.000Z".into()),
                    lte: None,
                },
            )],
        };
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "must": [{ "key": "valid_time", "range": { "gte": "2024-01-01T00:00:00.000Z" } }]
            })
        );
    }

    #[test]
    fn match_clause_uses_match_key() {
        let cond = FieldCondition::matches("session_id", "s-1");
        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "key": "session_id", "match": { "value": "s-1" } })
        );
    }

    #[test]
    fn empty_filter_becomes_none() {
        assert!(StoreFilter::default().into_option().is_none());
    }
}
