//! Natural-language time expressions.
//!
//! Rules are tried in priority order; the first one that matches and resolves
//! to a valid window wins. A matched phrase (plus any leading preposition) is
//! cut from the query. A leading `since`, `after`, `before`, or `until` turns
//! the window into an open bound. Recency keywords are detected and cut
//! independently.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use recall_core::models::{TemporalFilter, TemporalParse};
use regex::{Captures, Regex};
use tracing::debug;

const ABSOLUTE_CONFIDENCE: f64 = 0.95;
const NAMED_RELATIVE_CONFIDENCE: f64 = 0.9;
const NUMERIC_RELATIVE_CONFIDENCE: f64 = 0.85;
const RECENCY_ONLY_CONFIDENCE: f64 = 0.5;

/// Either a direction word or an optional preposition, consumed with the phrase.
const LEAD: &str = r"(?:\b(?P<dir>since|after|before|until)\s+|(?:\b(?:from|in|during|on|over|within)\s+)?)";
const MONTH_NAME: &str = r"january|february|march|april|may|june|july|august|september|sept|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec";
const COUNT: &str = r"\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve";

#[derive(Debug, Clone, Copy)]
enum RuleKind {
    IsoDate,
    MonthYear,
    Year,
    CountAgo,
    LastCount,
    LastNamed,
    ThisPeriod,
    DayName,
}

struct Rule {
    kind: RuleKind,
    pattern: Regex,
}

/// A resolved window and its confidence.
struct Window {
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    confidence: f64,
}

/// A rule hit: the span to cut, the expression to report, and its window.
struct Hit {
    span: Range<usize>,
    expression: String,
    window: Window,
}

fn rule(kind: RuleKind, pattern: String) -> Rule {
    Rule {
        kind,
        pattern: Regex::new(&pattern).unwrap(),
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(
            RuleKind::IsoDate,
            format!(r"(?i){LEAD}\b(?P<phrase>(?P<y>\d{{4}})-(?P<m>\d{{2}})-(?P<d>\d{{2}}))\b"),
        ),
        rule(
            RuleKind::MonthYear,
            format!(r"(?i){LEAD}\b(?P<phrase>(?P<month>{MONTH_NAME})\s+(?P<y>\d{{4}}))\b"),
        ),
        rule(
            RuleKind::Year,
            r"(?i)(?:\b(?P<dir>since|after|before|until)\s+|\b(?:in|during)\s+)(?P<phrase>(?P<y>\d{4}))\b"
                .to_string(),
        ),
        rule(
            RuleKind::CountAgo,
            format!(
                r"(?i){LEAD}\b(?P<phrase>(?P<n>{COUNT})\s+(?P<unit>day|week|month|year)s?\s+ago)\b"
            ),
        ),
        rule(
            RuleKind::LastCount,
            format!(
                r"(?i){LEAD}(?:\bthe\s+)?\b(?P<phrase>(?:last|past)\s+(?P<n>{COUNT})\s+(?P<unit>hour|day|week|month|year)s?)\b"
            ),
        ),
        rule(
            RuleKind::LastNamed,
            format!(
                r"(?i){LEAD}(?:\bthe\s+)?\b(?P<phrase>(?:last|past)\s+(?P<unit>week|month|year))\b"
            ),
        ),
        rule(
            RuleKind::ThisPeriod,
            format!(r"(?i){LEAD}\b(?P<phrase>this\s+(?P<unit>week|month|year))\b"),
        ),
        rule(
            RuleKind::DayName,
            format!(r"(?i){LEAD}\b(?P<phrase>today|yesterday)\b"),
        ),
    ]
});

static RECENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:most\s+recent|latest|newest|recently|recent)\b").unwrap()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Parse `query` relative to the current time.
pub fn parse_now(query: &str) -> TemporalParse {
    parse(query, Utc::now())
}

/// Extract a time window and recency intent from `query`.
///
/// Relative expressions resolve against `reference`. Calendar spans are
/// inclusive and run from `00:00:00.000` to `23:59:59.999` UTC.
pub fn parse(query: &str, reference: DateTime<Utc>) -> TemporalParse {
    let mut remaining = query.to_string();
    let mut window = None;
    let mut expression = None;

    for rule in RULES.iter() {
        let Some(hit) = rule
            .pattern
            .captures_iter(&remaining)
            .find_map(|caps| matched(rule.kind, &caps, &remaining, reference))
        else {
            continue;
        };
        debug!(kind = ?rule.kind, expression = %hit.expression, "temporal expression matched");
        cut(&mut remaining, hit.span);
        window = Some(hit.window);
        expression = Some(hit.expression);
        break;
    }

    let mut sort_by_recency = false;
    if let Some(m) = RECENCY.find(&remaining) {
        sort_by_recency = true;
        let keyword = m.as_str().to_string();
        let span = m.range();
        cut(&mut remaining, span);
        expression.get_or_insert(keyword);
    }

    let semantic_query = WHITESPACE.replace_all(remaining.trim(), " ").into_owned();

    match (window, expression) {
        (Some(window), Some(expression)) => TemporalParse {
            filter: Some(TemporalFilter {
                after: window.after,
                before: window.before,
                expression,
                sort_by_recency,
            }),
            semantic_query,
            confidence: window.confidence,
        },
        (None, Some(expression)) => TemporalParse {
            filter: Some(TemporalFilter {
                after: None,
                before: None,
                expression,
                sort_by_recency: true,
            }),
            semantic_query,
            confidence: RECENCY_ONLY_CONFIDENCE,
        },
        _ => TemporalParse {
            filter: None,
            semantic_query,
            confidence: 0.0,
        },
    }
}

fn cut(text: &mut String, span: Range<usize>) {
    text.replace_range(span, " ");
}

fn matched(
    kind: RuleKind,
    caps: &Captures<'_>,
    text: &str,
    reference: DateTime<Utc>,
) -> Option<Hit> {
    let whole = caps.get(0)?;
    let phrase = caps.name("phrase")?;
    let window = resolve(kind, caps, reference)?;
    let (window, start) = match caps.name("dir") {
        Some(dir) => (directed(window, dir.as_str())?, dir.start()),
        None => (window, phrase.start()),
    };
    Some(Hit {
        span: whole.range(),
        expression: text[start..phrase.end()].to_string(),
        window,
    })
}

/// Open the closed window on one side: `since` keeps its start, `after`
/// starts past its end, `before` ends ahead of its start, `until` keeps its end.
fn directed(window: Window, dir: &str) -> Option<Window> {
    let (start, end) = (window.after?, window.before?);
    let (after, before) = match dir.to_ascii_lowercase().as_str() {
        "since" => (Some(start), None),
        "after" => (Some(end.checked_add_signed(Duration::milliseconds(1))?), None),
        "before" => (None, Some(start.checked_sub_signed(Duration::milliseconds(1))?)),
        _ => (None, Some(end)),
    };
    Some(Window {
        after,
        before,
        confidence: window.confidence,
    })
}

fn resolve(kind: RuleKind, caps: &Captures<'_>, reference: DateTime<Utc>) -> Option<Window> {
    match kind {
        RuleKind::IsoDate => {
            let date = NaiveDate::from_ymd_opt(
                caps["y"].parse().ok()?,
                caps["m"].parse().ok()?,
                caps["d"].parse().ok()?,
            )?;
            bounded(day_span(date), ABSOLUTE_CONFIDENCE)
        }
        RuleKind::MonthYear => {
            let month = month_number(&caps["month"])?;
            bounded(month_span(caps["y"].parse().ok()?, month)?, ABSOLUTE_CONFIDENCE)
        }
        RuleKind::Year => bounded(year_span(caps["y"].parse().ok()?)?, ABSOLUTE_CONFIDENCE),
        RuleKind::CountAgo => {
            let n = count(&caps["n"])?;
            let span = match caps["unit"].to_ascii_lowercase().as_str() {
                "day" => day_span(shift_back(reference, "day", n)?.date_naive()),
                "week" => {
                    let start = shift_back(reference, "week", n)?.date_naive();
                    let (after, _) = day_span(start);
                    (after, after + Duration::days(7) - Duration::milliseconds(1))
                }
                "month" => {
                    let then = reference.checked_sub_months(Months::new(n))?;
                    month_span(then.year(), then.month())?
                }
                _ => year_span(reference.year() - i32::try_from(n).ok()?)?,
            };
            bounded(span, NUMERIC_RELATIVE_CONFIDENCE)
        }
        RuleKind::LastCount => {
            let n = count(&caps["n"])?;
            let after = shift_back(reference, &caps["unit"], n)?;
            bounded((after, reference), NUMERIC_RELATIVE_CONFIDENCE)
        }
        RuleKind::LastNamed => {
            let after = shift_back(reference, &caps["unit"], 1)?;
            bounded((after, reference), NAMED_RELATIVE_CONFIDENCE)
        }
        RuleKind::ThisPeriod => {
            let today = reference.date_naive();
            let start = match caps["unit"].to_ascii_lowercase().as_str() {
                "week" => {
                    let offset = today.weekday().num_days_from_monday();
                    day_span(today - Duration::days(offset.into())).0
                }
                "month" => month_span(today.year(), today.month())?.0,
                _ => year_span(today.year())?.0,
            };
            bounded((start, reference), NAMED_RELATIVE_CONFIDENCE)
        }
        RuleKind::DayName => {
            let today = reference.date_naive();
            let date = if caps["phrase"].eq_ignore_ascii_case("today") {
                today
            } else {
                today.pred_opt()?
            };
            bounded(day_span(date), NAMED_RELATIVE_CONFIDENCE)
        }
    }
}

fn bounded((after, before): (DateTime<Utc>, DateTime<Utc>), confidence: f64) -> Option<Window> {
    Some(Window {
        after: Some(after),
        before: Some(before),
        confidence,
    })
}

fn shift_back(reference: DateTime<Utc>, unit: &str, n: u32) -> Option<DateTime<Utc>> {
    let n64 = i64::from(n);
    match unit.to_ascii_lowercase().as_str() {
        "hour" => reference.checked_sub_signed(Duration::hours(n64)),
        "day" => reference.checked_sub_signed(Duration::days(n64)),
        "week" => reference.checked_sub_signed(Duration::weeks(n64)),
        "month" => reference.checked_sub_months(Months::new(n)),
        _ => reference.checked_sub_months(Months::new(n.checked_mul(12)?)),
    }
}

fn count(word: &str) -> Option<u32> {
    let n = match word.to_ascii_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        digits => digits.parse().ok()?,
    };
    Some(n)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&NaiveDateTime::new(date, NaiveTime::MIN))
}

fn day_span(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of(date);
    (start, start + Duration::days(1) - Duration::milliseconds(1))
}

fn month_span(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some((start_of(first), start_of(next) - Duration::milliseconds(1)))
}

fn year_span(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let next = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
    Some((start_of(first), start_of(next) - Duration::milliseconds(1)))
}
