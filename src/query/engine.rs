//! Filter, sort, and paginate a snapshot of records.
//!
//! [`evaluate`] is a pure function over its inputs. Criteria are
//! combined with AND; criteria that cannot be interpreted (a malformed
//! sorter, unparseable date bounds) are skipped instead of failing the
//! request.

use std::cmp::Ordering;

use serde_json::Value;

use crate::clock::{epoch_millis, parse_instant};
use crate::models::{Page, QueryParams, Record, SortOrder, Sorter};
use crate::query::params::parse_sorter;
use crate::schema::EntitySchema;

/// Evaluate `params` against `records` in their stored order.
pub fn evaluate(schema: &EntitySchema, records: &[Record], params: &QueryParams) -> Page {
    let mut matched = filter_records(schema, records, params);

    if let Some(sorter) = params.sorter.as_deref().and_then(parse_sorter) {
        sort_records(&mut matched, &sorter);
    }

    let total = matched.len();
    let start = params.current.saturating_sub(1).saturating_mul(params.page_size);
    let records = matched
        .into_iter()
        .skip(start)
        .take(params.page_size)
        .cloned()
        .collect();

    Page { records, total }
}

/// Records satisfying every supplied filter, in input order.
pub fn filter_records<'a>(
    schema: &EntitySchema,
    records: &'a [Record],
    params: &QueryParams,
) -> Vec<&'a Record> {
    let keyword = params.keyword.as_deref().map(str::to_lowercase);
    let range = date_range(schema, params);

    records
        .iter()
        .filter(|record| match &keyword {
            Some(keyword) => matches_keyword(schema, record, keyword),
            None => true,
        })
        .filter(|record| {
            params
                .filters
                .iter()
                .all(|(field, value)| matches_exact(record, field, value))
        })
        .filter(|record| match &range {
            Some((field, start, end)) => within_range(record, field, *start, *end),
            None => true,
        })
        .collect()
}

/// Case-insensitive substring match across the schema's keyword fields.
fn matches_keyword(schema: &EntitySchema, record: &Record, keyword: &str) -> bool {
    schema.keyword_fields.iter().any(|field| {
        record
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|text| text.to_lowercase().contains(keyword))
    })
}

fn matches_exact(record: &Record, field: &str, expected: &str) -> bool {
    match record.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        _ => false,
    }
}

/// Resolve the inclusive date range, in epoch milliseconds, when both
/// bounds are present and parse and the schema has a date field.
fn date_range(schema: &EntitySchema, params: &QueryParams) -> Option<(&'static str, i128, i128)> {
    let field = schema.date_field?;
    let start = parse_instant(params.start_time.as_deref()?)?;
    let end = parse_instant(params.end_time.as_deref()?)?;
    Some((field, epoch_millis(start), epoch_millis(end)))
}

/// Inclusive containment with one millisecond of slack on each bound.
fn within_range(record: &Record, field: &str, start: i128, end: i128) -> bool {
    let Some(at) = record
        .get(field)
        .and_then(Value::as_str)
        .and_then(parse_instant)
        .map(epoch_millis)
    else {
        return false;
    };
    at > start - 1 && at < end + 1
}

/// Stable single-column sort.
///
/// Keys are computed once per record. Records without a value for the
/// field sort after every record that has one, in either direction.
pub fn sort_records<'a>(records: &mut [&'a Record], sorter: &Sorter) {
    let mut keyed: Vec<(SortKey, &'a Record)> = records
        .iter()
        .map(|record| (SortKey::of(record.get(&sorter.field)), *record))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.directed(b, sorter.order));

    for (slot, (_, record)) in records.iter_mut().zip(keyed) {
        *slot = record;
    }
}

/// Compare two field values in ascending order.
///
/// Values fall into classes ranked date strings, then numbers, then
/// other text, then missing or null. Dates compare by epoch
/// milliseconds, numbers numerically, text case-insensitively with
/// case breaking ties. Two missing values compare equal.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    SortKey::of(a).directed(&SortKey::of(b), SortOrder::Ascend)
}

/// A field value reduced to what the sort compares.
#[derive(Debug)]
enum SortKey {
    Date(i128),
    Number(f64),
    Text(String),
    Missing,
}

impl SortKey {
    fn of(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => SortKey::Missing,
            Some(Value::String(s)) => match parse_instant(s) {
                Some(at) => SortKey::Date(epoch_millis(at)),
                None => SortKey::Text(s.clone()),
            },
            Some(Value::Number(n)) => match n.as_f64() {
                Some(x) => SortKey::Number(x),
                None => SortKey::Text(n.to_string()),
            },
            Some(other) => SortKey::Text(display_text(other)),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Date(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
            SortKey::Missing => 3,
        }
    }

    fn directed(&self, other: &SortKey, order: SortOrder) -> Ordering {
        match (self, other) {
            (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
            (SortKey::Missing, _) => Ordering::Greater,
            (_, SortKey::Missing) => Ordering::Less,
            _ => {
                let ordering = self.ascending(other);
                match order {
                    SortOrder::Ascend => ordering,
                    SortOrder::Descend => ordering.reverse(),
                }
            }
        }
    }

    fn ascending(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Date(x), SortKey::Date(y)) => x.cmp(y),
            (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
            (SortKey::Text(x), SortKey::Text(y)) => locale_compare(x, y),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Approximates a locale-aware comparison: case is ignored first and
/// only breaks ties.
fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}
