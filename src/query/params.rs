//! Decoding raw list-request parameters.
//!
//! Callers hand over the query string as key/value pairs; this module
//! turns them into [`QueryParams`] for a given schema. Nothing here
//! fails: unknown keys are ignored, blank values count as absent, and
//! bad pagination numbers fall back to their defaults.

use std::collections::HashMap;

use serde_json::Value;

use crate::models::{QueryParams, SortOrder, Sorter};
use crate::schema::EntitySchema;

pub const DEFAULT_CURRENT: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Decode query-string pairs against a schema.
///
/// Only the schema's categorical fields are taken as filters, in the
/// schema's declared order.
pub fn decode_params(schema: &EntitySchema, raw: &HashMap<String, String>) -> QueryParams {
    let get = |key: &str| {
        raw.get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let filters = schema
        .filter_fields
        .iter()
        .filter_map(|field| get(field).map(|value| (field.to_string(), value)))
        .collect();

    QueryParams {
        keyword: get("keyword"),
        filters,
        start_time: get("startTime"),
        end_time: get("endTime"),
        sorter: get("sorter"),
        current: coerce_positive(raw.get("current").map(String::as_str), DEFAULT_CURRENT),
        page_size: coerce_positive(raw.get("pageSize").map(String::as_str), DEFAULT_PAGE_SIZE),
    }
}

/// Coerce a pagination value to a positive integer.
///
/// Fractional values truncate; anything absent, non-numeric, or below
/// one yields `default`.
pub fn coerce_positive(raw: Option<&str>, default: usize) -> usize {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return default;
    };

    match value.parse::<f64>() {
        Ok(number) if number.is_finite() && number >= 1.0 => {
            if number >= usize::MAX as f64 {
                usize::MAX
            } else {
                number.trunc() as usize
            }
        }
        _ => default,
    }
}

/// Parse an encoded sorter such as `{"participants":"descend"}`.
///
/// Only the first entry of the object is honored. Anything that is not
/// a JSON object whose first entry maps a non-empty field name to
/// `"ascend"` or `"descend"` yields `None`.
pub fn parse_sorter(raw: &str) -> Option<Sorter> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let (field, order) = value.as_object()?.iter().next()?;
    if field.is_empty() {
        return None;
    }
    let order = SortOrder::parse(order.as_str()?)?;
    Some(Sorter {
        field: field.clone(),
        order,
    })
}

/// Encode a sorter the way the dashboard sends it.
pub fn encode_sorter(sorter: &Sorter) -> String {
    let mut map = serde_json::Map::new();
    map.insert(
        sorter.field.clone(),
        Value::String(sorter.order.as_str().to_string()),
    );
    Value::Object(map).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ACTIVITIES, MANAGED_USERS};

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_pagination_uses_defaults() {
        let params = decode_params(&ACTIVITIES, &HashMap::new());
        assert_eq!(params.current, 1);
        assert_eq!(params.page_size, 10);
        assert_eq!(params, QueryParams::default());
    }

    #[test]
    fn pagination_coercion_handles_bad_numbers() {
        assert_eq!(coerce_positive(Some("3"), 1), 3);
        assert_eq!(coerce_positive(Some(" 20 "), 10), 20);
        assert_eq!(coerce_positive(Some("2.7"), 1), 2);
        assert_eq!(coerce_positive(Some("0"), 1), 1);
        assert_eq!(coerce_positive(Some("-4"), 10), 10);
        assert_eq!(coerce_positive(Some("abc"), 10), 10);
        assert_eq!(coerce_positive(Some("NaN"), 10), 10);
        assert_eq!(coerce_positive(Some("0.5"), 10), 10);
        assert_eq!(coerce_positive(None, 7), 7);
    }

    #[test]
    fn only_schema_filter_fields_are_kept() {
        let params = decode_params(
            &MANAGED_USERS,
            &raw(&[
                ("role", "admin"),
                ("status", "active"),
                ("type", "online"),
                ("name", "用户 1"),
            ]),
        );
        assert_eq!(
            params.filters,
            vec![
                ("status".to_string(), "active".to_string()),
                ("role".to_string(), "admin".to_string()),
            ]
        );
    }

    #[test]
    fn blank_values_count_as_absent() {
        let params = decode_params(
            &ACTIVITIES,
            &raw(&[("keyword", ""), ("status", ""), ("sorter", ""), ("startTime", "")]),
        );
        assert!(params.keyword.is_none());
        assert!(params.filters.is_empty());
        assert!(params.sorter.is_none());
        assert!(params.start_time.is_none());
    }

    #[test]
    fn parse_sorter_honors_first_entry_only() {
        let sorter =
            parse_sorter(r#"{"participants":"descend","title":"ascend"}"#).expect("sorter");
        assert_eq!(sorter.field, "participants");
        assert_eq!(sorter.order, SortOrder::Descend);
    }

    #[test]
    fn parse_sorter_rejects_malformed_input() {
        assert_eq!(parse_sorter("{not json"), None);
        assert_eq!(parse_sorter("{}"), None);
        assert_eq!(parse_sorter(r#"["title"]"#), None);
        assert_eq!(parse_sorter(r#"{"title":"sideways"}"#), None);
        assert_eq!(parse_sorter(r#"{"title":null}"#), None);
        assert_eq!(parse_sorter(r#"{"":"ascend"}"#), None);
    }

    #[test]
    fn encoded_sorter_parses_back() {
        let sorter = Sorter {
            field: "startTime".to_string(),
            order: SortOrder::Ascend,
        };
        assert_eq!(encode_sorter(&sorter), r#"{"startTime":"ascend"}"#);
        assert_eq!(parse_sorter(&encode_sorter(&sorter)), Some(sorter));
    }
}
