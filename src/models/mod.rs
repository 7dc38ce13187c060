//! Shared data models: records, decoded query parameters, and the JSON
//! envelopes exchanged over HTTP.
//!
//! These types form the wire contract the dashboard already speaks, so
//! field names on the envelopes are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entity instance: an ordered mapping from field name to value.
pub type Record = Map<String, Value>;

/// The record's `id` as a string, accepting numeric ids as well.
pub fn record_id(record: &Record) -> Option<String> {
    record.get("id").and_then(id_from_value)
}

/// Interpret a JSON value as an identifier.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Sort direction as spelled by the dashboard's table component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascend,
    Descend,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ascend" => Some(SortOrder::Ascend),
            "descend" => Some(SortOrder::Descend),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascend => "ascend",
            SortOrder::Descend => "descend",
        }
    }
}

/// A single-column sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorter {
    pub field: String,
    pub order: SortOrder,
}

/// Decoded list-request parameters.
///
/// Pagination is already coerced; every other criterion is optional
/// and simply skipped when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub keyword: Option<String>,
    /// Exact-match filters as `(field, value)` pairs.
    pub filters: Vec<(String, String)>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Raw, still-encoded sorter text.
    pub sorter: Option<String>,
    pub current: usize,
    pub page_size: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            keyword: None,
            filters: Vec::new(),
            start_time: None,
            end_time: None,
            sorter: None,
            current: 1,
            page_size: 10,
        }
    }
}

/// Query engine output.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    /// Number of records that passed the filters, before pagination.
    pub total: usize,
}

/// Response envelope for list requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub data: Vec<Record>,
    pub total: usize,
    pub success: bool,
    pub page_size: usize,
    pub current: usize,
}

/// Mutation verbs carried in the `method` field of a POST body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationMethod {
    Post,
    Update,
    Delete,
}

impl MutationMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "post" => Some(MutationMethod::Post),
            "update" => Some(MutationMethod::Update),
            "delete" => Some(MutationMethod::Delete),
            _ => None,
        }
    }
}

/// POST body: `{ method, id?, ids?, ...fields }`.
///
/// `method` stays a raw value so that unknown verbs are a no-op rather
/// than a decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Value>,
    #[serde(flatten)]
    pub fields: Record,
}

impl MutationRequest {
    pub fn new(method: MutationMethod) -> Self {
        Self {
            method: Some(Value::String(
                match method {
                    MutationMethod::Post => "post",
                    MutationMethod::Update => "update",
                    MutationMethod::Delete => "delete",
                }
                .to_string(),
            )),
            ..Self::default()
        }
    }

    pub fn method(&self) -> Option<MutationMethod> {
        self.method
            .as_ref()
            .and_then(Value::as_str)
            .and_then(MutationMethod::parse)
    }

    pub fn id(&self) -> Option<String> {
        self.id.as_ref().and_then(id_from_value)
    }

    /// Ids targeted by a delete: the `ids` array when it is one,
    /// otherwise the single `id`.
    pub fn target_ids(&self) -> Vec<String> {
        match &self.ids {
            Some(Value::Array(values)) => values.iter().filter_map(id_from_value).collect(),
            _ => self.id().into_iter().collect(),
        }
    }
}

/// Response body for mutation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MutationResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
        }
    }

    pub fn with_data(data: Option<Record>) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Simple health-check response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
