//! Create, update, and delete requests against a collection.
//!
//! The wire protocol is a single POST body whose `method` selects the
//! verb. Record construction and merging are pure functions over the
//! schema; [`apply`] wires them to the collection's store.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Number, Value};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::clock::{epoch_millis, format_iso};
use crate::error::MutationError;
use crate::models::{record_id, MutationMethod, MutationRequest, MutationResponse, Record};
use crate::schema::{CreateDefault, EntitySchema, FieldKind, FieldSpec, UpdateRule};
use crate::store::Collection;

/// Apply a POST-body mutation to a collection.
///
/// A body without a `method` key is a plain REST create. A `method`
/// that is present but not recognized is accepted as a no-op.
pub fn apply(
    collection: &Collection,
    request: MutationRequest,
    now: OffsetDateTime,
) -> Result<MutationResponse, MutationError> {
    let method = match &request.method {
        None => Some(MutationMethod::Post),
        Some(_) => request.method(),
    };

    match method {
        Some(MutationMethod::Post) => {
            let record = create(collection, &request.fields, now)?;
            Ok(MutationResponse::with_data(Some(record)))
        }
        Some(MutationMethod::Update) => {
            let id = request
                .id()
                .ok_or(MutationError::MissingId(collection.schema().missing_id_message))?;
            let updated = update(collection, &id, &request.fields, now)?;
            Ok(MutationResponse::with_data(updated))
        }
        Some(MutationMethod::Delete) => {
            delete(collection, &request.target_ids())?;
            Ok(MutationResponse::ok())
        }
        None => {
            debug!(
                collection = collection.schema().name,
                method = ?request.method,
                "ignoring mutation without a known method"
            );
            Ok(MutationResponse::ok())
        }
    }
}

/// Build a record from request fields and prepend it to the store.
pub fn create(
    collection: &Collection,
    fields: &Record,
    now: OffsetDateTime,
) -> Result<Record, MutationError> {
    let schema = collection.schema();
    let record = build_record(schema, fields, &next_id(now), now);
    collection.store().insert(record.clone())?;
    let id = record_id(&record).unwrap_or_default();
    info!(collection = schema.name, id = %id, "created record");
    Ok(record)
}

/// Merge request fields into the stored record with `id`.
///
/// Returns `None` when no record carries that id.
pub fn update(
    collection: &Collection,
    id: &str,
    fields: &Record,
    now: OffsetDateTime,
) -> Result<Option<Record>, MutationError> {
    let schema = collection.schema();
    let store = collection.store();
    let Some(existing) = store.get(id)? else {
        warn!(collection = schema.name, id, "update target not found");
        return Ok(None);
    };

    let merged = merge_record(schema, &existing, fields, now);
    if !store.replace(merged.clone())? {
        // Deleted between the read and the write.
        return Ok(None);
    }
    info!(collection = schema.name, id, "updated record");
    Ok(Some(merged))
}

/// Remove every listed id. Returns the number of records removed.
pub fn delete(collection: &Collection, ids: &[String]) -> Result<usize, MutationError> {
    let removed = collection.store().remove(ids)?;
    info!(
        collection = collection.schema().name,
        requested = ids.len(),
        removed,
        "deleted records"
    );
    Ok(removed)
}

/// Construct a new record in schema field order.
///
/// System fields are generated; data fields take the request value
/// when it is present and not blank, else the schema default.
pub fn build_record(
    schema: &EntitySchema,
    fields: &Record,
    id: &str,
    now: OffsetDateTime,
) -> Record {
    let mut record = Record::new();
    for spec in schema.fields {
        let supplied = if spec.is_system() {
            None
        } else {
            fields
                .get(spec.name)
                .filter(|v| !is_blank(v))
                .and_then(|v| coerce(spec, v))
        };

        let value = supplied.or_else(|| default_value(spec, id, now));
        if let Some(value) = value {
            record.insert(spec.name.to_string(), value);
        }
    }
    record
}

/// Merge request fields over an existing record.
///
/// Only schema fields are merged; sticky fields ignore blank values;
/// numeric values that fail to coerce keep the stored value; the stamp
/// field is set to `now`.
pub fn merge_record(
    schema: &EntitySchema,
    existing: &Record,
    fields: &Record,
    now: OffsetDateTime,
) -> Record {
    let mut record = existing.clone();
    for spec in schema.fields {
        match spec.on_update {
            UpdateRule::Fixed => {}
            UpdateRule::Stamp => {
                record.insert(spec.name.to_string(), Value::String(format_iso(now)));
            }
            UpdateRule::Overwrite | UpdateRule::KeepWhenBlank => {
                let Some(value) = fields.get(spec.name) else {
                    continue;
                };
                if spec.on_update == UpdateRule::KeepWhenBlank && is_blank(value) {
                    continue;
                }
                let coerced = if is_blank(value) {
                    Some(value.clone())
                } else {
                    coerce(spec, value)
                };
                if let Some(coerced) = coerced {
                    record.insert(spec.name.to_string(), coerced);
                }
            }
        }
    }
    record
}

/// Values the dashboard treats as "not filled in".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Coerce a request value to the field's storage shape.
fn coerce(spec: &FieldSpec, value: &Value) -> Option<Value> {
    match spec.kind {
        FieldKind::Number => match value {
            Value::Number(_) => Some(value.clone()),
            Value::String(s) => parse_number(s.trim()),
            _ => None,
        },
        FieldKind::Text | FieldKind::Timestamp | FieldKind::Category(_) => Some(value.clone()),
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(Value::Number(n.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn default_value(spec: &FieldSpec, id: &str, now: OffsetDateTime) -> Option<Value> {
    match spec.on_create {
        CreateDefault::Absent => None,
        CreateDefault::Id => Some(Value::String(id.to_string())),
        CreateDefault::Now => Some(Value::String(format_iso(now))),
        CreateDefault::NowPlusHours(hours) => {
            Some(Value::String(format_iso(now + Duration::hours(hours))))
        }
        CreateDefault::Text(text) => Some(Value::String(text.to_string())),
        CreateDefault::Number(n) => Some(Value::Number(n.into())),
    }
}

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Millisecond-timestamp id, strictly increasing within the process.
fn next_id(now: OffsetDateTime) -> String {
    let candidate = u64::try_from(epoch_millis(now)).unwrap_or(0);
    let previous = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(candidate.max(last + 1))
        })
        .unwrap_or(0);
    candidate.max(previous + 1).to_string()
}
