//! List queries over a collection.
//!
//! [`run_list`] is the "query as a function" entry point shared by the
//! HTTP server and the CLI: decode the raw parameters, take a snapshot
//! of the collection, evaluate, and wrap the page in the response
//! envelope.

pub mod engine;
pub mod params;

use std::collections::HashMap;

use tracing::debug;

use crate::error::StoreError;
use crate::models::ListResponse;
use crate::store::Collection;

pub use engine::evaluate;
pub use params::{decode_params, parse_sorter};

/// Execute a list request against a collection.
pub fn run_list(
    collection: &Collection,
    raw: &HashMap<String, String>,
) -> Result<ListResponse, StoreError> {
    let schema = collection.schema();
    let params = decode_params(schema, raw);
    let snapshot = collection.store().all()?;
    let page = evaluate(schema, &snapshot, &params);

    debug!(
        collection = schema.name,
        total = page.total,
        returned = page.records.len(),
        current = params.current,
        page_size = params.page_size,
        "evaluated list query"
    );

    Ok(ListResponse {
        data: page.records,
        total: page.total,
        success: true,
        page_size: params.page_size,
        current: params.current,
    })
}
