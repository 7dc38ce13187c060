use std::collections::HashMap;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{MutationMethod, MutationRequest, Record, SortOrder, Sorter};
use crate::query::params::encode_sorter;
use crate::schema;

/// Default bind address for `crewdesk serve`.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8001";

/// Top-level CLI entrypoint for `crewdesk`.
#[derive(Parser, Debug)]
#[command(
    name = "crewdesk",
    about = "In-memory admin backend for the crew dashboard",
    author = "crewdesk developers",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP+JSON server.
    Serve(ServeArgs),
    /// Query a collection (filter, sort, paginate).
    List(ListArgs),
    /// Fetch a single record by id.
    Get(GetArgs),
    /// Create a record.
    Create(CreateArgs),
    /// Update fields of an existing record.
    Update(UpdateArgs),
    /// Delete records by id.
    Delete(DeleteArgs),
    /// Describe the available collections.
    Collections(CollectionsArgs),
}

/// Output format for commands that print records.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Table,
    Json,
}

/// Where a data command runs: against a server, or in-process.
#[derive(Args, Debug, Default)]
pub struct TargetArgs {
    /// Base URL of a running `crewdesk serve` instance.
    ///
    /// When set (either via this flag or the `CREWDESK_SERVER_URL`
    /// environment variable), requests go to that server. Without it
    /// the command runs against freshly seeded in-process data, so
    /// mutations do not outlive the command.
    #[arg(long = "server", env = "CREWDESK_SERVER_URL")]
    pub server: Option<String>,

    /// Disable use of any configured server and run locally.
    #[arg(long = "no-server")]
    pub no_server: bool,
}

/// Arguments specific to the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to.
    #[arg(long = "addr", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Number of synthetic activities to start with.
    #[arg(long = "activities")]
    pub activities: Option<usize>,

    /// Number of synthetic managed users to start with.
    #[arg(long = "managed-users")]
    pub managed_users: Option<usize>,

    /// Number of synthetic events to start with.
    #[arg(long = "events")]
    pub events: Option<usize>,
}

/// Arguments specific to the `list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Collection to query (`activities`, `managed-users`, `events`).
    pub collection: String,

    /// Case-insensitive substring matched against the collection's
    /// keyword fields.
    #[arg(short = 'k', long = "keyword")]
    pub keyword: Option<String>,

    /// Exact-match filter as `field=value` (e.g. `status=live`).
    /// Repeat the flag to combine filters.
    #[arg(short = 'f', long = "filter", value_parser = parse_key_value)]
    pub filters: Vec<(String, String)>,

    /// Lower bound of the date range (inclusive).
    #[arg(long = "start-time", requires = "end_time")]
    pub start_time: Option<String>,

    /// Upper bound of the date range (inclusive).
    #[arg(long = "end-time", requires = "start_time")]
    pub end_time: Option<String>,

    /// Sort as `field:ascend` or `field:descend`.
    #[arg(long = "sort", value_parser = parse_sort, conflicts_with = "sorter")]
    pub sort: Option<Sorter>,

    /// Raw encoded sorter, passed through as-is
    /// (e.g. `{"participants":"descend"}`).
    #[arg(long = "sorter")]
    pub sorter: Option<String>,

    /// 1-based page number.
    #[arg(long = "current")]
    pub current: Option<String>,

    /// Records per page.
    #[arg(long = "page-size")]
    pub page_size: Option<String>,

    /// Output format (text, table, or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments specific to the `get` subcommand.
#[derive(Args, Debug)]
pub struct GetArgs {
    pub collection: String,

    pub id: String,

    /// Output format (text, table, or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments specific to the `create` subcommand.
#[derive(Args, Debug)]
pub struct CreateArgs {
    pub collection: String,

    /// Field value as `field=value`. Repeat for several fields.
    #[arg(short = 's', long = "set", value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments specific to the `update` subcommand.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub collection: String,

    /// Id of the record to update.
    #[arg(long = "id")]
    pub id: String,

    /// Field value as `field=value`. Repeat for several fields.
    #[arg(short = 's', long = "set", value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments specific to the `delete` subcommand.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub collection: String,

    /// Ids to delete. Repeat or separate with commas.
    #[arg(long = "id", value_delimiter = ',', required = true)]
    pub ids: Vec<String>,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments specific to the `collections` subcommand.
#[derive(Args, Debug)]
pub struct CollectionsArgs {
    /// Output format (text, table, or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected field=value, got `{raw}`")),
    }
}

fn parse_sort(raw: &str) -> Result<Sorter, String> {
    let (field, order) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected field:ascend|descend, got `{raw}`"))?;
    let order = match order.to_ascii_lowercase().as_str() {
        "asc" | "ascend" => SortOrder::Ascend,
        "desc" | "descend" => SortOrder::Descend,
        other => return Err(format!("unknown sort direction `{other}`")),
    };
    if field.is_empty() {
        return Err("sort field must not be empty".to_string());
    }
    Ok(Sorter {
        field: field.to_string(),
        order,
    })
}

/// Reject collection names no schema knows about.
pub fn validate_collection(name: &str) -> Result<()> {
    if schema::by_name(name).is_none() {
        let known: Vec<&str> = schema::all().iter().map(|s| s.name).collect();
        bail!("unknown collection `{name}` (expected one of: {})", known.join(", "));
    }
    Ok(())
}

/// Translate `list` arguments into the query-string pairs a list
/// request carries.
pub fn list_query_from_args(args: &ListArgs) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    if let Some(keyword) = &args.keyword {
        pairs.push(("keyword".to_string(), keyword.clone()));
    }
    for (field, value) in &args.filters {
        pairs.push((field.clone(), value.clone()));
    }
    if let (Some(start), Some(end)) = (&args.start_time, &args.end_time) {
        pairs.push(("startTime".to_string(), start.clone()));
        pairs.push(("endTime".to_string(), end.clone()));
    }
    if let Some(sort) = &args.sort {
        pairs.push(("sorter".to_string(), encode_sorter(sort)));
    } else if let Some(sorter) = &args.sorter {
        pairs.push(("sorter".to_string(), sorter.clone()));
    }
    if let Some(current) = &args.current {
        pairs.push(("current".to_string(), current.clone()));
    }
    if let Some(page_size) = &args.page_size {
        pairs.push(("pageSize".to_string(), page_size.clone()));
    }

    pairs
}

/// Collapse query pairs into the map the query layer decodes.
pub fn query_map(pairs: &[(String, String)]) -> HashMap<String, String> {
    pairs.iter().cloned().collect()
}

/// Field values from `--set`, as strings; the mutation layer coerces
/// numeric fields.
pub fn fields_from_pairs(pairs: &[(String, String)]) -> Record {
    pairs
        .iter()
        .map(|(key, raw)| (key.clone(), Value::String(raw.clone())))
        .collect()
}

pub fn create_request_from_args(args: &CreateArgs) -> MutationRequest {
    let mut request = MutationRequest::new(MutationMethod::Post);
    request.fields = fields_from_pairs(&args.set);
    request
}

pub fn update_request_from_args(args: &UpdateArgs) -> MutationRequest {
    let mut request = MutationRequest::new(MutationMethod::Update);
    request.id = Some(Value::String(args.id.clone()));
    request.fields = fields_from_pairs(&args.set);
    request
}

pub fn delete_request_from_args(args: &DeleteArgs) -> MutationRequest {
    let mut request = MutationRequest::new(MutationMethod::Delete);
    request.ids = Some(Value::Array(
        args.ids
            .iter()
            .map(|id| Value::String(id.trim().to_string()))
            .collect(),
    ));
    request
}
