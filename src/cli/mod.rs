use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::clock;
use crate::models::{ListResponse, MutationRequest, MutationResponse};
use crate::mutation;
use crate::query;
use crate::schema::{self, CollectionInfo};
use crate::server::{self, AppState};
use crate::store::{Collection, Registry};

mod args;
mod config;
mod format;
mod http_backend;

pub use args::{
    Cli, CollectionsArgs, Commands, CreateArgs, DeleteArgs, GetArgs, ListArgs, OutputFormat,
    ServeArgs, TargetArgs, UpdateArgs,
};

use config::{
    apply_list_config_defaults, apply_serve_config_defaults, apply_target_config_defaults,
    load_cli_config, seed_counts_from_args, CliConfig, ServeSection,
};
use http_backend::HttpBackend;

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cli_config = load_cli_config()?;

    match cli.command {
        Some(Commands::Serve(mut serve_args)) => {
            if let Some(ref config) = cli_config {
                apply_serve_config_defaults(config, &mut serve_args);
            }

            let addr: SocketAddr = serve_args
                .addr
                .parse()
                .with_context(|| format!("invalid listen address `{}`", serve_args.addr))?;
            let registry = Registry::seeded(&seed_counts_from_args(&serve_args), clock::now());
            println!("Starting crewdesk HTTP server on http://{addr}");

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(server::run(addr, AppState::new(registry)))?;
            Ok(())
        }
        Some(Commands::List(mut list_args)) => {
            if let Some(ref config) = cli_config {
                apply_list_config_defaults(config, &mut list_args);
            }
            args::validate_collection(&list_args.collection)?;

            let pairs = args::list_query_from_args(&list_args);
            let response = if let Some(server_url) = effective_server_url(
                list_args.target.server.as_deref(),
                list_args.target.no_server,
            ) {
                let backend = HttpBackend::new(server_url)?;
                backend.list(&list_args.collection, &pairs)?
            } else {
                local_list(cli_config.as_ref(), &list_args.collection, &pairs)?
            };

            let schema = schema_for(&list_args.collection)?;
            match list_args.format {
                OutputFormat::Text => format::print_list_text(&response, schema),
                OutputFormat::Table => format::print_list_table(&response, schema),
                OutputFormat::Json => format::print_json(&response),
            }
        }
        Some(Commands::Get(mut get_args)) => {
            if let Some(ref config) = cli_config {
                apply_target_config_defaults(config, &mut get_args.target);
            }
            args::validate_collection(&get_args.collection)?;

            let response = if let Some(server_url) = effective_server_url(
                get_args.target.server.as_deref(),
                get_args.target.no_server,
            ) {
                let backend = HttpBackend::new(server_url)?;
                backend.get(&get_args.collection, &get_args.id)?
            } else {
                let registry = local_registry(cli_config.as_ref());
                let collection = collection_in(&registry, &get_args.collection)?;
                match collection.store().get(&get_args.id)? {
                    Some(record) => MutationResponse::with_data(Some(record)),
                    None => bail!(
                        "no record with id {} in {}",
                        get_args.id,
                        get_args.collection
                    ),
                }
            };

            match (get_args.format, &response.data) {
                (OutputFormat::Json, _) => format::print_json(&response),
                (_, Some(record)) => format::print_record_text(record),
                (_, None) => Ok(()),
            }
        }
        Some(Commands::Create(mut create_args)) => {
            if let Some(ref config) = cli_config {
                apply_target_config_defaults(config, &mut create_args.target);
            }
            args::validate_collection(&create_args.collection)?;

            let request = args::create_request_from_args(&create_args);
            let response = mutate(
                cli_config.as_ref(),
                &create_args.collection,
                &create_args.target,
                request,
            )?;
            format::print_json(&response)
        }
        Some(Commands::Update(mut update_args)) => {
            if let Some(ref config) = cli_config {
                apply_target_config_defaults(config, &mut update_args.target);
            }
            args::validate_collection(&update_args.collection)?;

            let request = args::update_request_from_args(&update_args);
            let response = mutate(
                cli_config.as_ref(),
                &update_args.collection,
                &update_args.target,
                request,
            )?;
            format::print_json(&response)
        }
        Some(Commands::Delete(mut delete_args)) => {
            if let Some(ref config) = cli_config {
                apply_target_config_defaults(config, &mut delete_args.target);
            }
            args::validate_collection(&delete_args.collection)?;

            let request = args::delete_request_from_args(&delete_args);
            let response = mutate(
                cli_config.as_ref(),
                &delete_args.collection,
                &delete_args.target,
                request,
            )?;
            format::print_json(&response)
        }
        Some(Commands::Collections(collections_args)) => {
            let infos: Vec<CollectionInfo> =
                schema::all().iter().map(|schema| schema.describe()).collect();

            match collections_args.format {
                OutputFormat::Text => format::print_collections_text(&infos),
                OutputFormat::Table => format::print_collections_table(&infos),
                OutputFormat::Json => format::print_json(&infos),
            }
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Install the global `tracing` subscriber. Logs go to stderr so that
/// JSON output on stdout stays machine-readable.
fn init_tracing() {
    let filter = std::env::var("CREWDESK_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".into());

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn effective_server_url(server_flag: Option<&str>, no_server: bool) -> Option<String> {
    if no_server {
        None
    } else {
        server_flag.map(|s| s.to_string())
    }
}

/// In-process data, seeded the same way `serve` would seed it.
fn local_registry(config: Option<&CliConfig>) -> Registry {
    let counts = config
        .and_then(|config| config.serve.as_ref())
        .map(ServeSection::seed_counts)
        .unwrap_or_default();
    Registry::seeded(&counts, clock::now())
}

fn local_list(
    config: Option<&CliConfig>,
    collection: &str,
    pairs: &[(String, String)],
) -> Result<ListResponse> {
    let registry = local_registry(config);
    let collection = collection_in(&registry, collection)?;
    Ok(query::run_list(collection, &args::query_map(pairs))?)
}

fn mutate(
    config: Option<&CliConfig>,
    collection: &str,
    target: &TargetArgs,
    request: MutationRequest,
) -> Result<MutationResponse> {
    if let Some(server_url) = effective_server_url(target.server.as_deref(), target.no_server) {
        let backend = HttpBackend::new(server_url)?;
        return backend.mutate(collection, &request);
    }

    let registry = local_registry(config);
    let collection = collection_in(&registry, collection)?;
    let response = mutation::apply(collection, request, clock::now())?;
    warn!(
        collection = collection.schema().name,
        "no server configured; change applied to in-process data only and not kept"
    );
    Ok(response)
}

fn collection_in<'a>(
    registry: &'a Registry,
    name: &str,
) -> Result<&'a Collection> {
    registry
        .get(name)
        .with_context(|| format!("unknown collection `{name}`"))
}

fn schema_for(name: &str) -> Result<&'static schema::EntitySchema> {
    schema::by_name(name).with_context(|| format!("unknown collection `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_server_flag_overrides_configured_url() {
        assert_eq!(
            effective_server_url(Some("http://localhost:8001"), false).as_deref(),
            Some("http://localhost:8001")
        );
        assert_eq!(effective_server_url(Some("http://localhost:8001"), true), None);
        assert_eq!(effective_server_url(None, false), None);
    }

    #[test]
    fn local_registry_uses_configured_seed_counts() {
        let config: CliConfig = toml::from_str("[serve]\nevents = 2\n").expect("config");
        let registry = local_registry(Some(&config));
        let events = registry.get("events").expect("events");
        assert_eq!(events.store().len().expect("len"), 2);
        let activities = registry.get("activities").expect("activities");
        assert_eq!(activities.store().len().expect("len"), 24);
    }
}
