use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::args::{OutputFormat, DEFAULT_ADDR};
use crate::cli::{ListArgs, ServeArgs, TargetArgs};
use crate::seed::SeedCounts;

/// Top-level representation of `.crewdesk/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub serve: Option<ServeSection>,

    #[serde(default)]
    pub list: Option<ListSection>,

    #[serde(default)]
    pub http: Option<HttpSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServeSection {
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub activities: Option<usize>,
    #[serde(default)]
    pub managed_users: Option<usize>,
    #[serde(default)]
    pub events: Option<usize>,
}

impl ServeSection {
    pub fn seed_counts(&self) -> SeedCounts {
        let defaults = SeedCounts::default();
        SeedCounts {
            activities: self.activities.unwrap_or(defaults.activities),
            managed_users: self.managed_users.unwrap_or(defaults.managed_users),
            events: self.events.unwrap_or(defaults.events),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSection {
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub no_server: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpSection {
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Discover and load a project-local `.crewdesk/config.toml` (or
/// `.crewdesk/crewdesk.toml`) starting from the current working
/// directory and walking up parent directories.
pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let Some(path) = find_project_config(&cwd) else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    tracing::debug!(path = %path.display(), "loaded project config");
    Ok(Some(config))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let project_dir = current.join(".crewdesk");
        for name in ["config.toml", "crewdesk.toml"] {
            let candidate = project_dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        dir = current.parent();
    }

    None
}

pub fn apply_serve_config_defaults(config: &CliConfig, args: &mut ServeArgs) {
    let Some(serve) = &config.serve else {
        return;
    };

    if args.addr == DEFAULT_ADDR {
        if let Some(addr) = &serve.addr {
            args.addr = addr.clone();
        }
    }
    if args.activities.is_none() {
        args.activities = serve.activities;
    }
    if args.managed_users.is_none() {
        args.managed_users = serve.managed_users;
    }
    if args.events.is_none() {
        args.events = serve.events;
    }
}

/// Seed counts for a server, falling back to the built-in defaults.
pub fn seed_counts_from_args(args: &ServeArgs) -> SeedCounts {
    let defaults = SeedCounts::default();
    SeedCounts {
        activities: args.activities.unwrap_or(defaults.activities),
        managed_users: args.managed_users.unwrap_or(defaults.managed_users),
        events: args.events.unwrap_or(defaults.events),
    }
}

pub fn apply_list_config_defaults(config: &CliConfig, args: &mut ListArgs) {
    if let Some(list) = &config.list {
        if args.page_size.is_none() {
            args.page_size = list.page_size.map(|size| size.to_string());
        }

        if matches!(args.format, OutputFormat::Text) {
            if let Some(format) = list.format {
                args.format = format;
            }
        }

        if args.target.server.is_none() {
            args.target.server = list.server.clone();
        }

        if !args.target.no_server {
            if let Some(true) = list.no_server {
                args.target.no_server = true;
            }
        }
    }

    apply_target_config_defaults(config, &mut args.target);
}

/// Fall back to the global `[http] server_url` when no server was
/// chosen more specifically.
pub fn apply_target_config_defaults(config: &CliConfig, target: &mut TargetArgs) {
    if target.server.is_none() {
        if let Some(http) = &config.http {
            target.server = http.server_url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    use crate::cli::{Cli, Commands};

    fn list_args(extra: &[&str]) -> ListArgs {
        let args = ["crewdesk", "list", "activities"]
            .into_iter()
            .chain(extra.iter().copied());
        match Cli::try_parse_from(args).expect("parse").command {
            Some(Commands::List(args)) => args,
            _ => panic!("expected list command"),
        }
    }

    fn config(toml_text: &str) -> CliConfig {
        toml::from_str(toml_text).expect("valid config")
    }

    #[test]
    fn list_section_fills_unset_flags() {
        let cfg = config(
            r#"
[list]
page_size = 25
format = "json"
server = "http://127.0.0.1:9000"
"#,
        );
        let mut args = list_args(&[]);
        apply_list_config_defaults(&cfg, &mut args);
        assert_eq!(args.page_size.as_deref(), Some("25"));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.target.server.as_deref(), Some("http://127.0.0.1:9000"));
    }

    #[test]
    fn explicit_flags_win_over_config() {
        let cfg = config(
            r#"
[list]
page_size = 25
format = "json"
"#,
        );
        let mut args = list_args(&["--page-size", "3", "--format", "table"]);
        apply_list_config_defaults(&cfg, &mut args);
        assert_eq!(args.page_size.as_deref(), Some("3"));
        assert_eq!(args.format, OutputFormat::Table);
    }

    #[test]
    fn http_section_is_the_fallback_server() {
        let cfg = config(
            r#"
[http]
server_url = "http://localhost:8001"
"#,
        );
        let mut args = list_args(&[]);
        apply_list_config_defaults(&cfg, &mut args);
        assert_eq!(args.target.server.as_deref(), Some("http://localhost:8001"));
    }

    #[test]
    fn serve_section_sets_addr_and_seed_counts() {
        let cfg = config(
            r#"
[serve]
addr = "0.0.0.0:9100"
activities = 3
"#,
        );
        let mut args = match Cli::try_parse_from(["crewdesk", "serve", "--events", "1"])
            .expect("parse")
            .command
        {
            Some(Commands::Serve(args)) => args,
            _ => panic!("expected serve command"),
        };
        apply_serve_config_defaults(&cfg, &mut args);
        assert_eq!(args.addr, "0.0.0.0:9100");

        let counts = seed_counts_from_args(&args);
        assert_eq!(counts.activities, 3);
        assert_eq!(counts.events, 1);
        assert_eq!(counts.managed_users, 36);
    }

    #[test]
    fn config_is_found_in_parent_directories() {
        let tmp = tempdir().expect("tempdir");
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("nested dirs");
        fs::create_dir_all(tmp.path().join(".crewdesk")).expect("config dir");
        fs::write(tmp.path().join(".crewdesk").join("crewdesk.toml"), "").expect("write");

        let found = find_project_config(&nested).expect("config found");
        assert!(found.ends_with(".crewdesk/crewdesk.toml"));
    }
}
