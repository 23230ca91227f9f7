use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

fn parse_filter_tag(value: &str) -> Result<String, String> {
    let (category, name) = value
        .split_once(':')
        .ok_or_else(|| "expected section:<name> or tag:<name>".to_string())?;
    if !matches!(category.trim(), "section" | "tag") {
        return Err(format!("unknown tag category '{}'", category.trim()));
    }
    if name.trim().is_empty() {
        return Err("tag value cannot be empty".to_string());
    }
    Ok(value.trim().to_string())
}

#[derive(Debug, Parser)]
#[command(
    name = "nbext",
    about = "Configure notebook extensions: toggle them and edit their parameters",
    version
)]
/// Public struct `Cli` used across nbext components.
pub struct Cli {
    #[arg(
        long = "base-url",
        env = "NBEXT_BASE_URL",
        global = true,
        conflicts_with = "config_dir",
        value_name = "url",
        help = "Base URL of a running notebook server, for example http://localhost:8888/"
    )]
    pub base_url: Option<String>,

    #[arg(
        long,
        env = "NBEXT_TOKEN",
        global = true,
        hide_env_values = true,
        value_name = "token",
        help = "Notebook server API token sent as 'Authorization: token <token>'"
    )]
    pub token: Option<String>,

    #[arg(
        long = "config-dir",
        env = "NBEXT_CONFIG_DIR",
        global = true,
        value_name = "path",
        help = "nbconfig directory holding <section>.json files, edited directly instead of over HTTP"
    )]
    pub config_dir: Option<PathBuf>,

    #[arg(
        long = "nbextensions-dir",
        env = "NBEXT_NBEXTENSIONS_DIR",
        global = true,
        value_delimiter = ',',
        value_name = "path",
        help = "nbextensions directory scanned for yaml descriptors (repeatable). Used instead of the server list endpoint when given"
    )]
    pub nbextensions_dir: Vec<PathBuf>,

    #[arg(
        long = "host-version",
        env = "NBEXT_HOST_VERSION",
        global = true,
        value_name = "version",
        help = "Notebook host version. Queried from <base-url>/api when omitted"
    )]
    pub host_version: Option<String>,

    #[arg(
        long,
        env = "NBEXT_JSON",
        global = true,
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Emit command output as pretty JSON"
    )]
    pub json: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
/// Enumerates supported `CliCommand` values.
pub enum CliCommand {
    /// List extensions with their enable state
    List {
        #[arg(long, value_name = "text", help = "Free-text filter; every word must match")]
        filter: Option<String>,
        #[arg(
            long = "tag",
            value_parser = parse_filter_tag,
            value_name = "category:value",
            help = "Restrict to a section:<name> or tag:<name> facet (repeatable)"
        )]
        tags: Vec<String>,
        #[arg(
            long = "show-incompatible",
            help = "Include extensions incompatible with the host version"
        )]
        show_incompatible: bool,
    },
    /// Show one extension with its resolved parameters
    Show { require: String },
    /// Resolve a `?nbextension=<require>` deep link to the focused extension
    Focus {
        #[arg(default_value = "", help = "Query string or full URL")]
        query: String,
    },
    /// Enable an extension
    Enable { require: String },
    /// Disable an extension
    Disable { require: String },
    /// Remove an unconfigurable extension's load_extensions entry
    Forget { require: String },
    /// Print a parameter's current value
    Get { require: String, parameter: String },
    /// Set a parameter, coerced by its input type
    Set {
        require: String,
        parameter: String,
        value: String,
    },
    /// Remove every parameter of an extension from the config
    Reset { require: String },
    /// List filter tags derived from sections and descriptor tags
    Tags,
    /// Persist whether incompatible extensions are hidden
    HideIncompat {
        #[arg(action = ArgAction::Set, value_name = "bool")]
        hide: bool,
    },
    /// Scan nbextensions directories for yaml descriptors
    Discover,
    /// Resolve an extension's readme location
    Readme { require: String },
    /// Read filter text lines from stdin and print the visible list once typing pauses
    Filter {
        #[arg(
            long = "tag",
            value_parser = parse_filter_tag,
            value_name = "category:value",
            help = "Facet applied to every filter line (repeatable)"
        )]
        tags: Vec<String>,
    },
}

impl CliCommand {
    /// Commands that never touch the config store.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Discover)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where section documents are loaded from and saved to.
pub enum CliStoreTarget {
    Http {
        base_url: String,
        token: Option<String>,
    },
    Directory(PathBuf),
}

impl Cli {
    pub fn store_target(&self) -> Option<CliStoreTarget> {
        if let Some(base_url) = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return Some(CliStoreTarget::Http {
                base_url: base_url.to_string(),
                token: self
                    .token
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string),
            });
        }
        self.config_dir.clone().map(CliStoreTarget::Directory)
    }
}
