use anyhow::{bail, Result};

use crate::{Cli, CliStoreTarget};

fn resolve_non_empty_cli_value(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Checks flag combinations clap cannot express on its own.
pub fn validate_cli(cli: &Cli) -> Result<()> {
    if let Some(base_url) = resolve_non_empty_cli_value(cli.base_url.as_deref()) {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("--base-url must start with http:// or https://");
        }
    }
    if let Some(version) = cli.host_version.as_deref() {
        if version.trim().is_empty() {
            bail!("--host-version cannot be empty");
        }
    }
    if cli
        .nbextensions_dir
        .iter()
        .any(|path| path.as_os_str().is_empty())
    {
        bail!("--nbextensions-dir cannot be empty");
    }

    if cli.command.is_offline() {
        if cli.nbextensions_dir.is_empty() {
            bail!("--nbextensions-dir is required for discover");
        }
        return Ok(());
    }

    match cli.store_target() {
        None => bail!("either --base-url or --config-dir is required"),
        Some(CliStoreTarget::Directory(_))
            if resolve_non_empty_cli_value(cli.host_version.as_deref()).is_none() =>
        {
            bail!("--host-version is required when --config-dir is set")
        }
        Some(_) => Ok(()),
    }
}
