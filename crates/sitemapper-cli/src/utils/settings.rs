//! Configuration resolution: file, then environment, then flags.

use anyhow::Result;
use sitemapper_core::Config;
use std::path::Path;
use tracing::debug;

use crate::cli::OutputArgs;
use crate::error::CliError;

/// Load the configuration file and apply `SITEMAPPER_*` overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration");
            Config::load_from(path).map_err(CliError::usage)?
        },
        None => Config::load().map_err(CliError::usage)?,
    };
    config.apply_env_overrides();
    Ok(config)
}

/// Apply output flags and validate the result.
pub fn apply_output_args(config: &mut Config, args: &OutputArgs) -> Result<()> {
    if let Some(folder) = &args.folder {
        config.output.folder.clone_from(folder);
    }
    if let Some(base_url) = &args.base_url {
        config.output.base_url = Some(base_url.clone());
    }
    if let Some(index_name) = &args.index_name {
        config.output.index_name.clone_from(index_name);
    }
    config.validate().map_err(CliError::usage)?;
    Ok(())
}

/// Base URL with exactly one trailing slash, so file names can be appended.
#[must_use]
pub fn directory_url(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}
