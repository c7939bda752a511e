//! `sitemapper index`: rebuild the index from the files in a folder.

use anyhow::{Result, anyhow};
use sitemapper_core::{Config, build_index_from_dir, write_index};

use crate::cli::IndexArgs;
use crate::error::CliError;
use crate::utils::settings::{apply_output_args, directory_url};

/// Execute the index command.
pub fn execute(args: &IndexArgs, mut config: Config) -> Result<()> {
    apply_output_args(&mut config, &args.output)?;
    let base_url = config
        .output
        .base_url
        .as_deref()
        .map(directory_url)
        .ok_or_else(|| CliError::usage(anyhow!("--base-url or output.base_url is required")))?;

    let folder = &config.output.folder;
    if !folder.is_dir() {
        let err = anyhow!("folder {} does not exist", folder.display());
        return Err(CliError::not_found(err).into());
    }

    let index = build_index_from_dir(folder, &config.output.index_name, &base_url)?;
    if index.is_empty() {
        let err = anyhow!("no sitemap files in {}", folder.display());
        return Err(CliError::not_found(err).into());
    }
    let index_path = folder.join(&config.output.index_name);
    write_index(&index_path, &index, &config.limits).map_err(CliError::storage)?;

    println!("{} ({} sitemaps)", index_path.display(), index.len());
    Ok(())
}
