//! `sitemapper generate`: feed entry streams into groups, drain, index, ping.

use anyhow::{Context, Result, anyhow};
use sitemapper_core::{Config, Registry, build_index, write_index};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::cli::{GenerateArgs, InputSource};
use crate::commands::ping::notify;
use crate::error::CliError;
use crate::utils::input;
use crate::utils::settings::{apply_output_args, directory_url};

/// Execute the generate command.
pub async fn execute(args: GenerateArgs, mut config: Config) -> Result<()> {
    apply_output_args(&mut config, &args.output)?;
    check_group_specs(&args)?;
    if args.ping && config.output.base_url.is_none() {
        let err = anyhow!("--ping requires --base-url or output.base_url");
        return Err(CliError::usage(err).into());
    }

    let options = config.group_options().with_mobile(args.mobile);
    let mut registry = Registry::new(&config.output.folder, options).map_err(CliError::usage)?;

    let mut producers = Vec::with_capacity(args.groups.len());
    for spec in args.groups {
        let group = registry.sitemap_group(&spec.name).map_err(CliError::usage)?;
        producers.push(tokio::task::spawn_blocking(move || {
            let reader = input::open(&spec.input)?;
            let added = input::feed(&group, &spec.input, reader)?;
            info!(group = %group.name(), input = %spec.input, added, "Finished reading input");
            Ok::<_, anyhow::Error>(added)
        }));
    }

    // Every group drains even when one of the inputs was bad.
    let mut input_error = None;
    for producer in producers {
        match producer.await.context("input reader panicked")? {
            Ok(_) => {},
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Input failed");
                if input_error.is_none() {
                    input_error = Some(err);
                }
            },
        }
    }

    let report = registry.close_all().await;
    for name in &report.produced {
        println!("{}", config.output.folder.join(name).display());
    }
    if let Some(err) = input_error {
        return Err(err);
    }
    if let Some(failure) = report.failures.into_iter().next() {
        return Err(CliError::storage(failure.error).into());
    }

    let Some(base_url) = config.output.base_url.as_deref().map(directory_url) else {
        info!("No base URL configured; skipping index");
        return Ok(());
    };
    if report.produced.is_empty() {
        warn!("No sitemap files produced; skipping index");
        return Ok(());
    }

    let index = build_index(&report.produced, &base_url);
    let index_path = config.output.folder.join(&config.output.index_name);
    write_index(&index_path, &index, &config.limits).map_err(CliError::storage)?;
    println!("{}", index_path.display());

    if args.ping || config.ping.enabled {
        let index_url = format!("{base_url}{}", config.output.index_name);
        notify(&config, &index_url).await?;
    }
    Ok(())
}

fn check_group_specs(args: &GenerateArgs) -> Result<()> {
    let stdin_groups = args
        .groups
        .iter()
        .filter(|spec| spec.input == InputSource::Stdin)
        .count();
    if stdin_groups > 1 {
        return Err(CliError::usage(anyhow!("only one group can read from stdin")).into());
    }

    let mut seen = HashSet::new();
    for spec in &args.groups {
        let name = sitemapper_core::group::normalize_group_name(&spec.name)
            .map_err(CliError::usage)?;
        if !seen.insert(name) {
            return Err(CliError::usage(anyhow!("group '{}' given twice", spec.name)).into());
        }
    }
    Ok(())
}
