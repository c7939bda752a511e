//! `sitemapper ping`: notify search engines about an index URL.

use anyhow::{Result, anyhow};
use sitemapper_core::{Config, Pinger};

use crate::cli::PingArgs;
use crate::error::CliError;

/// Execute the ping command.
pub async fn execute(args: PingArgs, config: Config) -> Result<()> {
    url::Url::parse(&args.url)
        .map_err(|e| CliError::usage(anyhow!("invalid index URL '{}': {e}", args.url)))?;
    notify(&config, &args.url).await
}

/// Ping every configured endpoint and print one line per outcome.
///
/// Fails only when no endpoint accepted the ping.
pub async fn notify(config: &Config, index_url: &str) -> Result<()> {
    if config.ping.endpoints.is_empty() {
        return Err(CliError::usage(anyhow!("no ping endpoints configured")).into());
    }

    let pinger =
        Pinger::new(&config.ping.endpoints, config.ping.timeout()).map_err(CliError::usage)?;
    let outcomes = pinger.ping(index_url).await;

    for outcome in &outcomes {
        match (&outcome.status, &outcome.error) {
            (Some(status), None) => println!("pinged {} ({status})", outcome.endpoint),
            (_, Some(error)) => println!("failed {}: {error}", outcome.endpoint),
            (None, None) => println!("failed {}", outcome.endpoint),
        }
    }

    if outcomes.iter().any(sitemapper_core::PingOutcome::is_success) {
        Ok(())
    } else {
        Err(CliError::network(anyhow!("no search engine accepted the ping")).into())
    }
}
