//! Logging initialization.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Cli, LogFormat};

/// Level selected by the global verbosity flags.
#[must_use]
pub const fn level_for(cli: &Cli) -> Level {
    if cli.quiet {
        Level::ERROR
    } else if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level_for(cli))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    match cli.log_format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    fn level(args: &[&str]) -> Level {
        let mut argv = vec!["sitemapper"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["ping", "http://example.com/i.xml.gz"]);
        level_for(&Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(level(&[]), Level::WARN);
        assert_eq!(level(&["-v"]), Level::INFO);
        assert_eq!(level(&["--debug"]), Level::DEBUG);
        assert_eq!(level(&["-v", "--debug"]), Level::DEBUG);
        assert_eq!(level(&["-q"]), Level::ERROR);
    }
}
