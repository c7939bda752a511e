//! `sitemapper inspect`: summarize a produced file.

use anyhow::{Context, Result, anyhow};
use sitemapper_core::{DocumentKind, detect_kind, parse_index, parse_urlset, read_gzip_document};

use crate::cli::InspectArgs;
use crate::error::CliError;

/// Execute the inspect command.
pub fn execute(args: &InspectArgs) -> Result<()> {
    if !args.file.exists() {
        return Err(CliError::not_found(anyhow!("{} does not exist", args.file.display())).into());
    }

    let xml = read_gzip_document(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))
        .map_err(CliError::usage)?;

    let (kind, locations) = match detect_kind(&xml) {
        Some(DocumentKind::Sitemap) => (
            DocumentKind::Sitemap,
            parse_urlset(&xml)?.into_iter().map(|e| e.location).collect::<Vec<_>>(),
        ),
        Some(DocumentKind::SitemapIndex) => (
            DocumentKind::SitemapIndex,
            parse_index(&xml)?.into_iter().map(|s| s.location).collect(),
        ),
        None => {
            return Err(CliError::usage(anyhow!(
                "{} is not a sitemap or sitemap index",
                args.file.display()
            ))
            .into());
        },
    };

    println!("{}: {kind}, {} entries, {} bytes", args.file.display(), locations.len(), xml.len());
    if args.list {
        for location in locations {
            println!("{location}");
        }
    }
    Ok(())
}
