//! Entry stream parsing.
//!
//! One entry per line: a bare URL, or a JSON object such as
//! `{"location":"https://example.com/","changeFrequency":"daily","priority":0.8}`.
//! Blank lines and lines starting with `#` are skipped.

use anyhow::{Context, Result};
use sitemapper_core::{Entry, SitemapGroup};
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use crate::cli::InputSource;
use crate::error::CliError;

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<Option<Entry>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    if line.starts_with('{') {
        let entry: Entry = serde_json::from_str(line).context("invalid JSON entry")?;
        return Ok(Some(entry));
    }
    Ok(Some(Entry::new(line)))
}

/// Open an input source for line reading.
pub fn open(input: &InputSource) -> Result<Box<dyn BufRead>> {
    match input {
        InputSource::Stdin => Ok(Box::new(io::stdin().lock())),
        InputSource::File(path) => {
            let file = File::open(path).map_err(|e| {
                let err = anyhow::Error::new(e).context(format!("cannot open {}", path.display()));
                if path.exists() {
                    CliError::usage(err)
                } else {
                    CliError::not_found(err)
                }
            })?;
            Ok(Box::new(BufReader::new(file)))
        },
    }
}

/// Feed every entry of `reader` into `group`. Returns the number added.
///
/// Stops at the first malformed or rejected line; errors carry the source
/// and line number.
pub fn feed(group: &SitemapGroup, input: &InputSource, reader: impl BufRead) -> Result<usize> {
    let mut added = 0;
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("{input}:{line_no}: read failed"))?;
        let Some(entry) = parse_line(&line).with_context(|| format!("{input}:{line_no}"))? else {
            continue;
        };
        group
            .add(entry)
            .with_context(|| format!("{input}:{line_no}"))?;
        added += 1;
    }
    Ok(added)
}
