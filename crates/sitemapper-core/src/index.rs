//! Index assembly from produced names or from a folder of sitemap files.

use crate::codec::{Limits, encode_index};
use crate::group::FILE_SUFFIX;
use crate::sink::write_gzip;
use crate::{Error, Index, Result, SitemapReference};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Build an index from produced file names.
///
/// Each location is `base_url` followed by the name. Every reference carries
/// the same `lastmod`: the time the index was assembled.
///
/// ```rust
/// use sitemapper_core::build_index;
///
/// let index = build_index(&["g_1.xml.gz", "g_2.xml.gz"], "http://example.com/");
/// assert_eq!(index.sitemaps[1].location, "http://example.com/g_2.xml.gz");
/// ```
#[must_use]
pub fn build_index<S: AsRef<str>>(names: &[S], base_url: &str) -> Index {
    let assembled = Utc::now();
    Index {
        sitemaps: names
            .iter()
            .map(|name| {
                SitemapReference::new(format!("{base_url}{}", name.as_ref()))
                    .with_lastmod(assembled)
            })
            .collect(),
    }
}

/// Build an index by scanning `dir` for `.xml.gz` files.
///
/// The index's own file is skipped. Each reference uses the file's
/// modification time on disk. References are ordered by group name, then by
/// sequence number.
///
/// # Errors
///
/// Returns [`Error::Io`] if the folder cannot be listed.
#[instrument(skip(base_url), fields(dir = %dir.display()))]
pub fn build_index_from_dir(dir: &Path, index_file_name: &str, base_url: &str) -> Result<Index> {
    let mut found: Vec<(String, DateTime<Utc>)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.ends_with(FILE_SUFFIX) || name == index_file_name {
            continue;
        }
        found.push((name, DateTime::<Utc>::from(metadata.modified()?)));
    }

    found.sort_by(|(a, _), (b, _)| sequence_key(a).cmp(&sequence_key(b)));
    debug!(files = found.len(), "Scanned sitemap folder");

    Ok(Index {
        sitemaps: found
            .into_iter()
            .map(|(name, modified)| {
                SitemapReference::new(format!("{base_url}{name}")).with_lastmod(modified)
            })
            .collect(),
    })
}

/// Sort key keeping `g_2` before `g_10`.
fn sequence_key(name: &str) -> (&str, Option<u64>, &str) {
    let stem = name.strip_suffix(FILE_SUFFIX).unwrap_or(name);
    match stem.rsplit_once('_') {
        Some((group, seq)) => match seq.parse() {
            Ok(seq) => (group, Some(seq), name),
            Err(_) => (stem, None, name),
        },
        None => (stem, None, name),
    }
}

/// Encode `index` and write it gzip-compressed to `path`.
///
/// # Errors
///
/// - [`Error::Codec`] if the index is empty or holds more references than one
///   document may contain
/// - [`Error::Persistence`] if the file cannot be written
#[instrument(skip(index, limits), fields(path = %path.display(), sitemaps = index.len()))]
pub fn write_index(path: &Path, index: &Index, limits: &Limits) -> Result<()> {
    let bytes = encode_index(&index.sitemaps, limits)?;
    write_gzip(path, &bytes).map_err(|source| Error::Persistence {
        file: path.display().to_string(),
        source,
    })?;
    info!(bytes = bytes.len(), "Wrote sitemap index");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::parse_index;
    use crate::error::CodecError;
    use crate::sink::read_gzip_document;
    use tempfile::TempDir;

    #[test]
    fn test_build_index_from_names() {
        let index = build_index(&["g_1.xml.gz", "g_2.xml.gz"], "http://example.com/");

        assert_eq!(index.len(), 2);
        assert_eq!(index.sitemaps[0].location, "http://example.com/g_1.xml.gz");
        assert_eq!(index.sitemaps[1].location, "http://example.com/g_2.xml.gz");
        assert!(index.sitemaps[0].last_modified.is_some());
        assert_eq!(
            index.sitemaps[0].last_modified,
            index.sitemaps[1].last_modified
        );
    }

    #[test]
    fn test_build_index_of_nothing_is_empty() {
        let names: [&str; 0] = [];
        assert!(build_index(&names, "http://example.com/").is_empty());
    }

    #[test]
    fn test_build_index_from_dir_filters_and_orders() {
        let dir = TempDir::new().unwrap();
        for name in [
            "g_10.xml.gz",
            "g_2.xml.gz",
            "a_1.xml.gz",
            "sitemap_index.xml.gz",
            "notes.txt",
            "plain.xml",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.xml.gz")).unwrap();

        let index =
            build_index_from_dir(dir.path(), "sitemap_index.xml.gz", "https://s.example/")
                .unwrap();

        let locations: Vec<_> = index.iter().map(|s| s.location.as_str()).collect();
        assert_eq!(
            locations,
            vec![
                "https://s.example/a_1.xml.gz",
                "https://s.example/g_2.xml.gz",
                "https://s.example/g_10.xml.gz",
            ]
        );
        assert!(index.iter().all(|s| s.last_modified.is_some()));
    }

    #[test]
    fn test_build_index_from_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let result = build_index_from_dir(&dir.path().join("missing"), "i.xml.gz", "http://a/");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_write_index_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sitemap_index.xml.gz");
        let index = build_index(&["g_1.xml.gz"], "http://example.com/");

        write_index(&path, &index, &Limits::default()).unwrap();

        let xml = read_gzip_document(&path).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        let parsed = parse_index(&xml).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].location, "http://example.com/g_1.xml.gz");
    }

    #[test]
    fn test_write_index_respects_limits() {
        let dir = TempDir::new().unwrap();
        let index = build_index(&["a_1.xml.gz", "a_2.xml.gz", "a_3.xml.gz"], "http://a/");

        let path = dir.path().join("i.xml.gz");
        let result = write_index(&path, &index, &Limits::new(2, 1024));
        assert!(matches!(
            result,
            Err(Error::Codec(CodecError::TooManyEntries { count: 3, limit: 2 }))
        ));
    }

    #[test]
    fn test_write_index_rejects_empty_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("i.xml.gz");
        let names: [&str; 0] = [];

        let result = write_index(&path, &build_index(&names, "http://a/"), &Limits::default());
        assert!(matches!(result, Err(Error::Codec(CodecError::EmptyBatch))));
        assert!(!path.exists());
    }
}
