//! Persistence sinks for produced documents.
//!
//! A [`Sink`] receives one `{name, bytes}` pair per produced file. The engine
//! only cares whether the write succeeded; naming and batching happen
//! upstream.

use crate::{Error, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

/// Destination for encoded documents.
///
/// Implementations are called from blocking worker threads and may be
/// invoked concurrently by different groups.
pub trait Sink: Send + Sync {
    /// Persist one document under `name`.
    fn persist(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Writes gzip-compressed files into a folder.
#[derive(Debug, Clone)]
pub struct GzipFileSink {
    folder: PathBuf,
}

impl GzipFileSink {
    /// Create a sink for `folder`, creating the folder if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the folder cannot be created.
    pub fn new(folder: impl Into<PathBuf>) -> Result<Self> {
        let folder = folder.into();
        fs::create_dir_all(&folder).map_err(|e| {
            Error::Config(format!(
                "Failed to create output folder {}: {e}",
                folder.display()
            ))
        })?;
        Ok(Self { folder })
    }

    /// Folder the sink writes into.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

impl Sink for GzipFileSink {
    fn persist(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        write_gzip(&self.folder.join(name), bytes)
    }
}

/// Compress `bytes` at maximum level and write them to `path`.
///
/// Data goes to a temporary file next to `path`, which is renamed onto
/// `path` once the gzip trailer is written and the file is synced. The
/// compression stream is finished before the file handle is released; on
/// any error the temporary file is removed.
pub fn write_gzip(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut encoder = GzEncoder::new(NamedTempFile::new_in(dir)?, Compression::best());
    encoder.write_all(bytes)?;
    let file = encoder.finish()?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), bytes = bytes.len(), "Wrote gzip document");
    Ok(())
}

/// Inflate a gzip document into a string.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read or is not valid gzip, and
/// [`Error::Parse`] if the content is not UTF-8.
pub fn read_gzip_document(path: &Path) -> Result<String> {
    let mut raw = Vec::new();
    GzDecoder::new(fs::File::open(path)?).read_to_end(&mut raw)?;
    String::from_utf8(raw)
        .map_err(|e| Error::Parse(format!("{} is not UTF-8: {e}", path.display())))
}

/// One document produced by a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedFile {
    /// File name, e.g. `blog_1.xml.gz`.
    pub name: String,
    /// Uncompressed XML bytes.
    pub content: Vec<u8>,
}

/// Keeps produced documents in memory instead of writing them.
///
/// Useful when the caller uploads documents elsewhere, and in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<ProducedFile>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every document persisted so far, in persistence order.
    pub fn take(&self) -> Vec<ProducedFile> {
        self.files
            .lock()
            .map(|mut files| std::mem::take(&mut *files))
            .unwrap_or_default()
    }
}

impl Sink for MemorySink {
    fn persist(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?;
        files.push(ProducedFile {
            name: name.to_string(),
            content: bytes.to_vec(),
        });
        Ok(())
    }
}
