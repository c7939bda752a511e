//! Error types and handling for sitemapper-core operations.
//!
//! This module provides the error type shared by every component of the
//! batching pipeline. Errors are categorized for logging and exit-code
//! mapping, and carry a recoverability hint for callers that want to retry.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: directory scans, reading persisted documents
//! - **Network Errors**: search-engine notification requests
//! - **Parse Errors**: decoding sitemap XML, reading entry streams
//! - **Configuration Errors**: invalid settings, unusable output folders
//! - **Persistence Errors**: a produced file could not be written
//! - **Group Errors**: adding to a closed or halted group
//!
//! Codec limit violations have their own type, [`CodecError`], because the
//! group engine recovers from them internally by splitting batches. They only
//! surface through [`Error::Codec`] when a caller encodes a document directly.
//!
//! ## Recovery Hints
//!
//! ```rust
//! use sitemapper_core::Error;
//!
//! let err = Error::Config("output folder is not writable".to_string());
//! assert!(!err.is_recoverable());
//! assert_eq!(err.category(), "config");
//! ```

use thiserror::Error;

/// Failures reported by the sitemap codec.
///
/// The two limit variants are signals rather than faults: they tell the caller
/// that the batch must be split before it can be encoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The batch holds more items than a single document may contain.
    #[error("{count} entries exceed the per-document limit of {limit}")]
    TooManyEntries {
        /// Number of items in the rejected batch.
        count: usize,
        /// Configured maximum number of items.
        limit: usize,
    },

    /// The encoded document is larger than a single document may be.
    #[error("encoded document of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge {
        /// Size of the encoded document in bytes.
        size: usize,
        /// Configured maximum size in bytes.
        limit: usize,
    },

    /// A document needs at least one item.
    #[error("cannot encode an empty batch")]
    EmptyBatch,

    /// The XML writer failed.
    #[error("XML encoding failed: {0}")]
    Xml(String),
}

/// The main error type for sitemapper-core operations.
///
/// All public functions in sitemapper-core return `Result<T, Error>`.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers directory scans, reading persisted files and other file system
    /// access outside the persistence sink.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Only the search-engine notification collaborator talks to the network.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Parsing operation failed.
    ///
    /// ## Common Causes
    ///
    /// - Malformed sitemap XML
    /// - Invalid `changefreq` or `priority` values
    /// - Malformed JSON lines in an entry stream
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or the output location is unusable.
    ///
    /// Raised at group construction time when the target folder cannot be
    /// created, and when configuration values are out of range. A group that
    /// fails with this error never starts accepting entries.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A location is not an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A produced file could not be written or compressed.
    ///
    /// Fatal to the group that attempted the write.
    #[error("Failed to persist {file}: {source}")]
    Persistence {
        /// Name of the file that was being written.
        file: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A single item encodes above the byte limit on its own.
    ///
    /// Splitting cannot help, so the group halts instead of looping.
    #[error("Entry {location} encodes to {size} bytes, above the {limit} byte limit")]
    EntryTooLarge {
        /// Location of the offending item.
        location: String,
        /// Size of the single-item document.
        size: usize,
        /// Configured maximum size in bytes.
        limit: usize,
    },

    /// The group no longer accepts entries because it is draining or closed.
    #[error("Group '{group}' is closed")]
    GroupClosed {
        /// Name of the group.
        group: String,
    },

    /// The group stopped after a fatal flush failure.
    #[error("Group '{group}' halted: {reason}")]
    GroupHalted {
        /// Name of the group.
        group: String,
        /// Description of the failure that halted it.
        reason: String,
    },

    /// Encoding a document directly hit a codec limit.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Returns `true` for network timeouts, connection failures and
    /// interrupted I/O. Persistence failures are never recoverable inside the
    /// engine: the group has already halted.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// - `"io"` - file system operations
    /// - `"network"` - HTTP notification requests
    /// - `"parse"` - XML and entry stream decoding
    /// - `"config"` - settings and output folders
    /// - `"invalid_url"` - entry locations
    /// - `"persistence"` - writing produced files
    /// - `"group"` - group lifecycle violations
    /// - `"codec"` - direct encoding limit violations
    /// - `"other"` - uncategorized errors
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Persistence { .. } | Self::EntryTooLarge { .. } => "persistence",
            Self::GroupClosed { .. } | Self::GroupHalted { .. } => "group",
            Self::Codec(_) => "codec",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
