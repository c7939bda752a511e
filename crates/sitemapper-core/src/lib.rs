//! # sitemapper-core
//!
//! Batching engine that turns streams of page URLs into sitemaps.org
//! documents: gzip-compressed `<urlset>` files split at the protocol limits,
//! plus a `<sitemapindex>` listing them.
//!
//! ## Architecture
//!
//! - **Codec**: encodes batches into XML and enforces the per-document count
//!   and byte limits; decodes documents back for inspection
//! - **Sink**: persists one `{name, bytes}` pair per produced file
//! - **Group**: named batching unit accepting entries from many producers,
//!   flushing full batches off the producer path and draining on close
//! - **Registry**: creates groups and drains them all behind one barrier
//! - **Index**: assembles an index from produced names or a folder scan
//! - **Ping**: notifies search engines about an updated index
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sitemapper_core::{Entry, GroupOptions, Registry, build_index, write_index};
//!
//! # async fn example() -> sitemapper_core::Result<()> {
//! let mut registry = Registry::new("public/sitemaps", GroupOptions::default())?;
//! let blog = registry.sitemap_group("blog")?;
//! blog.add(Entry::new("https://example.com/blog/hello"))?;
//!
//! let produced = registry.close_all().await.into_result()?;
//! let index = build_index(&produced, "https://example.com/sitemaps/");
//! write_index(
//!     "public/sitemaps/sitemap_index.xml.gz".as_ref(),
//!     &index,
//!     &Default::default(),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`]. A failed write halts only the
//! group that attempted it:
//!
//! ```rust,no_run
//! use sitemapper_core::{Error, SitemapGroup};
//!
//! # async fn example(group: SitemapGroup) {
//! match group.close().await {
//!     Ok(files) => println!("wrote {} files", files.len()),
//!     Err(Error::GroupHalted { group, reason }) => eprintln!("{group} stopped: {reason}"),
//!     Err(e) => eprintln!("{} error: {e}", e.category()),
//! }
//! # }
//! ```

/// XML encoding and decoding of sitemap documents
pub mod codec;
/// Configuration loading and validation
pub mod config;
/// Error types and result aliases
pub mod error;
/// The batching group engine
pub mod group;
/// Index assembly and output
pub mod index;
/// Search-engine notification
pub mod ping;
/// Multi-group coordination
pub mod registry;
/// Persistence sinks
pub mod sink;
/// Core data types and structures
pub mod types;

// Re-export commonly used types
pub use codec::{
    DocumentKind, Limits, MAX_BYTES, MAX_ENTRIES, SitemapItem, detect_kind, encode,
    encode_index, encode_urlset, parse_index, parse_urlset,
};
pub use config::{Config, FlushConfig, OutputConfig, PingConfig};
pub use error::{CodecError, Error, Result};
pub use group::{
    FILE_SUFFIX, Group, GroupOptions, GroupState, IndexGroup, SitemapGroup, file_name,
};
pub use index::{build_index, build_index_from_dir, write_index};
pub use ping::{DEFAULT_PING_ENDPOINTS, PingOutcome, Pinger};
pub use registry::{DrainReport, GroupFailure, Registry, close_all};
pub use sink::{GzipFileSink, MemorySink, ProducedFile, Sink, read_gzip_document, write_gzip};
pub use types::*;
