//! Sitemap and sitemap-index XML encoding and decoding.
//!
//! Encoding is pure: the same batch always produces the same bytes, and the
//! functions are safe to call concurrently. A batch must hold at least one
//! item ([`CodecError::EmptyBatch`]). Two limits are enforced, in order:
//!
//! 1. **Count**: a batch with more than [`Limits::max_entries`] items fails with
//!    [`CodecError::TooManyEntries`] before anything is encoded.
//! 2. **Size**: a document larger than [`Limits::max_bytes`] fails with
//!    [`CodecError::PayloadTooLarge`] and no bytes are returned.
//!
//! ```rust
//! use sitemapper_core::codec::{encode_urlset, parse_urlset, Limits};
//! use sitemapper_core::Entry;
//!
//! let entries = vec![Entry::new("https://example.com/")];
//! let xml = encode_urlset(&entries, &Limits::default()).unwrap();
//! let decoded = parse_urlset(std::str::from_utf8(&xml).unwrap()).unwrap();
//! assert_eq!(decoded, entries);
//! ```

use crate::error::CodecError;
use crate::{Entry, Error, Result, SitemapReference};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Sitemap protocol namespace.
pub const XMLNS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Google mobile sitemap namespace, declared only when a batch has mobile entries.
pub const MOBILE_XMLNS: &str = "http://www.google.com/schemas/sitemap-mobile/1.0";

/// Fixed XML declaration written at the start of every document.
pub const PREAMBLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Protocol maximum number of entries per document.
pub const MAX_ENTRIES: usize = 50_000;

/// Protocol maximum uncompressed document size (10 MiB).
pub const MAX_BYTES: usize = 10 * 1024 * 1024;

/// Per-document limits enforced by the codec.
///
/// Defaults are the protocol maxima. Lower values are useful for smaller files
/// and for tests; values above the protocol maxima are rejected by
/// [`crate::Config::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of items per document.
    pub max_entries: usize,
    /// Maximum encoded document size in bytes.
    pub max_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_entries: MAX_ENTRIES,
            max_bytes: MAX_BYTES,
        }
    }
}

impl Limits {
    /// Build limits with explicit values.
    #[must_use]
    pub const fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            max_entries,
            max_bytes,
        }
    }
}

/// The two document kinds of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    /// `<urlset>` of page entries.
    Sitemap,
    /// `<sitemapindex>` of sitemap references.
    SitemapIndex,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sitemap => f.write_str("sitemap"),
            Self::SitemapIndex => f.write_str("sitemap-index"),
        }
    }
}

/// An item that can be batched by a group and encoded into a document.
///
/// Implemented by [`Entry`] (sitemaps) and [`SitemapReference`] (indexes).
pub trait SitemapItem: Clone + Send + Sync + 'static {
    /// Kind of document a batch of these items encodes to.
    const KIND: DocumentKind;

    /// Absolute URL this item points at.
    fn location(&self) -> &str;

    /// Reject items that would produce an invalid document.
    fn validate(&self) -> Result<()>;

    /// Apply the mobile marker. Items without one ignore it.
    fn mark_mobile(&mut self) {}

    /// Encode a batch into a complete document.
    fn encode_batch(items: &[Self], limits: &Limits) -> std::result::Result<Vec<u8>, CodecError>;
}

impl SitemapItem for Entry {
    const KIND: DocumentKind = DocumentKind::Sitemap;

    fn location(&self) -> &str {
        &self.location
    }

    fn validate(&self) -> Result<()> {
        Self::validate(self)
    }

    fn mark_mobile(&mut self) {
        self.mobile = true;
    }

    fn encode_batch(items: &[Self], limits: &Limits) -> std::result::Result<Vec<u8>, CodecError> {
        encode_urlset(items, limits)
    }
}

impl SitemapItem for SitemapReference {
    const KIND: DocumentKind = DocumentKind::SitemapIndex;

    fn location(&self) -> &str {
        &self.location
    }

    fn validate(&self) -> Result<()> {
        Self::validate(self)
    }

    fn encode_batch(items: &[Self], limits: &Limits) -> std::result::Result<Vec<u8>, CodecError> {
        encode_index(items, limits)
    }
}

/// Encode a batch of any item kind.
pub fn encode<T: SitemapItem>(
    items: &[T],
    limits: &Limits,
) -> std::result::Result<Vec<u8>, CodecError> {
    T::encode_batch(items, limits)
}

/// Encode page entries into a `<urlset>` document.
///
/// The mobile namespace is declared when at least one entry carries the
/// mobile marker.
#[instrument(level = "trace", skip_all, fields(count = entries.len()))]
pub fn encode_urlset(
    entries: &[Entry],
    limits: &Limits,
) -> std::result::Result<Vec<u8>, CodecError> {
    check_count(entries.len(), limits)?;

    let mut root = BytesStart::new("urlset").with_attributes([("xmlns", XMLNS)]);
    if entries.iter().any(|e| e.mobile) {
        root.push_attribute(("xmlns:mobile", MOBILE_XMLNS));
    }

    let mut writer = start_document(entries.len());
    emit(&mut writer, Event::Start(root))?;
    for entry in entries {
        emit(&mut writer, Event::Start(BytesStart::new("url")))?;
        text_element(&mut writer, "loc", &entry.location)?;
        if let Some(lastmod) = entry.last_modified {
            text_element(&mut writer, "lastmod", &format_lastmod(lastmod))?;
        }
        if let Some(changefreq) = entry.change_frequency {
            text_element(&mut writer, "changefreq", changefreq.as_str())?;
        }
        if let Some(priority) = entry.priority {
            text_element(&mut writer, "priority", &priority.to_string())?;
        }
        if entry.mobile {
            emit(&mut writer, Event::Empty(BytesStart::new("mobile:mobile")))?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("url")))?;
    }
    emit(&mut writer, Event::End(BytesEnd::new("urlset")))?;

    finish_document(writer, limits)
}

/// Encode sitemap references into a `<sitemapindex>` document.
#[instrument(level = "trace", skip_all, fields(count = sitemaps.len()))]
pub fn encode_index(
    sitemaps: &[SitemapReference],
    limits: &Limits,
) -> std::result::Result<Vec<u8>, CodecError> {
    check_count(sitemaps.len(), limits)?;

    let mut writer = start_document(sitemaps.len());
    emit(
        &mut writer,
        Event::Start(BytesStart::new("sitemapindex").with_attributes([("xmlns", XMLNS)])),
    )?;
    for sitemap in sitemaps {
        emit(&mut writer, Event::Start(BytesStart::new("sitemap")))?;
        text_element(&mut writer, "loc", &sitemap.location)?;
        if let Some(lastmod) = sitemap.last_modified {
            text_element(&mut writer, "lastmod", &format_lastmod(lastmod))?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("sitemap")))?;
    }
    emit(&mut writer, Event::End(BytesEnd::new("sitemapindex")))?;

    finish_document(writer, limits)
}

const fn check_count(count: usize, limits: &Limits) -> std::result::Result<(), CodecError> {
    if count == 0 {
        return Err(CodecError::EmptyBatch);
    }
    if count > limits.max_entries {
        return Err(CodecError::TooManyEntries {
            count,
            limit: limits.max_entries,
        });
    }
    Ok(())
}

fn start_document(count: usize) -> Writer<Vec<u8>> {
    let mut buf = Vec::with_capacity(PREAMBLE.len() + 128 + count.saturating_mul(96));
    buf.extend_from_slice(PREAMBLE.as_bytes());
    Writer::new(buf)
}

fn finish_document(
    writer: Writer<Vec<u8>>,
    limits: &Limits,
) -> std::result::Result<Vec<u8>, CodecError> {
    let bytes = writer.into_inner();
    if bytes.len() > limits.max_bytes {
        return Err(CodecError::PayloadTooLarge {
            size: bytes.len(),
            limit: limits.max_bytes,
        });
    }
    Ok(bytes)
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> std::result::Result<(), CodecError> {
    writer
        .write_event(event)
        .map_err(|e| CodecError::Xml(e.to_string()))
}

fn text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> std::result::Result<(), CodecError> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

/// W3C datetime with second precision in UTC, e.g. `2024-01-15T10:30:00Z`.
fn format_lastmod(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Detect which kind of document an XML string holds.
///
/// Returns `None` when neither root element is present.
#[must_use]
pub fn detect_kind(xml: &str) -> Option<DocumentKind> {
    if xml.contains("<sitemapindex") {
        Some(DocumentKind::SitemapIndex)
    } else if xml.contains("<urlset") {
        Some(DocumentKind::Sitemap)
    } else {
        None
    }
}

/// Parse a `<urlset>` document into entries.
///
/// Entries without a `<loc>` are skipped; unknown elements are ignored.
///
/// # Errors
///
/// Returns an error if the XML is malformed or is a sitemap index.
#[instrument(skip(xml), fields(xml_len = xml.len()))]
pub fn parse_urlset(xml: &str) -> Result<Vec<Entry>> {
    if detect_kind(xml) == Some(DocumentKind::SitemapIndex) {
        return Err(Error::Parse(
            "XML is a sitemap index, not a standard sitemap".to_string(),
        ));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<Entry> = None;
    let mut has_loc = false;
    let mut current_element: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "url" => {
                        current = Some(Entry::new(String::new()));
                        has_loc = false;
                    },
                    "loc" | "lastmod" | "changefreq" | "priority" if current.is_some() => {
                        current_element = Some(name);
                    },
                    _ => {},
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"mobile" {
                    if let Some(entry) = current.as_mut() {
                        entry.mobile = true;
                    }
                }
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"url" {
                    if let Some(entry) = current.take() {
                        if has_loc {
                            entries.push(entry);
                        }
                    }
                }
                current_element = None;
            },
            Ok(Event::Text(e)) => {
                if let (Some(element), Some(entry)) = (current_element.as_deref(), current.as_mut())
                {
                    let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    let text = text.trim();

                    match element {
                        "loc" => {
                            entry.location = text.to_string();
                            has_loc = true;
                        },
                        "lastmod" => entry.last_modified = parse_lastmod(text),
                        "changefreq" => entry.change_frequency = text.parse().ok(),
                        "priority" => entry.priority = parse_priority(text),
                        _ => {},
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("XML parse error: {e}"))),
            _ => {},
        }
    }

    Ok(entries)
}

/// Parse a `<sitemapindex>` document into sitemap references.
///
/// # Errors
///
/// Returns an error if the XML is malformed or is not a sitemap index.
#[instrument(skip(xml), fields(xml_len = xml.len()))]
pub fn parse_index(xml: &str) -> Result<Vec<SitemapReference>> {
    if detect_kind(xml) != Some(DocumentKind::SitemapIndex) {
        return Err(Error::Parse("XML is not a sitemap index".to_string()));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut sitemaps = Vec::new();
    let mut current_loc: Option<String> = None;
    let mut current_lastmod: Option<DateTime<Utc>> = None;
    let mut in_sitemap = false;
    let mut current_element: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "sitemap" => {
                        in_sitemap = true;
                        current_loc = None;
                        current_lastmod = None;
                    },
                    "loc" | "lastmod" if in_sitemap => {
                        current_element = Some(name);
                    },
                    _ => {},
                }
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"sitemap" && in_sitemap {
                    if let Some(location) = current_loc.take() {
                        sitemaps.push(SitemapReference {
                            location,
                            last_modified: current_lastmod.take(),
                        });
                    }
                    in_sitemap = false;
                }
                current_element = None;
            },
            Ok(Event::Text(e)) => {
                if let Some(ref element) = current_element {
                    let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    let text = text.trim();

                    match element.as_str() {
                        "loc" => current_loc = Some(text.to_string()),
                        "lastmod" => current_lastmod = parse_lastmod(text),
                        _ => {},
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("XML parse error: {e}"))),
            _ => {},
        }
    }

    Ok(sitemaps)
}

/// Parse a lastmod date string into a `DateTime<Utc>`.
///
/// Supports:
/// - `2024-01-15` (date only)
/// - `2024-01-15T10:30:00Z` / `2024-01-15T10:30:00+00:00` (RFC 3339)
/// - `2024-01-15T10:30:00` and `2024-01-15T10:30:00.000` (naive, assumed UTC)
fn parse_lastmod(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }

    tracing::debug!(date_str = %s, "Could not parse lastmod date");
    None
}

/// Parse a priority value, clamping to 0.0-1.0 range.
fn parse_priority(s: &str) -> Option<f32> {
    s.parse::<f32>().ok().map(|p| p.clamp(0.0, 1.0))
}
