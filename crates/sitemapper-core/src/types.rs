//! Core data types: sitemap entries, index references and the index aggregate.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Change frequency hints for a sitemap entry.
///
/// These values indicate how frequently a page is likely to change,
/// though search engines may not follow these hints strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    /// The page changes every time it is accessed.
    Always,
    /// The page changes hourly.
    Hourly,
    /// The page changes daily.
    Daily,
    /// The page changes weekly.
    Weekly,
    /// The page changes monthly.
    Monthly,
    /// The page changes yearly.
    Yearly,
    /// The page is archived and will not change.
    Never,
}

impl ChangeFrequency {
    /// Protocol spelling of the value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            _ => Err(Error::Parse(format!("Invalid changefreq value: {s}"))),
        }
    }
}

/// A single page URL with optional crawl hints.
///
/// Entries are immutable once added to a group. Absent optional fields are
/// omitted from the encoded document rather than written as empty elements.
///
/// ```rust
/// use sitemapper_core::{ChangeFrequency, Entry};
///
/// let entry = Entry::new("https://example.com/blog/")
///     .with_changefreq(ChangeFrequency::Daily)
///     .with_priority(0.8);
/// assert!(entry.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Absolute URL of the page.
    pub location: String,
    /// Last modification time of the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// How frequently the page changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_frequency: Option<ChangeFrequency>,
    /// Priority relative to other pages of the site (0.0 to 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f32>,
    /// Marks the page as a mobile page (`<mobile:mobile/>`).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mobile: bool,
}

impl Entry {
    /// Create an entry with only a location.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            last_modified: None,
            change_frequency: None,
            priority: None,
            mobile: false,
        }
    }

    /// Set the last modification time.
    #[must_use]
    pub const fn with_lastmod(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Set the change frequency hint.
    #[must_use]
    pub const fn with_changefreq(mut self, change_frequency: ChangeFrequency) -> Self {
        self.change_frequency = Some(change_frequency);
        self
    }

    /// Set the priority hint.
    #[must_use]
    pub const fn with_priority(mut self, priority: f32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Mark the entry as a mobile page.
    #[must_use]
    pub const fn with_mobile(mut self) -> Self {
        self.mobile = true;
        self
    }

    /// Check that the location is an absolute URL and the priority is in range.
    pub fn validate(&self) -> Result<()> {
        validate_location(&self.location)?;
        if let Some(priority) = self.priority {
            if !(0.0..=1.0).contains(&priority) {
                return Err(Error::Parse(format!(
                    "priority {priority} for {} is outside 0.0..=1.0",
                    self.location
                )));
            }
        }
        Ok(())
    }
}

/// A reference to a produced sitemap file, as listed in an index document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapReference {
    /// Absolute URL of the sitemap file.
    pub location: String,
    /// Last modification time of the sitemap file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl SitemapReference {
    /// Create a reference with only a location.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            last_modified: None,
        }
    }

    /// Set the last modification time.
    #[must_use]
    pub const fn with_lastmod(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Check that the location is an absolute URL.
    pub fn validate(&self) -> Result<()> {
        validate_location(&self.location)
    }
}

/// Ordered list of sitemap references, consumed once to write an index file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// References in document order.
    pub sitemaps: Vec<SitemapReference>,
}

impl Index {
    /// Number of referenced sitemaps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sitemaps.len()
    }

    /// Whether the index references no sitemaps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sitemaps.is_empty()
    }

    /// Iterate over the references in document order.
    pub fn iter(&self) -> std::slice::Iter<'_, SitemapReference> {
        self.sitemaps.iter()
    }
}

fn validate_location(location: &str) -> Result<()> {
    Url::parse(location)
        .map(|_| ())
        .map_err(|e| Error::InvalidUrl(format!("{location}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_changefreq_parsing() {
        let test_cases = [
            ("always", ChangeFrequency::Always),
            ("hourly", ChangeFrequency::Hourly),
            ("daily", ChangeFrequency::Daily),
            ("weekly", ChangeFrequency::Weekly),
            ("monthly", ChangeFrequency::Monthly),
            ("yearly", ChangeFrequency::Yearly),
            ("never", ChangeFrequency::Never),
            // Case insensitive
            ("WEEKLY", ChangeFrequency::Weekly),
            ("Weekly", ChangeFrequency::Weekly),
        ];

        for (value, expected) in test_cases {
            let parsed: ChangeFrequency = value.parse().unwrap();
            assert_eq!(parsed, expected, "Failed to parse: {value}");
            assert_eq!(parsed.as_str(), value.to_lowercase());
        }
    }

    #[test]
    fn test_changefreq_invalid_value() {
        let result: Result<ChangeFrequency> = "sometimes".parse();
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_entry_validation() {
        assert!(Entry::new("https://example.com/").validate().is_ok());
        assert!(matches!(
            Entry::new("/relative/path").validate(),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            Entry::new("https://example.com/").with_priority(1.5).validate(),
            Err(Error::Parse(_))
        ));
        assert!(
            Entry::new("https://example.com/")
                .with_priority(0.0)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = Entry::new("https://example.com/a")
            .with_changefreq(ChangeFrequency::Weekly)
            .with_priority(0.5);

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"location\":\"https://example.com/a\""));
        assert!(json.contains("\"changeFrequency\":\"weekly\""));
        assert!(!json.contains("lastModified"));
        assert!(!json.contains("mobile"));

        let parsed: Entry =
            serde_json::from_str(r#"{"location":"https://example.com/b","priority":0.3}"#)
                .unwrap();
        assert_eq!(parsed.location, "https://example.com/b");
        assert_eq!(parsed.priority, Some(0.3));
        assert!(parsed.change_frequency.is_none());
    }

    #[test]
    fn test_index_accessors() {
        let index = Index {
            sitemaps: vec![
                SitemapReference::new("https://example.com/a_1.xml.gz"),
                SitemapReference::new("https://example.com/a_2.xml.gz"),
            ],
        };
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
        assert_eq!(
            index.iter().map(|s| s.location.as_str()).collect::<Vec<_>>(),
            vec![
                "https://example.com/a_1.xml.gz",
                "https://example.com/a_2.xml.gz"
            ]
        );
        assert!(Index::default().is_empty());
    }
}
