//! Multi-group coordination and the drain barrier.
//!
//! Each group owns its buffer, counter and produced names. The registry only
//! keeps the handles so a caller can drain every group at once and aggregate
//! the produced names explicitly for an index.

use crate::codec::SitemapItem;
use crate::group::{Group, GroupOptions, SitemapGroup, normalize_group_name};
use crate::sink::{GzipFileSink, Sink};
use crate::{Error, Result};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A group that failed to drain.
#[derive(Debug)]
pub struct GroupFailure {
    /// Name of the failed group.
    pub group: String,
    /// Why it failed.
    pub error: Error,
}

/// Outcome of draining several groups.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Produced names of every successful group, in group order.
    pub produced: Vec<String>,
    /// Groups that failed, in group order.
    pub failures: Vec<GroupFailure>,
}

impl DrainReport {
    /// Whether every group drained successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Produced names, or the first failure.
    pub fn into_result(self) -> Result<Vec<String>> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.produced),
        }
    }
}

/// Close every group concurrently and wait until all of them finished.
///
/// A failing group never prevents the others from draining.
pub async fn close_all<T: SitemapItem>(groups: &[Arc<Group<T>>]) -> DrainReport {
    let outcomes = join_all(groups.iter().map(|group| async move {
        (group.name().to_string(), group.close().await)
    }))
    .await;

    let mut report = DrainReport::default();
    for (group, outcome) in outcomes {
        match outcome {
            Ok(names) => report.produced.extend(names),
            Err(error) => {
                warn!(group = %group, error = %error, "Group failed to drain");
                report.failures.push(GroupFailure { group, error });
            },
        }
    }
    report
}

/// Creates sitemap groups sharing one destination and one set of options.
pub struct Registry {
    folder: Option<PathBuf>,
    sink: Arc<dyn Sink>,
    options: GroupOptions,
    groups: Vec<Arc<SitemapGroup>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("folder", &self.folder)
            .field("options", &self.options)
            .field("groups", &self.group_names())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Registry writing gzip files into `folder`, created if needed.
    pub fn new(folder: impl AsRef<Path>, options: GroupOptions) -> Result<Self> {
        let sink = GzipFileSink::new(folder.as_ref())?;
        let folder = sink.folder().to_path_buf();
        let mut registry = Self::with_sink(Arc::new(sink), options);
        registry.folder = Some(folder);
        Ok(registry)
    }

    /// Registry persisting through any sink.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn Sink>, options: GroupOptions) -> Self {
        Self {
            folder: None,
            sink,
            options,
            groups: Vec::new(),
        }
    }

    /// Destination folder, when the registry writes files.
    #[must_use]
    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    /// Create a new sitemap group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a group with the same name exists or the
    /// group cannot be created.
    pub fn sitemap_group(&mut self, name: &str) -> Result<Arc<SitemapGroup>> {
        let name = normalize_group_name(name)?;
        if self.groups.iter().any(|group| group.name() == name) {
            return Err(Error::Config(format!("group '{name}' already exists")));
        }

        let group = Arc::new(SitemapGroup::with_sink(
            &name,
            Arc::clone(&self.sink),
            self.options,
        )?);
        self.groups.push(Arc::clone(&group));
        Ok(group)
    }

    /// Look up a group by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<SitemapGroup>> {
        self.groups
            .iter()
            .find(|group| group.name() == name)
            .map(Arc::clone)
    }

    /// Names of all groups in creation order.
    #[must_use]
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.name()).collect()
    }

    /// Drain every group. See [`close_all`].
    #[instrument(skip(self), fields(groups = self.groups.len()))]
    pub async fn close_all(&self) -> DrainReport {
        let report = close_all(&self.groups).await;
        info!(
            files = report.produced.len(),
            failed = report.failures.len(),
            "Drained all groups"
        );
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::Limits;
    use crate::sink::MemorySink;
    use crate::Entry;
    use std::io;

    /// Fails every write for one group name.
    struct PartialSink {
        inner: MemorySink,
        failing_prefix: &'static str,
    }

    impl Sink for PartialSink {
        fn persist(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
            if name.starts_with(self.failing_prefix) {
                return Err(io::Error::other("no space left"));
            }
            self.inner.persist(name, bytes)
        }
    }

    fn options() -> GroupOptions {
        GroupOptions::default().with_limits(Limits::new(2, crate::codec::MAX_BYTES))
    }

    #[tokio::test]
    async fn test_drain_merges_names_in_group_order() {
        let mut registry = Registry::with_sink(Arc::new(MemorySink::new()), options());
        let blog = registry.sitemap_group("blog").unwrap();
        let docs = registry.sitemap_group("docs.xml.gz").unwrap();

        for i in 0..3 {
            docs.add(Entry::new(format!("https://example.com/docs/{i}")))
                .unwrap();
        }
        blog.add(Entry::new("https://example.com/blog/1")).unwrap();

        let report = registry.close_all().await;
        assert!(report.is_success());
        assert_eq!(
            report.produced,
            vec!["blog_1.xml.gz", "docs_1.xml.gz", "docs_2.xml.gz"]
        );
        assert_eq!(registry.group_names(), vec!["blog", "docs"]);
    }

    #[tokio::test]
    async fn test_duplicate_groups_are_rejected() {
        let mut registry = Registry::with_sink(Arc::new(MemorySink::new()), options());
        registry.sitemap_group("blog").unwrap();

        assert!(matches!(
            registry.sitemap_group("blog.xml.gz"),
            Err(Error::Config(_))
        ));
        assert!(registry.get("blog").is_some());
        assert!(registry.get("news").is_none());
    }

    #[tokio::test]
    async fn test_failed_group_does_not_block_others() {
        let sink = Arc::new(PartialSink {
            inner: MemorySink::new(),
            failing_prefix: "broken_",
        });
        let mut registry = Registry::with_sink(sink, options());
        let broken = registry.sitemap_group("broken").unwrap();
        let healthy = registry.sitemap_group("healthy").unwrap();

        broken.add(Entry::new("https://example.com/a")).unwrap();
        healthy.add(Entry::new("https://example.com/b")).unwrap();

        let report = registry.close_all().await;
        assert_eq!(report.produced, vec!["healthy_1.xml.gz"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].group, "broken");
        assert!(matches!(
            report.into_result(),
            Err(Error::GroupHalted { .. })
        ));
    }

    #[tokio::test]
    async fn test_registry_creates_folder() {
        let dir = tempfile::TempDir::new().unwrap();
        let folder = dir.path().join("public").join("sitemaps");
        let registry = Registry::new(&folder, GroupOptions::default()).unwrap();
        assert!(folder.is_dir());
        assert_eq!(registry.folder(), Some(folder.as_path()));
    }
}
