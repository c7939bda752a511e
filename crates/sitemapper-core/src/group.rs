//! The group engine: buffers items, flushes full batches into documents and
//! tracks the files it produced.
//!
//! A group moves through `Open -> Draining -> Closed`. While open it accepts
//! items from any number of producers. When the buffer reaches the entry limit
//! the buffer is swapped for an empty one under the same lock that guards
//! `add`, and the full batch is flushed on a bounded pool of blocking workers.
//! Producers never wait for an encode or a disk write.
//!
//! ## Flush policy
//!
//! - A batch above the entry limit is split at its midpoint; the upper half is
//!   written before the lower half.
//! - A batch above the byte limit keeps its leading `min(max_entries, len / 2)`
//!   items for this flush and hands the rest back to the live buffer, where it
//!   waits for the next threshold or for close.
//! - A single item above the byte limit halts the group with
//!   [`Error::EntryTooLarge`].
//!
//! Files are named `{group}_{n}.xml.gz` with `n` starting at 1 and advancing
//! once per persisted file, in persistence order.
//!
//! ```rust,no_run
//! use sitemapper_core::{Entry, GroupOptions, SitemapGroup};
//!
//! # async fn example() -> sitemapper_core::Result<()> {
//! let group = SitemapGroup::new("public/sitemaps", "blog", GroupOptions::default())?;
//! group.add(Entry::new("https://example.com/blog/hello"))?;
//! let produced = group.close().await?;
//! assert_eq!(produced, vec!["blog_1.xml.gz".to_string()]);
//! # Ok(())
//! # }
//! ```

use crate::codec::{Limits, SitemapItem};
use crate::error::CodecError;
use crate::sink::{GzipFileSink, Sink};
use crate::{Entry, Error, Result, SitemapReference};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

/// Suffix of every produced file.
pub const FILE_SUFFIX: &str = ".xml.gz";

/// Default number of flushes a group runs at the same time.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Group batching page entries into `<urlset>` files.
pub type SitemapGroup = Group<Entry>;

/// Group batching sitemap references into `<sitemapindex>` files.
pub type IndexGroup = Group<SitemapReference>;

/// Settings shared by every group of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOptions {
    /// Per-document limits.
    pub limits: Limits,
    /// Mark every added entry as a mobile page.
    pub mobile: bool,
    /// Upper bound on concurrently running flushes.
    pub max_in_flight: usize,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            mobile: false,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl GroupOptions {
    /// Use the given limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Mark entries as mobile pages.
    #[must_use]
    pub const fn with_mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }

    /// Bound the number of concurrent flushes.
    #[must_use]
    pub const fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.limits.max_entries == 0 || self.limits.max_bytes == 0 {
            return Err(Error::Config("limits must be greater than zero".into()));
        }
        if self.max_in_flight == 0 {
            return Err(Error::Config("max_in_flight must be at least 1".into()));
        }
        Ok(())
    }
}

/// Externally visible lifecycle state of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Accepting items.
    Open,
    /// Close was requested; outstanding flushes are finishing.
    Draining,
    /// Every item was flushed; only the produced names remain readable.
    Closed,
    /// A flush failed; the group stopped processing.
    Halted,
}

#[derive(Debug)]
enum Lifecycle {
    Open,
    Draining,
    Closed,
    Halted(String),
}

struct Intake<T> {
    buffer: Vec<T>,
    lifecycle: Lifecycle,
    flushes: JoinSet<Result<()>>,
}

struct Ledger {
    next_sequence: u64,
    produced: Vec<String>,
}

/// State shared between the group handle and its flush workers.
struct Engine<T> {
    name: String,
    limits: Limits,
    sink: Arc<dyn Sink>,
    intake: Mutex<Intake<T>>,
    ledger: Mutex<Ledger>,
}

/// A named batching unit that turns items into numbered documents.
///
/// `Group` is `Send + Sync`; share it behind an `Arc` to feed it from several
/// producers. [`Group::close`] must be awaited to flush the remainder: items
/// still buffered when the process exits are lost.
pub struct Group<T: SitemapItem> {
    engine: Arc<Engine<T>>,
    options: GroupOptions,
    permits: Arc<Semaphore>,
    runtime: Handle,
    close_gate: tokio::sync::Mutex<()>,
}

impl<T: SitemapItem> std::fmt::Debug for Group<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.engine.name)
            .field("kind", &T::KIND)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T: SitemapItem> Group<T> {
    /// Create a group writing gzip files into `folder`.
    ///
    /// The folder is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the folder cannot be created, the name is
    /// unusable, the options are invalid, or no tokio runtime is running.
    pub fn new(folder: impl AsRef<Path>, name: &str, options: GroupOptions) -> Result<Self> {
        let sink = GzipFileSink::new(folder.as_ref())?;
        Self::with_sink(name, Arc::new(sink), options)
    }

    /// Create a group persisting through any [`Sink`].
    pub fn with_sink(name: &str, sink: Arc<dyn Sink>, options: GroupOptions) -> Result<Self> {
        let name = normalize_group_name(name)?;
        options.validate()?;
        let runtime = Handle::try_current().map_err(|e| {
            Error::Config(format!("group '{name}' needs a running tokio runtime: {e}"))
        })?;

        debug!(group = %name, kind = %T::KIND, "Opened group");

        Ok(Self {
            engine: Arc::new(Engine {
                name,
                limits: options.limits,
                sink,
                intake: Mutex::new(Intake {
                    buffer: Vec::new(),
                    lifecycle: Lifecycle::Open,
                    flushes: JoinSet::new(),
                }),
                ledger: Mutex::new(Ledger {
                    next_sequence: 1,
                    produced: Vec::new(),
                }),
            }),
            options,
            permits: Arc::new(Semaphore::new(options.max_in_flight)),
            runtime,
            close_gate: tokio::sync::Mutex::new(()),
        })
    }

    /// Group name used as the file name prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.engine.name
    }

    /// Options the group was created with.
    #[must_use]
    pub const fn options(&self) -> &GroupOptions {
        &self.options
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Result<GroupState> {
        Ok(match self.engine.intake()?.lifecycle {
            Lifecycle::Open => GroupState::Open,
            Lifecycle::Draining => GroupState::Draining,
            Lifecycle::Closed => GroupState::Closed,
            Lifecycle::Halted(_) => GroupState::Halted,
        })
    }

    /// Number of items waiting in the live buffer.
    pub fn buffered(&self) -> Result<usize> {
        Ok(self.engine.intake()?.buffer.len())
    }

    /// Names of the files produced so far, in production order.
    pub fn produced_names(&self) -> Result<Vec<String>> {
        self.engine.produced()
    }

    /// Add one item.
    ///
    /// Only holds the buffer lock; a full buffer is handed to a flush worker
    /// without waiting for it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] / [`Error::Parse`] if the item is invalid
    /// - [`Error::GroupClosed`] once close has been requested
    /// - [`Error::GroupHalted`] after a flush failed
    pub fn add(&self, mut item: T) -> Result<()> {
        item.validate()?;
        if self.options.mobile {
            item.mark_mobile();
        }

        let mut intake = self.engine.intake()?;
        intake.ensure_open(&self.engine.name)?;
        intake.buffer.push(item);
        if intake.buffer.len() >= self.engine.limits.max_entries {
            let batch = std::mem::take(&mut intake.buffer);
            self.dispatch(&mut intake, batch);
        }
        Ok(())
    }

    /// Add every item of an iterator, stopping at the first error.
    pub fn extend<I: IntoIterator<Item = T>>(&self, items: I) -> Result<()> {
        items.into_iter().try_for_each(|item| self.add(item))
    }

    fn dispatch(&self, intake: &mut Intake<T>, batch: Vec<T>) {
        // Reap finished flushes so the set does not grow with the group's lifetime.
        while let Some(finished) = intake.flushes.try_join_next() {
            if let Some(err) = self.engine.settle(finished) {
                intake.lifecycle = Lifecycle::Halted(err.to_string());
            }
        }

        debug!(group = %self.engine.name, entries = batch.len(), "Dispatching flush");
        let engine = Arc::clone(&self.engine);
        let permits = Arc::clone(&self.permits);
        intake.flushes.spawn_on(
            async move {
                // Failures outside run_flush must halt the group here.
                let permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let err = Error::Other(format!("flush pool closed: {e}"));
                        engine.halt(&err);
                        return Err(err);
                    },
                };
                let worker = Arc::clone(&engine);
                let finished = tokio::task::spawn_blocking(move || worker.run_flush(batch)).await;
                drop(permit);
                finished.unwrap_or_else(|e| {
                    let err = Error::Other(format!("flush worker failed: {e}"));
                    engine.halt(&err);
                    Err(err)
                })
            },
            &self.runtime,
        );
    }

    /// Stop accepting items, flush the remainder and wait for every flush.
    ///
    /// Returns the names of all files the group produced. Calling `close`
    /// again returns the same names without producing anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupHalted`] if any flush failed. Outstanding
    /// flushes are still awaited before returning.
    #[instrument(skip(self), fields(group = %self.engine.name))]
    pub async fn close(&self) -> Result<Vec<String>> {
        let _gate = self.close_gate.lock().await;

        {
            let mut intake = self.engine.intake()?;
            match intake.lifecycle {
                Lifecycle::Closed => return self.engine.produced(),
                Lifecycle::Open => intake.lifecycle = Lifecycle::Draining,
                Lifecycle::Draining | Lifecycle::Halted(_) => {},
            }
        }

        // Flushes may hand items back to the buffer, so drain until both the
        // worker set and the buffer stay empty.
        loop {
            let mut flushes = std::mem::take(&mut self.engine.intake()?.flushes);
            while let Some(finished) = flushes.join_next().await {
                if let Some(err) = self.engine.settle(finished) {
                    self.engine.halt(&err);
                }
            }

            let remainder = {
                let mut intake = self.engine.intake()?;
                if matches!(intake.lifecycle, Lifecycle::Halted(_)) {
                    break;
                }
                std::mem::take(&mut intake.buffer)
            };
            if remainder.is_empty() {
                break;
            }

            let engine = Arc::clone(&self.engine);
            let finished = tokio::task::spawn_blocking(move || engine.run_flush(remainder)).await;
            if let Some(err) = self.engine.settle(finished) {
                self.engine.halt(&err);
            }
        }

        let mut intake = self.engine.intake()?;
        if let Lifecycle::Halted(reason) = &intake.lifecycle {
            return Err(Error::GroupHalted {
                group: self.engine.name.clone(),
                reason: reason.clone(),
            });
        }
        intake.lifecycle = Lifecycle::Closed;
        drop(intake);

        let produced = self.engine.produced()?;
        info!(files = produced.len(), "Closed group");
        Ok(produced)
    }
}

impl<T> Intake<T> {
    fn ensure_open(&self, group: &str) -> Result<()> {
        match &self.lifecycle {
            Lifecycle::Open => Ok(()),
            Lifecycle::Halted(reason) => Err(Error::GroupHalted {
                group: group.to_string(),
                reason: reason.clone(),
            }),
            Lifecycle::Draining | Lifecycle::Closed => Err(Error::GroupClosed {
                group: group.to_string(),
            }),
        }
    }
}

impl<T: SitemapItem> Engine<T> {
    fn intake(&self) -> Result<MutexGuard<'_, Intake<T>>> {
        self.intake
            .lock()
            .map_err(|_| Error::Other(format!("group '{}' buffer lock poisoned", self.name)))
    }

    fn ledger(&self) -> Result<MutexGuard<'_, Ledger>> {
        self.ledger
            .lock()
            .map_err(|_| Error::Other(format!("group '{}' ledger lock poisoned", self.name)))
    }

    fn produced(&self) -> Result<Vec<String>> {
        Ok(self.ledger()?.produced.clone())
    }

    /// Flush one batch, then keep flushing while carried-forward items refill
    /// the live buffer past the threshold.
    fn run_flush(&self, batch: Vec<T>) -> Result<()> {
        let mut pending = batch;
        loop {
            if let Lifecycle::Halted(reason) = &self.intake()?.lifecycle {
                warn!(
                    group = %self.name,
                    skipped = pending.len(),
                    reason = %reason,
                    "Skipping flush of halted group"
                );
                return Ok(());
            }

            let mut carry = Vec::new();
            if let Err(err) = self.flush(pending, &mut carry) {
                self.halt(&err);
                return Err(err);
            }
            if carry.is_empty() {
                return Ok(());
            }

            let mut intake = self.intake()?;
            debug!(
                group = %self.name,
                carried = carry.len(),
                "Returning carried entries to buffer"
            );
            intake.buffer.extend(carry);
            if intake.buffer.len() < self.limits.max_entries {
                return Ok(());
            }
            pending = std::mem::take(&mut intake.buffer);
        }
    }

    fn flush(&self, mut entries: Vec<T>, carry: &mut Vec<T>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        match T::encode_batch(&entries, &self.limits) {
            Ok(bytes) => self.persist(&bytes, entries.len()),
            Err(CodecError::TooManyEntries { count, limit }) => {
                debug!(group = %self.name, count, limit, "Splitting batch at midpoint");
                let upper = entries.split_off(entries.len() / 2);
                self.flush(upper, carry)?;
                self.flush(entries, carry)
            },
            Err(CodecError::PayloadTooLarge { size, limit }) if entries.len() > 1 => {
                let keep = self.limits.max_entries.min(entries.len() / 2);
                debug!(
                    group = %self.name,
                    size,
                    limit,
                    keep,
                    carried = entries.len() - keep,
                    "Truncating oversized batch"
                );
                let rest = entries.split_off(keep);
                carry.splice(0..0, rest);
                self.flush(entries, carry)
            },
            Err(CodecError::PayloadTooLarge { size, limit }) => Err(Error::EntryTooLarge {
                location: entries
                    .first()
                    .map(|item| item.location().to_string())
                    .unwrap_or_default(),
                size,
                limit,
            }),
            Err(err @ (CodecError::EmptyBatch | CodecError::Xml(_))) => Err(err.into()),
        }
    }

    fn persist(&self, bytes: &[u8], entries: usize) -> Result<()> {
        let mut ledger = self.ledger()?;
        let name = file_name(&self.name, ledger.next_sequence);

        self.sink
            .persist(&name, bytes)
            .map_err(|source| Error::Persistence {
                file: name.clone(),
                source,
            })?;

        info!(
            group = %self.name,
            file = %name,
            entries,
            bytes = bytes.len(),
            "Produced sitemap file"
        );
        ledger.produced.push(name);
        ledger.next_sequence += 1;
        Ok(())
    }

    fn halt(&self, err: &Error) {
        warn!(group = %self.name, error = %err, "Halting group after failed flush");
        match self.intake.lock() {
            Ok(mut intake) => {
                if !matches!(intake.lifecycle, Lifecycle::Halted(_)) {
                    intake.lifecycle = Lifecycle::Halted(err.to_string());
                }
            },
            Err(poisoned) => {
                let mut intake = poisoned.into_inner();
                intake.lifecycle = Lifecycle::Halted(err.to_string());
            },
        }
    }

    /// Log the outcome of a finished flush worker.
    ///
    /// Returns the halt reason when the worker died without halting the group
    /// itself. Never locks the buffer.
    fn settle(&self, finished: std::result::Result<Result<()>, JoinError>) -> Option<Error> {
        match finished {
            Ok(Ok(())) => None,
            // The worker halted the group before reporting.
            Ok(Err(err)) => {
                debug!(group = %self.name, error = %err, "Flush failed");
                None
            },
            Err(join_err) => Some(Error::Other(format!("flush worker failed: {join_err}"))),
        }
    }
}

/// File name for the `sequence`-th document of `group`.
#[must_use]
pub fn file_name(group: &str, sequence: u64) -> String {
    format!("{group}_{sequence}{FILE_SUFFIX}")
}

/// Strip a trailing `.xml.gz` and reject names that cannot prefix a file.
pub fn normalize_group_name(name: &str) -> Result<String> {
    let name = name.trim();
    let name = name.strip_suffix(FILE_SUFFIX).unwrap_or(name);
    if name.is_empty() {
        return Err(Error::Config("group name must not be empty".into()));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Config(format!(
            "group name '{name}' must not contain path separators"
        )));
    }
    Ok(name.to_string())
}
