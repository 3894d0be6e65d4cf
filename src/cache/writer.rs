//! Write-through static page cache
//!
//! [`StaticCacheWriter`] sits at the end of the render pipeline. It strips the
//! CMS's internal block markers from every response and, when asked to, writes
//! the result to `<root>/<host>/<path>/index.html` so the front-end server can
//! answer later requests from disk. Writing is best-effort: failures are
//! reported as a [`WriteOutcome`] and never as an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::cache::clear::{self, ClearStrategy, RemovedCounts};
use crate::cache::path::{self, INDEX_FILE};
use crate::cache::tracking::TrackingStore;
use crate::clock::Clock;
use crate::error::CacheError;
use crate::site::{RequestContext, SiteResolver};

/// Markers the CMS leaves between render passes
pub const BLOCK_MARKERS: [&str; 3] = [
    "<![CDATA[YII-BLOCK-HEAD]]>",
    "<![CDATA[YII-BLOCK-BODY-BEGIN]]>",
    "<![CDATA[YII-BLOCK-BODY-END]]>",
];

type Result<T> = std::result::Result<T, CacheError>;

/// Typed cache settings
#[derive(Debug, Clone, Default)]
pub struct CacheConfiguration {
    /// Cache root; empty disables the cache
    pub cache_path: String,
    /// Clear with `rm -rf` through the shell instead of a native walk
    pub use_shell_clear: bool,
}

/// External capabilities the writer depends on
pub struct Collaborators {
    pub sites: Box<dyn SiteResolver>,
    pub request: Box<dyn RequestContext>,
    pub tracking: Box<dyn TrackingStore>,
    pub clock: Box<dyn Clock>,
}

/// Why a response was not written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NotRequested,
    SiteUnresolved(String),
    UnsafePath(String),
    CreateDir(String),
    Write(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "cache disabled"),
            SkipReason::NotRequested => write!(f, "caching not requested"),
            SkipReason::SiteUnresolved(e) => write!(f, "site not resolved: {}", e),
            SkipReason::UnsafePath(e) => write!(f, "unsafe path: {}", e),
            SkipReason::CreateDir(e) => write!(f, "create directory failed: {}", e),
            SkipReason::Write(e) => write!(f, "write failed: {}", e),
        }
    }
}

/// Result of a cache write attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Written to this file
    Cached(PathBuf),
    Skipped(SkipReason),
}

/// Content to send as the live response, plus what happened on disk
#[derive(Debug, Clone)]
pub struct HandledContent {
    pub content: String,
    pub outcome: WriteOutcome,
}

/// Counts from a clear operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearStats {
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub tracking_rows_removed: usize,
}

impl ClearStats {
    fn new(removed: RemovedCounts, rows: usize) -> Self {
        Self {
            files_removed: removed.files,
            dirs_removed: removed.dirs,
            tracking_rows_removed: rows,
        }
    }
}

/// Enabled-state settings, fixed at construction
#[derive(Debug, Clone)]
struct Enabled {
    root: PathBuf,
    strategy: ClearStrategy,
    current_time: DateTime<Utc>,
}

/// Static page cache writer
pub struct StaticCacheWriter {
    state: Option<Enabled>,
    collaborators: Collaborators,
}

/// Remove the CMS block markers from rendered HTML
pub fn strip_markers(content: &str) -> String {
    BLOCK_MARKERS
        .iter()
        .fold(content.to_string(), |acc, marker| acc.replace(marker, ""))
}

impl StaticCacheWriter {
    /// Build a writer. An empty `cache_path` yields a disabled writer.
    pub fn new(config: CacheConfiguration, collaborators: Collaborators) -> Self {
        let state = path::normalize_root(&config.cache_path).map(|root| Enabled {
            root,
            strategy: ClearStrategy::from_flag(config.use_shell_clear),
            current_time: collaborators.clock.now(),
        });

        if state.is_none() {
            log::debug!("No cache path configured, static cache disabled");
        }

        Self {
            state,
            collaborators,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    /// Normalized cache root, if enabled
    pub fn cache_root(&self) -> Option<&Path> {
        self.state.as_ref().map(|s| s.root.as_path())
    }

    /// Expiry cutoff captured at construction, if enabled
    pub fn current_time(&self) -> Option<DateTime<Utc>> {
        self.state.as_ref().map(|s| s.current_time)
    }

    pub fn strategy(&self) -> Option<ClearStrategy> {
        self.state.as_ref().map(|s| s.strategy)
    }

    pub fn tracking(&self) -> &dyn TrackingStore {
        self.collaborators.tracking.as_ref()
    }

    /// Strip markers from `content` and, if `cache` is set, write it to disk.
    ///
    /// The returned content is always what the caller should send, whether or
    /// not the write succeeded.
    pub fn handle_content(&self, content: &str, cache: bool) -> HandledContent {
        let Some(state) = &self.state else {
            return HandledContent {
                content: content.to_string(),
                outcome: WriteOutcome::Skipped(SkipReason::Disabled),
            };
        };

        let content = strip_markers(content);

        let outcome = if cache {
            self.write(&state.root, &content)
        } else {
            WriteOutcome::Skipped(SkipReason::NotRequested)
        };

        match &outcome {
            WriteOutcome::Cached(file) => log::debug!("Cached {}", file.display()),
            WriteOutcome::Skipped(
                reason @ (SkipReason::CreateDir(_) | SkipReason::Write(_)),
            ) => log::warn!("Static cache write skipped: {}", reason),
            WriteOutcome::Skipped(reason) => log::debug!("Static cache write skipped: {}", reason),
        }

        HandledContent { content, outcome }
    }

    fn write(&self, root: &Path, content: &str) -> WriteOutcome {
        let Collaborators { sites, request, .. } = &self.collaborators;

        let site = match sites.current_site() {
            Some(site) => site,
            None => match sites.resolve_for_request(request.as_ref()) {
                Ok(site) => site,
                Err(e) => {
                    return WriteOutcome::Skipped(SkipReason::SiteUnresolved(e.to_string()));
                }
            },
        };

        let entry = match path::cache_entry(&site.base_url, request.full_path()) {
            Ok(entry) => entry,
            Err(e) => return WriteOutcome::Skipped(SkipReason::UnsafePath(e.to_string())),
        };

        let dir = match path::entry_dir(root, &entry) {
            Ok(dir) => dir,
            Err(e) => return WriteOutcome::Skipped(SkipReason::UnsafePath(e.to_string())),
        };
        if let Err(e) = create_dir_all(&dir) {
            if e.kind() != ErrorKind::AlreadyExists || !dir.is_dir() {
                return WriteOutcome::Skipped(SkipReason::CreateDir(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )));
            }
        }

        let file = dir.join(INDEX_FILE);
        match std::fs::write(&file, content) {
            Ok(()) => WriteOutcome::Cached(file),
            Err(e) => {
                WriteOutcome::Skipped(SkipReason::Write(format!("{}: {}", file.display(), e)))
            }
        }
    }

    /// Empty the cache tree, then drop tracking rows that expired by the
    /// construction-time cutoff.
    ///
    /// The filesystem purge is total while the tracking purge is partial, so
    /// rows for unexpired entries survive without a file on disk. Use
    /// [`clear_all`](Self::clear_all) or [`clear_expired`](Self::clear_expired)
    /// for a consistent purge.
    pub fn clear_cache(&self) -> Result<ClearStats> {
        let state = self.state.as_ref().ok_or(CacheError::NotConfigured)?;

        let removed = clear::clear_tree(&state.root, state.strategy)?;
        let rows = self
            .collaborators
            .tracking
            .delete_expired(state.current_time)?;

        log::debug!(
            "Cleared cache tree; removed {} expired tracking rows (unexpired rows kept)",
            rows
        );
        Ok(ClearStats::new(removed, rows))
    }

    /// Empty the cache tree and the tracking table
    pub fn clear_all(&self) -> Result<ClearStats> {
        let state = self.state.as_ref().ok_or(CacheError::NotConfigured)?;

        let removed = clear::clear_tree(&state.root, state.strategy)?;
        let rows = self.collaborators.tracking.delete_all()?;

        log::info!(
            "Cleared cache: {} files, {} tracking rows",
            removed.files,
            rows
        );
        Ok(ClearStats::new(removed, rows))
    }

    /// Remove only entries whose tracking row expired, then those rows.
    ///
    /// Rows whose entry would resolve outside the root leave the disk alone
    /// but are still deleted with the other expired rows.
    pub fn clear_expired(&self) -> Result<ClearStats> {
        let state = self.state.as_ref().ok_or(CacheError::NotConfigured)?;
        let tracking = &self.collaborators.tracking;

        let mut removed = RemovedCounts::default();
        for record in tracking.expired(state.current_time)? {
            let dir = match path::entry_dir(&state.root, &record.entry) {
                Ok(dir) => dir,
                Err(e) => {
                    log::warn!("Skipping tracking entry '{}': {}", record.entry, e);
                    continue;
                }
            };
            let counts = clear::remove_entry(&state.root, &dir, INDEX_FILE)?;
            removed.files += counts.files;
            removed.dirs += counts.dirs;
        }

        let rows = tracking.delete_expired(state.current_time)?;

        log::info!(
            "Cleared expired cache entries: {} files, {} tracking rows",
            removed.files,
            rows
        );
        Ok(ClearStats::new(removed, rows))
    }
}

#[cfg(unix)]
fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o777)
        .create(dir)
}

#[cfg(not(unix))]
fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}
