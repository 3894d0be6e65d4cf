//! Status command implementation

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use static_cache::Result;
use static_cache::cache::{ClearStrategy, INDEX_FILE, TrackingStats};

use crate::cli::CommandContext;
use crate::output::{self, Formattable};

/// Cache status report
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub enabled: bool,
    pub cache_path: Option<String>,
    pub strategy: Option<&'static str>,
    pub cached_pages: usize,
    pub total_size_bytes: u64,
    pub tracking_db: String,
    pub tracked_entries: usize,
    pub expired_entries: usize,
    pub next_bust: Option<DateTime<Utc>>,
    pub sites: Vec<String>,
}

impl Formattable for StatusReport {
    fn pretty(&self) -> String {
        let mut out = format!("{}\n", "Static Cache Status".bold());
        out.push_str("────────────────────────────────────────\n");

        match &self.cache_path {
            Some(path) => {
                out.push_str(&format!("{} Cache enabled\n", "✓".green()));
                out.push_str(&format!("Location:       {}\n", path.cyan()));
            }
            None => {
                out.push_str(&format!("{} Cache disabled\n", "✗".red()));
                out.push_str("  → Set cache_path in the config file or pass --cache-path\n");
            }
        }
        if let Some(strategy) = self.strategy {
            out.push_str(&format!("Clear strategy: {}\n", strategy));
        }
        out.push_str(&format!("Cached pages:   {}\n", self.cached_pages));
        out.push_str(&format!(
            "Total size:     {}\n",
            format_size(self.total_size_bytes)
        ));
        out.push_str(&format!("Tracking DB:    {}\n", self.tracking_db));
        out.push_str(&format!("Tracked:        {}\n", self.tracked_entries));
        out.push_str(&format!("Expired:        {}", self.expired_entries));

        if let Some(next) = self.next_bust {
            out.push_str(&format!(
                "\nNext bust:      {}",
                next.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
            ));
        }
        if !self.sites.is_empty() {
            out.push_str(&format!("\nSites:          {}", self.sites.join(", ")));
        }

        out
    }

    fn command(&self) -> &'static str {
        "status"
    }
}

/// Run the status command
pub fn run(ctx: &CommandContext) -> Result<()> {
    let writer = ctx.admin_writer()?;
    let cutoff = writer.current_time().unwrap_or_else(Utc::now);
    let tracking: TrackingStats = writer.tracking().stats(cutoff)?;

    let (cached_pages, total_size_bytes) = writer
        .cache_root()
        .map(tree_usage)
        .unwrap_or_default();

    let report = StatusReport {
        enabled: writer.is_enabled(),
        cache_path: writer.cache_root().map(|p| p.display().to_string()),
        strategy: writer.strategy().map(|s| match s {
            ClearStrategy::Shell => "shell",
            ClearStrategy::Portable => "portable",
        }),
        cached_pages,
        total_size_bytes,
        tracking_db: ctx.config.tracking_db_path()?.display().to_string(),
        tracked_entries: tracking.total,
        expired_entries: tracking.expired,
        next_bust: tracking.next_bust,
        sites: ctx
            .config
            .sites
            .iter()
            .map(|s| format!("{} ({})", s.handle, s.base_url))
            .collect(),
    };

    output::print(&report, ctx.format)
}

/// Count cached pages and total bytes under `root`. Unreadable entries are skipped.
fn tree_usage(root: &Path) -> (usize, u64) {
    let mut pages = 0;
    let mut bytes = 0;

    let Ok(entries) = std::fs::read_dir(root) else {
        return (0, 0);
    };
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if meta.is_dir() {
            let (p, b) = tree_usage(&entry.path());
            pages += p;
            bytes += b;
        } else {
            if entry.file_name() == INDEX_FILE {
                pages += 1;
            }
            bytes += meta.len();
        }
    }

    (pages, bytes)
}

/// Format bytes as human-readable size
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
