//! Cache commands: write, clear, track, path

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{Read, Write};

use static_cache::Result;
use static_cache::cache::{ClearStats, TrackingStore, WriteOutcome, path as cache_path};
use static_cache::error::CacheError;
use static_cache::site::StaticRequest;

use crate::cli::{ClearMode, CommandContext};
use crate::output::{self, Formattable};

/// Read HTML from stdin, run it through the writer, echo the result.
///
/// Cache failures only show up in the debug log; the page is always echoed.
pub fn write(ctx: &CommandContext, host: &str, path: &str, no_cache: bool) -> Result<()> {
    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;

    let writer = ctx.writer(StaticRequest::new(host, path))?;
    let handled = writer.handle_content(&content, !no_cache);

    match &handled.outcome {
        WriteOutcome::Cached(file) => log::info!("Wrote {}", file.display()),
        WriteOutcome::Skipped(reason) => log::info!("Not cached: {}", reason),
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(handled.content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Report for the clear command
#[derive(Debug, Serialize)]
pub struct ClearReport {
    pub mode: &'static str,
    #[serde(flatten)]
    pub stats: ClearStats,
}

impl Formattable for ClearReport {
    fn pretty(&self) -> String {
        let s = &self.stats;
        if s.files_removed == 0 && s.dirs_removed == 0 && s.tracking_rows_removed == 0 {
            return "Cache was already empty".to_string();
        }
        format!(
            "Cleared {} files and {} directories; removed {} tracking rows ({})",
            s.files_removed, s.dirs_removed, s.tracking_rows_removed, self.mode
        )
    }

    fn command(&self) -> &'static str {
        "clear"
    }
}

/// Purge the cache using the selected mode
pub fn clear(ctx: &CommandContext, mode: ClearMode) -> Result<()> {
    let writer = ctx.admin_writer()?;
    let stats = match mode {
        ClearMode::Legacy => writer.clear_cache()?,
        ClearMode::All => writer.clear_all()?,
        ClearMode::Expired => writer.clear_expired()?,
    };

    output::print(
        &ClearReport {
            mode: mode.as_str(),
            stats,
        },
        ctx.format,
    )
}

/// Report for the track command
#[derive(Debug, Serialize)]
pub struct TrackReport {
    pub entry: String,
    pub cache_bust_on: DateTime<Utc>,
}

impl Formattable for TrackReport {
    fn pretty(&self) -> String {
        format!(
            "Tracking {} until {}",
            self.entry,
            self.cache_bust_on.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }

    fn command(&self) -> &'static str {
        "track"
    }
}

/// Record a cache-bust date
pub fn track(ctx: &CommandContext, entry: &str, bust_on: DateTime<Utc>) -> Result<()> {
    let entry = entry.trim_matches('/');
    if entry.is_empty() {
        return Err(CacheError::Tracking("Entry must not be empty".to_string()).into());
    }
    cache_path::check_entry(entry)
        .map_err(|e| CacheError::Tracking(format!("Bad entry '{}': {}", entry, e)))?;

    ctx.tracking_store()?.record(entry, bust_on)?;

    output::print(
        &TrackReport {
            entry: entry.to_string(),
            cache_bust_on: bust_on,
        },
        ctx.format,
    )
}

/// Show cache path
pub fn path(ctx: &CommandContext) -> Result<()> {
    let writer = ctx.admin_writer()?;
    let root = writer.cache_root().ok_or(CacheError::NotConfigured)?;
    println!("{}", root.display());
    Ok(())
}
