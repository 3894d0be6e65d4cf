//! CLI command definitions and handlers

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod cache;
pub mod context;
pub mod status;

pub use args::{ClearMode, GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// static-cache - write-through static page cache for CMS-rendered HTML
#[derive(Parser, Debug)]
#[command(name = "static-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, json)
    #[arg(
        long,
        global = true,
        env = "STATIC_CACHE_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "STATIC_CACHE_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the cache root directory
    #[arg(long, global = true, env = "STATIC_CACHE_PATH", hide_env = true)]
    pub cache_path: Option<String>,

    /// Override the tracking database location
    #[arg(long, global = true, env = "STATIC_CACHE_TRACKING_DB", hide_env = true)]
    pub tracking_db: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "STATIC_CACHE_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Strip markers from HTML on stdin, cache it, and echo it to stdout
    Write {
        /// Request host used to pick the site
        #[arg(long)]
        host: String,

        /// Request path (no scheme, host, or query)
        #[arg(long)]
        path: String,

        /// Strip markers but do not write to the cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Purge the cache and the tracking table
    Clear {
        /// Which entries to remove
        #[arg(long, value_enum, default_value = "legacy")]
        mode: ClearMode,
    },

    /// Record a cache-bust date for an entry
    Track {
        /// Cache entry, e.g. example.com/blog/post-1
        entry: String,

        /// Expiry as RFC 3339, e.g. 2024-03-01T12:00:00Z
        #[arg(long, value_parser = parse_bust_on)]
        bust_on: DateTime<Utc>,
    },

    /// Show cache location, strategy, and tracking statistics
    Status,

    /// Print the cache root directory
    Path,

    /// Display version information
    Version,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_bust_on(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 timestamp: {}", e))
}
