//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - human-optimized rich formatting
    #[default]
    Pretty,
    /// JSON format - structured for scripts
    Json,
}

/// Which clear operation to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ClearMode {
    /// Empty the cache tree and drop expired tracking rows
    #[default]
    Legacy,
    /// Empty the cache tree and the whole tracking table
    All,
    /// Remove only entries whose tracking row has expired
    Expired,
}

impl ClearMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ClearMode::Legacy => "legacy",
            ClearMode::All => "all",
            ClearMode::Expired => "expired",
        }
    }
}
