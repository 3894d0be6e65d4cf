//! Global CLI options shared across all commands

use crate::cli::{Cli, OutputFormat};

/// Global CLI options passed to all command handlers.
///
/// Precedence is: CLI flag > environment variable > config file > default.
/// This struct captures the CLI/env layer; the config file is applied in
/// `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (pretty, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.static-cache/config.yaml)
    pub config: Option<String>,

    /// Cache root override
    pub cache_path: Option<String>,

    /// Tracking database override
    pub tracking_db: Option<String>,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            cache_path: cli.cache_path.clone(),
            tracking_db: cli.tracking_db.clone(),
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_cli_copies_overrides() {
        let cli = Cli::parse_from([
            "static-cache",
            "--format",
            "json",
            "--cache-path",
            "/tmp/cache",
            "--config",
            "/tmp/config.yaml",
            "path",
        ]);

        let opts = GlobalOptions::from_cli(&cli);
        assert_eq!(opts.format, OutputFormat::Json);
        assert_eq!(opts.cache_path.as_deref(), Some("/tmp/cache"));
        assert_eq!(opts.config_ref(), Some("/tmp/config.yaml"));
        assert!(opts.tracking_db.is_none());
    }
}
