//! Command execution context
//!
//! Loads the configuration once, applies CLI overrides, and builds the
//! writer with its collaborators for each command.

use std::path::PathBuf;

use static_cache::Result;
use static_cache::cache::{
    Collaborators, LazyTrackingStore, SqliteTrackingStore, StaticCacheWriter,
};
use static_cache::clock::SystemClock;
use static_cache::config::Config;
use static_cache::site::StaticRequest;

use crate::cli::{GlobalOptions, OutputFormat};

/// Context for command execution containing config and runtime options.
pub struct CommandContext {
    /// Loaded configuration with CLI overrides applied
    pub config: Config,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load config from `opts.config` (or the default location) and apply
    /// `--cache-path` / `--tracking-db` overrides.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let mut config = Config::load_at(opts.config_ref())?;

        if let Some(cache_path) = &opts.cache_path {
            config.cache_path = cache_path.clone();
        }
        if let Some(tracking_db) = &opts.tracking_db {
            config.tracking_db = Some(PathBuf::from(tracking_db));
        }

        Ok(Self {
            config,
            format: opts.format,
        })
    }

    /// Open the tracking table
    pub fn tracking_store(&self) -> Result<SqliteTrackingStore> {
        let path = self.config.tracking_db_path()?;
        log::debug!("Opening tracking table at {}", path.display());
        Ok(SqliteTrackingStore::open_at(&path)?)
    }

    /// Build a writer for one request.
    ///
    /// The tracking table is opened only when a clear or status call needs it.
    pub fn writer(&self, request: StaticRequest) -> Result<StaticCacheWriter> {
        let tracking = LazyTrackingStore::new(self.config.tracking_db_path()?);
        Ok(StaticCacheWriter::new(
            self.config.cache_configuration(),
            Collaborators {
                sites: Box::new(self.config.site_resolver()),
                request: Box::new(request),
                tracking: Box::new(tracking),
                clock: Box::new(SystemClock),
            },
        ))
    }

    /// Build a writer for administrative operations with no request
    pub fn admin_writer(&self) -> Result<StaticCacheWriter> {
        self.writer(StaticRequest::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_apply_over_config_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "cache_path: /from/file\n").unwrap();

        let opts = GlobalOptions {
            config: Some(config_path.display().to_string()),
            cache_path: Some("/from/flag".to_string()),
            tracking_db: Some(dir.path().join("t.db").display().to_string()),
            ..Default::default()
        };

        let ctx = CommandContext::new(&opts).unwrap();
        assert_eq!(ctx.config.cache_path, "/from/flag");
        assert_eq!(
            ctx.config.tracking_db_path().unwrap(),
            dir.path().join("t.db")
        );
    }

    #[test]
    fn test_admin_writer_uses_config() {
        let dir = TempDir::new().unwrap();
        let opts = GlobalOptions {
            config: Some(dir.path().join("absent.yaml").display().to_string()),
            cache_path: Some(dir.path().join("cache").display().to_string()),
            tracking_db: Some(dir.path().join("t.db").display().to_string()),
            ..Default::default()
        };

        let writer = CommandContext::new(&opts).unwrap().admin_writer().unwrap();
        assert!(writer.is_enabled());
        assert_eq!(writer.cache_root(), Some(dir.path().join("cache").as_path()));
    }

    #[test]
    fn test_writer_does_not_open_tracking_db() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("db").join("t.db");
        let opts = GlobalOptions {
            config: Some(dir.path().join("absent.yaml").display().to_string()),
            cache_path: Some(dir.path().join("cache").display().to_string()),
            tracking_db: Some(db.display().to_string()),
            ..Default::default()
        };

        let ctx = CommandContext::new(&opts).unwrap();
        let writer = ctx
            .writer(StaticRequest::new("example.com", "/a"))
            .unwrap();
        writer.handle_content("<p>a</p>", true);

        assert!(!db.exists());
        assert!(!dir.path().join("db").exists());
    }
}
