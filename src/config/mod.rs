//! Configuration management for static-cache

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::CacheConfiguration;
use crate::error::{ConfigError, Result};
use crate::site::{ConfiguredSites, Site};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Cache root directory; empty or missing disables the cache
    #[serde(default)]
    pub cache_path: String,

    /// Clear the cache through `rm -rf` instead of a native walk
    #[serde(default)]
    pub use_shell_clear: bool,

    /// Tracking database location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_db: Option<PathBuf>,

    /// Handle of the site to use for every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_site: Option<String>,

    /// Sites served by the CMS
    #[serde(default)]
    pub sites: Vec<Site>,
}

impl Config {
    /// Get the default config file path (~/.static-cache/config.yaml)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".static-cache").join("config.yaml"))
    }

    /// Resolve an explicit path or fall back to the default
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Load from `path` (or the default location). A missing file yields the
    /// defaults, which leave the cache disabled.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        match Self::load_from(&path) {
            Err(crate::error::Error::Config(ConfigError::NotFound(_))) => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        for (i, site) in self.sites.iter().enumerate() {
            if self.sites[..i].iter().any(|s| s.handle == site.handle) {
                return Err(
                    ConfigError::Invalid(format!("Duplicate site handle '{}'", site.handle)).into(),
                );
            }
        }

        if let Some(current) = &self.current_site {
            if !self.sites.iter().any(|s| &s.handle == current) {
                return Err(
                    ConfigError::Invalid(format!("Unknown current_site '{}'", current)).into(),
                );
            }
        }

        Ok(())
    }

    /// Tracking database path (defaults under the user cache directory)
    pub fn tracking_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.tracking_db {
            return Ok(path.clone());
        }

        let cache_base = dirs::cache_dir().ok_or(ConfigError::Invalid(
            "Could not determine cache directory".to_string(),
        ))?;
        Ok(cache_base.join("static-cache").join("tracking.db"))
    }

    /// Writer settings
    pub fn cache_configuration(&self) -> CacheConfiguration {
        CacheConfiguration {
            cache_path: self.cache_path.clone(),
            use_shell_clear: self.use_shell_clear,
        }
    }

    /// Site resolver backed by the configured sites
    pub fn site_resolver(&self) -> ConfiguredSites {
        ConfiguredSites::new(self.sites.clone(), self.current_site.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_config_is_disabled() {
        let config = Config::default();
        assert!(config.cache_path.is_empty());
        assert!(!config.use_shell_clear);
        assert!(config.sites.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "cache_path: /var/cache/static/\n\
             use_shell_clear: true\n\
             tracking_db: /var/lib/static/tracking.db\n\
             current_site: main\n\
             sites:\n  \
               - handle: main\n    base_url: http://example.com/\n",
        );

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cache_path, "/var/cache/static/");
        assert!(config.use_shell_clear);
        assert_eq!(
            config.tracking_db_path().unwrap(),
            PathBuf::from("/var/lib/static/tracking.db")
        );
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.cache_configuration().cache_path, "/var/cache/static/");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "cache_path: /tmp/c\nnix_based_clear_cache: true\n");

        match Config::load_from(&path) {
            Err(Error::Config(ConfigError::ParseError(msg))) => {
                assert!(msg.contains("nix_based_clear_cache"));
            }
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_site_keys_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "sites:\n  - handle: a\n    base_url: http://a.test/\n    language: en\n",
        );

        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_unknown_current_site_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "current_site: ghost\n");

        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_duplicate_handles_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "sites:\n  - handle: a\n    base_url: http://a.test/\n  - handle: a\n    base_url: http://b.test/\n",
        );

        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_load_at_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.yaml");

        let config = Config::load_at(Some(missing.to_str().unwrap())).unwrap();
        assert!(config.cache_path.is_empty());
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Config::load_from(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(Error::Config(ConfigError::NotFound(_)))));
    }
}
