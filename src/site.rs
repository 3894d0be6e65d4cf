//! Site and request collaborators
//!
//! The writer only needs two things from the host CMS: the base URL of the site
//! serving the current request, and the request's path. Both are expressed as
//! traits so the host can plug in its own resolution.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SiteError;

/// A site (tenant) served by the CMS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Site {
    /// Short identifier for the site
    pub handle: String,

    /// Base URL the site is served under (scheme + host + optional subpath)
    pub base_url: String,
}

/// Information about the request being rendered
pub trait RequestContext {
    /// Request host, without port
    fn host(&self) -> &str;

    /// URL path of the request, without scheme, host, or query
    fn full_path(&self) -> &str;
}

/// Site lookup capability
pub trait SiteResolver {
    /// The site already selected for this request, if any
    fn current_site(&self) -> Option<Site>;

    /// Fallback lookup from the request's host and path
    fn resolve_for_request(&self, request: &dyn RequestContext) -> Result<Site, SiteError>;
}

/// Plain request value
#[derive(Debug, Clone, Default)]
pub struct StaticRequest {
    pub host: String,
    pub full_path: String,
}

impl StaticRequest {
    pub fn new(host: impl Into<String>, full_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            full_path: full_path.into(),
        }
    }
}

impl RequestContext for StaticRequest {
    fn host(&self) -> &str {
        &self.host
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }
}

/// Sites declared in the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfiguredSites {
    sites: Vec<Site>,
    current: Option<String>,
}

impl ConfiguredSites {
    /// Build from a list of sites and an optional current-site handle
    pub fn new(sites: Vec<Site>, current: Option<String>) -> Self {
        Self { sites, current }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }
}

impl SiteResolver for ConfiguredSites {
    fn current_site(&self) -> Option<Site> {
        let handle = self.current.as_deref()?;
        self.sites.iter().find(|s| s.handle == handle).cloned()
    }

    /// Match on host, preferring the site whose base path is the longest
    /// prefix of the request path.
    fn resolve_for_request(&self, request: &dyn RequestContext) -> Result<Site, SiteError> {
        let host = request.host().to_ascii_lowercase();
        let path = request.full_path();

        let mut best: Option<(usize, &Site)> = None;
        for site in &self.sites {
            let url = Url::parse(&site.base_url)?;
            if url.host_str().map(str::to_ascii_lowercase).as_deref() != Some(host.as_str()) {
                continue;
            }

            let base_path = url.path().trim_end_matches('/');
            let prefixed = base_path.is_empty()
                || path == base_path
                || path.starts_with(&format!("{}/", base_path));
            if !prefixed {
                continue;
            }

            if best.is_none_or(|(len, _)| base_path.len() > len) {
                best = Some((base_path.len(), site));
            }
        }

        best.map(|(_, site)| site.clone())
            .ok_or_else(|| SiteError::NoMatch(request.host().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(handle: &str, base_url: &str) -> Site {
        Site {
            handle: handle.to_string(),
            base_url: base_url.to_string(),
        }
    }

    #[test]
    fn test_current_site_by_handle() {
        let sites = ConfiguredSites::new(
            vec![site("default", "http://example.com/")],
            Some("default".to_string()),
        );

        assert_eq!(sites.current_site().unwrap().handle, "default");
    }

    #[test]
    fn test_current_site_unknown_handle() {
        let sites = ConfiguredSites::new(
            vec![site("default", "http://example.com/")],
            Some("missing".to_string()),
        );

        assert!(sites.current_site().is_none());
    }

    #[test]
    fn test_resolve_by_host() {
        let sites = ConfiguredSites::new(
            vec![
                site("a", "http://a.example.com/"),
                site("b", "https://b.example.com/"),
            ],
            None,
        );
        let request = StaticRequest::new("B.example.com", "/news");

        let resolved = sites.resolve_for_request(&request).unwrap();
        assert_eq!(resolved.handle, "b");
    }

    #[test]
    fn test_resolve_prefers_longest_base_path() {
        let sites = ConfiguredSites::new(
            vec![
                site("root", "http://example.com/"),
                site("fr", "http://example.com/fr/"),
            ],
            None,
        );

        let fr = sites
            .resolve_for_request(&StaticRequest::new("example.com", "/fr/blog"))
            .unwrap();
        assert_eq!(fr.handle, "fr");

        // "/french" is not under "/fr"
        let root = sites
            .resolve_for_request(&StaticRequest::new("example.com", "/french"))
            .unwrap();
        assert_eq!(root.handle, "root");
    }

    #[test]
    fn test_resolve_no_match() {
        let sites = ConfiguredSites::new(vec![site("a", "http://a.example.com/")], None);
        let err = sites
            .resolve_for_request(&StaticRequest::new("other.test", "/"))
            .unwrap_err();

        assert!(matches!(err, SiteError::NoMatch(host) if host == "other.test"));
    }

    #[test]
    fn test_resolve_invalid_base_url() {
        let sites = ConfiguredSites::new(vec![site("bad", "not a url")], None);
        let err = sites
            .resolve_for_request(&StaticRequest::new("example.com", "/"))
            .unwrap_err();

        assert!(matches!(err, SiteError::InvalidBaseUrl(_)));
    }
}
