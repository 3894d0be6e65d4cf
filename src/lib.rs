//! static-cache - write-through static page cache for CMS-rendered HTML
//!
//! The library exposes [`cache::StaticCacheWriter`] and the collaborator
//! traits a host CMS implements. The `static-cache` binary wires it to a YAML
//! configuration file and a SQLite tracking table for administrative use.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod site;

pub use error::{Error, Result};
