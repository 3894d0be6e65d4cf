//! Shared CLI argument types

mod common;
mod global;

pub use common::{ClearMode, OutputFormat};
pub use global::GlobalOptions;
