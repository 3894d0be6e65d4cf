//! JSON output formatting

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Wrapper for JSON output with metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T> {
    /// The report itself
    pub data: T,

    /// Metadata about the invocation
    pub meta: Metadata,
}

/// Metadata included in JSON output
#[derive(Debug, Serialize, Deserialize)]
pub struct Metadata {
    /// Command that produced the report
    pub command: String,

    /// Timestamp of the report
    pub timestamp: String,

    /// CLI version
    pub version: String,
}

impl<T> JsonOutput<T> {
    /// Create a new JSON output with metadata
    pub fn new(command: &str, data: T) -> Self {
        Self {
            data,
            meta: Metadata {
                command: command.to_string(),
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Format data as pretty-printed JSON
pub fn format_json<T: Serialize + ?Sized>(
    command: &str,
    data: &T,
) -> Result<String, serde_json::Error> {
    let output = JsonOutput::new(command, data);
    serde_json::to_string_pretty(&output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize)]
    struct Removed {
        files_removed: usize,
    }

    #[test]
    fn test_json_output_new() {
        let output = JsonOutput::new("clear", 3);

        assert_eq!(output.data, 3);
        assert_eq!(output.meta.command, "clear");
        assert_eq!(output.meta.version, env!("CARGO_PKG_VERSION"));
        assert!(!output.meta.timestamp.is_empty());
    }

    #[test]
    fn test_format_json_envelope() {
        let result = format_json("clear", &Removed { files_removed: 2 }).unwrap();

        assert!(result.contains("\"data\""));
        assert!(result.contains("\"files_removed\": 2"));
        assert!(result.contains("\"command\": \"clear\""));
        assert!(result.contains("\"timestamp\""));
    }
}
