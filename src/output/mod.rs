//! Output formatting for CLI results

use crate::cli::OutputFormat;
use static_cache::Result;

pub mod json;

/// Trait for reports that can be formatted for output
pub trait Formattable {
    /// Human-readable rendering
    fn pretty(&self) -> String;

    /// Command name recorded in JSON metadata
    fn command(&self) -> &'static str;

    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>
    where
        Self: serde::Serialize + Sized,
    {
        match format {
            OutputFormat::Pretty => Ok(self.pretty()),
            OutputFormat::Json => Ok(json::format_json(self.command(), self)?),
        }
    }
}

/// Format and print data to stdout
pub fn print<T: Formattable + serde::Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}
