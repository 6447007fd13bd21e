//! # Output Rendering
//!
//! Every subcommand builds a serializable report and hands it here. JSON and
//! YAML come straight from serde; text is the report's own plain rendering.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

/// A report that knows how to print itself for humans.
pub trait TextReport {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()>;
}

/// Write `report` to `out` in the requested format.
pub fn emit<T>(report: &T, format: OutputFormat, out: &mut dyn Write) -> Result<()>
where
    T: Serialize + TextReport,
{
    match format {
        OutputFormat::Text => report.write_text(out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(report)?;
            out.write_all(yaml.as_bytes())?;
        }
    }
    Ok(())
}
