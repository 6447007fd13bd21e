//! # CNPJ Subcommand
//!
//! - `validate` - check one or more documents; exits 1 if any fail.
//! - `check-digits` - compute the two check digits for a 12-digit base.

use std::io::Write;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use faccao_core::{cnpj, Cnpj};

use crate::output::{emit, OutputFormat, TextReport};

/// Arguments for the `faccao cnpj` subcommand.
#[derive(Args, Debug)]
pub struct CnpjArgs {
    #[command(subcommand)]
    pub command: CnpjCommand,
}

#[derive(Subcommand, Debug)]
pub enum CnpjCommand {
    /// Check whether documents verify.
    Validate {
        /// Documents, formatted or digits only.
        #[arg(required = true)]
        documents: Vec<String>,
    },

    /// Compute the check digits for a 12-digit base (root + branch).
    CheckDigits {
        /// The first twelve digits, punctuation allowed.
        base: String,
    },
}

/// Execute the cnpj subcommand.
pub fn run_cnpj(args: &CnpjArgs, format: OutputFormat, out: &mut dyn Write) -> Result<u8> {
    match &args.command {
        CnpjCommand::Validate { documents } => cmd_validate(documents, format, out),
        CnpjCommand::CheckDigits { base } => cmd_check_digits(base, format, out),
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentReport {
    pub input: String,
    pub valid: bool,
    pub normalized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_office: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DocumentReport {
    fn check(input: &str) -> Self {
        let normalized = cnpj::normalize(input);
        match Cnpj::new(input) {
            Ok(doc) => Self {
                input: input.to_string(),
                valid: true,
                normalized,
                formatted: Some(doc.formatted()),
                root: Some(doc.root().to_string()),
                head_office: Some(doc.is_head_office()),
                message: None,
            },
            Err(e) => Self {
                input: input.to_string(),
                valid: false,
                normalized,
                formatted: None,
                root: None,
                head_office: None,
                message: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateReport {
    pub documents: Vec<DocumentReport>,
}

impl TextReport for ValidateReport {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        for doc in &self.documents {
            match (&doc.formatted, &doc.message) {
                (Some(formatted), _) => {
                    let office = if doc.head_office == Some(true) {
                        "head office"
                    } else {
                        "branch"
                    };
                    writeln!(out, "OK       {formatted} ({office})")?;
                }
                (None, message) => writeln!(
                    out,
                    "INVALID  {}: {}",
                    doc.input,
                    message.as_deref().unwrap_or_default()
                )?,
            }
        }
        Ok(())
    }
}

fn cmd_validate(documents: &[String], format: OutputFormat, out: &mut dyn Write) -> Result<u8> {
    let report = ValidateReport {
        documents: documents.iter().map(|d| DocumentReport::check(d)).collect(),
    };
    let invalid = report.documents.iter().filter(|d| !d.valid).count();
    if invalid > 0 {
        tracing::info!(invalid, total = report.documents.len(), "documents failed verification");
    }
    emit(&report, format, out)?;
    Ok(u8::from(invalid > 0))
}

#[derive(Debug, Serialize)]
pub struct CheckDigitsReport {
    pub base: String,
    pub check_digits: String,
    pub cnpj: String,
    pub formatted: String,
}

impl TextReport for CheckDigitsReport {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "{} -> {}", self.check_digits, self.formatted)
    }
}

fn cmd_check_digits(base: &str, format: OutputFormat, out: &mut dyn Write) -> Result<u8> {
    let Some([first, second]) = cnpj::check_digits(base) else {
        bail!("base must have exactly 12 digits, got {:?}", cnpj::normalize(base));
    };
    let base = cnpj::normalize(base);
    let full = format!("{base}{first}{second}");
    let doc = Cnpj::new(full.as_str())?;
    let report = CheckDigitsReport {
        base,
        check_digits: format!("{first}{second}"),
        cnpj: full,
        formatted: doc.formatted(),
    };
    emit(&report, format, out)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(command: CnpjCommand, format: OutputFormat) -> (Result<u8>, String) {
        let mut buf = Vec::new();
        let result = run_cnpj(&CnpjArgs { command }, format, &mut buf);
        (result, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn validate_all_valid_exits_zero() {
        let (result, text) = run(
            CnpjCommand::Validate {
                documents: vec!["11.222.333/0001-81".into(), "11444777000161".into()],
            },
            OutputFormat::Text,
        );
        assert_eq!(result.unwrap(), 0);
        assert!(text.contains("OK       11.222.333/0001-81 (head office)"));
        assert!(text.contains("11.444.777/0001-61"));
    }

    #[test]
    fn validate_any_invalid_exits_one() {
        let (result, text) = run(
            CnpjCommand::Validate {
                documents: vec!["11222333000181".into(), "11111111111111".into()],
            },
            OutputFormat::Json,
        );
        assert_eq!(result.unwrap(), 1);
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["documents"][0]["valid"], true);
        assert_eq!(v["documents"][1]["valid"], false);
        assert_eq!(v["documents"][1]["message"], "invalid document, verify the number");
    }

    #[test]
    fn check_digits_completes_base() {
        let (result, text) = run(
            CnpjCommand::CheckDigits { base: "11.222.333/0001".into() },
            OutputFormat::Json,
        );
        assert_eq!(result.unwrap(), 0);
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["check_digits"], "81");
        assert_eq!(v["cnpj"], "11222333000181");
    }

    #[test]
    fn check_digits_rejects_short_base() {
        let (result, _) = run(
            CnpjCommand::CheckDigits { base: "1122233300".into() },
            OutputFormat::Text,
        );
        assert!(result.unwrap_err().to_string().contains("exactly 12 digits"));
    }
}
