//! `validate <document-path> [options]` (§6): round-trips a previously
//! emitted SBOM document through its own handler's `validate_content`
//! self-check — the binding contract is exactly that round-trip, not
//! a full external schema validator.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use heimdall::sbom::ValidationResult;
use heimdall_cli::{init_logging, report_error};

/// Validates a document emitted by the `sbom` tool against its own
/// format handler's structural self-check.
#[derive(Parser)]
#[command(name = "validate")]
struct Cli {
    /// Path to the SBOM document to validate.
    document_path: PathBuf,

    /// Format family to validate against (`spdx`, `cyclonedx`). Sniffed
    /// from the document content when omitted.
    #[arg(long)]
    format: Option<String>,

    /// Explicit sub-version, overriding whatever `--format` or sniffing
    /// would otherwise select.
    #[arg(long)]
    version: Option<String>,

    /// Raises log verbosity (mirrors `HEIMDALL_VERBOSE=1`).
    #[arg(long)]
    verbose: bool,
}

/// Guesses `(family, version)` from document content when `--format`
/// is not given: SPDX tag-value documents start with `SPDXVersion:`;
/// JSON documents carry either `bomFormat`/`specVersion` (CycloneDX) or
/// `@context`/`@graph` (SPDX 3.x).
fn sniff_format(bytes: &[u8]) -> Option<(String, Option<String>)> {
    let text = std::str::from_utf8(bytes).ok()?;
    if let Some(rest) = text.lines().next() {
        if let Some(version) = rest.strip_prefix("SPDXVersion: SPDX-") {
            return Some(("spdx".to_string(), Some(version.trim().to_string())));
        }
    }

    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    if let Some(spec_version) = value.get("specVersion").and_then(|v| v.as_str()) {
        return Some(("cyclonedx".to_string(), Some(spec_version.to_string())));
    }
    if value.get("@graph").is_some() {
        let version = value
            .get("@context")
            .and_then(|v| v.as_str())
            .and_then(|ctx| ctx.split('/').rev().nth(1))
            .map(|v| v.to_string());
        return Some(("spdx".to_string(), version));
    }
    None
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let bytes = match std::fs::read(&cli.document_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            report_error("NotFound", err);
            return ExitCode::FAILURE;
        }
    };

    let (family, version) = match (&cli.format, &cli.version) {
        (Some(family), version) => (family.clone(), version.clone()),
        (None, _) => match sniff_format(&bytes) {
            Some(pair) => pair,
            None => {
                report_error("UnrecognizedFormat", "could not determine document format");
                return ExitCode::FAILURE;
            }
        },
    };

    let handler = match heimdall::sbom::resolve_with_version(&family, version.as_deref()) {
        Ok(handler) => handler,
        Err(err) => {
            report_error("UnknownFormat", err);
            return ExitCode::FAILURE;
        }
    };

    match handler.validate_content(&bytes) {
        ValidationResult::Valid => {
            println!("valid: {} {}", handler.name(), handler.version());
            ExitCode::SUCCESS
        }
        ValidationResult::Invalid { errors, warnings } => {
            for error in &errors {
                report_error("Invalid", error);
            }
            for warning in &warnings {
                eprintln!("[WARN] {warning}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::sniff_format;

    #[test]
    fn sniffs_spdx_tag_value_header() {
        let doc = b"SPDXVersion: SPDX-2.3\nDataLicense: CC0-1.0\n";
        assert_eq!(sniff_format(doc), Some(("spdx".to_string(), Some("2.3".to_string()))));
    }

    #[test]
    fn sniffs_cyclonedx_json() {
        let doc = br#"{"bomFormat":"CycloneDX","specVersion":"1.6"}"#;
        assert_eq!(sniff_format(doc), Some(("cyclonedx".to_string(), Some("1.6".to_string()))));
    }
}
