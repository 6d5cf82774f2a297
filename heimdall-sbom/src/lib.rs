//! The SBOM Document Engine (§4.5): a registry of format handlers behind
//! one [`Handler`] contract, plus [`resolve`], the handler factory.
//!
//! Format choice is a runtime value passed to [`resolve`], never a
//! trait-object hierarchy deeper than the one `Handler` vtable (§9
//! "Polymorphic format handlers... → a single handler capability
//! set... dispatched via tagged variants or a trait-style interface").

#![warn(missing_docs)]
#![allow(missing_docs)]

mod cyclonedx;
mod errors;
mod metadata;
mod refs;
mod spdx2;
mod spdx3;

use heimdall_common::ComponentInfo;

pub use errors::DocumentError;
pub use metadata::DocumentMetadata;

/// The outcome of a handler's own structural self-check (§4.5
/// `validate_content`): "basic structural self-check, not a full schema
/// validator".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid { errors: Vec<String>, warnings: Vec<String> },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    fn invalid(error: impl Into<String>) -> Self {
        ValidationResult::Invalid {
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }
}

/// Feature tags a handler may report support for via
/// [`Handler::supports_feature`] (§4.5 handler contract).
pub mod features {
    pub const SIGNING: &str = "signing";
    pub const RELATIONSHIPS: &str = "relationships";
    pub const EVIDENCE: &str = "evidence";
    pub const PROPERTIES: &str = "properties";
    pub const LICENSES_EXPRESSION: &str = "licenses-expression";
}

/// The uniform contract every SBOM format handler implements (§4.5
/// "Format Handler contract").
pub trait Handler {
    /// `"SPDX"` or `"CycloneDX"`.
    fn name(&self) -> &'static str;

    /// The exact version string this handler emits, e.g. `"2.3"`, `"1.6"`.
    fn version(&self) -> &'static str;

    /// Whether this handler+version combination supports a named
    /// capability (§4.5: tags include `signing`, `relationships`,
    /// `evidence`, `properties`, `licenses-expression`).
    fn supports_feature(&self, tag: &str) -> bool;

    /// Serializes `components` into this handler's document format.
    /// Deterministic for fixed inputs (§4.5 handler contract; P3).
    fn generate(
        &self,
        components: &[ComponentInfo],
        metadata: &DocumentMetadata,
    ) -> Result<Vec<u8>, DocumentError>;

    /// A basic structural self-check of previously generated bytes
    /// (§4.5 `validate_content`; bound to the `validate` CLI tool's
    /// contract, §6).
    fn validate_content(&self, bytes: &[u8]) -> ValidationResult;
}

/// Resolves a `(format, version)` string pair to a concrete handler
/// (§4.5 "Handler factory").
///
/// `format` accepts every token the CLI surface lists in §6: `spdx`,
/// `spdx-2.3`, `spdx-3.0`, `spdx-3.0.0`, `spdx-3.0.1`, `cyclonedx`,
/// `cyclonedx-1.4`, `cyclonedx-1.5`, `cyclonedx-1.6`. An unversioned
/// family token defaults per §4.5 ("unknown version defaults per
/// family (SPDX→2.3, CycloneDX→1.6)"); an unsupported combination fails
/// fast with [`DocumentError::UnknownFormat`]/[`DocumentError::UnknownVersion`].
pub fn resolve(format: &str) -> Result<Box<dyn Handler>, DocumentError> {
    match format {
        "spdx" | "spdx-2.3" => Ok(Box::new(spdx2::Spdx23Handler)),
        "spdx-3.0" | "spdx-3.0.0" => Ok(Box::new(spdx3::Spdx3Handler::new("3.0"))),
        "spdx-3.0.1" => Ok(Box::new(spdx3::Spdx3Handler::new("3.0.1"))),
        "cyclonedx" | "cyclonedx-1.6" => Ok(Box::new(cyclonedx::CycloneDxHandler::new("1.6"))),
        "cyclonedx-1.5" => Ok(Box::new(cyclonedx::CycloneDxHandler::new("1.5"))),
        "cyclonedx-1.4" => Ok(Box::new(cyclonedx::CycloneDxHandler::new("1.4"))),
        other if other.starts_with("spdx-") => Err(DocumentError::UnknownVersion {
            family: "SPDX",
            version: other.trim_start_matches("spdx-").to_string(),
        }),
        other if other.starts_with("cyclonedx-") => Err(DocumentError::UnknownVersion {
            family: "CycloneDX",
            version: other.trim_start_matches("cyclonedx-").to_string(),
        }),
        other => Err(DocumentError::UnknownFormat(other.to_string())),
    }
}

/// Resolves `(format_family, explicit_version)` the way the CLI's
/// `--format`/`--spdx-version`/`--cyclonedx-version` options combine
/// (§6): an explicit version always wins over a bare family token.
pub fn resolve_with_version(family: &str, version: Option<&str>) -> Result<Box<dyn Handler>, DocumentError> {
    match (family, version) {
        ("spdx" | "spdx-2.3" | "spdx-3.0" | "spdx-3.0.0" | "spdx-3.0.1", Some(v)) => {
            resolve(&format!("spdx-{v}"))
        }
        ("cyclonedx" | "cyclonedx-1.4" | "cyclonedx-1.5" | "cyclonedx-1.6", Some(v)) => {
            resolve(&format!("cyclonedx-{v}"))
        }
        (family, _) => resolve(family),
    }
}
