//! Document-level metadata (§3 `SBOMDocument`) supplied by the caller.
//!
//! Every value a handler needs to be deterministic — the clock, the
//! per-run UUIDs — is threaded in explicitly rather than read from
//! `SystemTime::now()`/`Uuid::new_v4()` inside the handler itself, the
//! same way [`heimdall_sign::SigningConfig::timestamp`] is caller-supplied
//! so that `generate` stays a pure function of its inputs (§4.5 handler
//! contract: "deterministic for fixed inputs", P3).

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Everything a [`crate::Handler::generate`] call needs beyond the
/// component set itself.
#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    /// Human-readable document name (SPDX `DocumentName`, part of the
    /// CycloneDX `metadata.component.name` when set).
    pub document_name: String,

    /// Used to build the SPDX `DocumentNamespace`
    /// (`https://spdx.org/spdxdocs/<name>-<uuid>`, §4.5 SPDX 2.3/3.0).
    pub namespace_uuid: Uuid,

    /// Used to build the CycloneDX `serialNumber` (`urn:uuid:<uuid>`,
    /// §4.5 CycloneDX).
    pub serial_uuid: Uuid,

    /// Document creation timestamp (§4.5: ISO-8601 UTC, millisecond
    /// precision for CycloneDX).
    pub created: DateTime<Utc>,

    /// Tool identity recorded as the SPDX `Creator: Tool:` / CycloneDX
    /// `metadata.tools` entry.
    pub creator_tool_name: String,
    pub creator_tool_version: String,

    /// SPDX 3.0.x emission mode (§4.5 "This binary decision is a
    /// contract, not an implementation detail"): `true` emits only the
    /// fields the official schema allows; `false` (default posture of
    /// this spec) emits full SBOM content under the same `@graph`.
    pub strict_schema: bool,
}

impl DocumentMetadata {
    /// Convenience constructor seeding both UUIDs deterministically from
    /// `document_name`, for callers (tests, the CLI without an explicit
    /// `--serial` override) that have no external UUID source to thread
    /// through but still want `generate` to be reproducible across runs
    /// with the same name and clock (P3).
    pub fn deterministic(document_name: impl Into<String>, created: DateTime<Utc>) -> Self {
        let document_name = document_name.into();
        let namespace_uuid = Uuid::new_v5(&Uuid::NAMESPACE_URL, document_name.as_bytes());
        let serial_uuid = Uuid::new_v5(
            &Uuid::NAMESPACE_URL,
            format!("{document_name}:{created}").as_bytes(),
        );
        DocumentMetadata {
            document_name,
            namespace_uuid,
            serial_uuid,
            created,
            creator_tool_name: "Heimdall".to_string(),
            creator_tool_version: env!("CARGO_PKG_VERSION").to_string(),
            strict_schema: false,
        }
    }

    /// The CycloneDX-millisecond-precision ISO-8601 timestamp (§4.5
    /// "`metadata.timestamp` is ISO-8601 UTC to millisecond precision").
    pub fn timestamp_millis(&self) -> String {
        format!(
            "{}.{:03}Z",
            self.created.format("%Y-%m-%dT%H:%M:%S"),
            self.created.timestamp_subsec_millis()
        )
    }

    /// The SPDX `Created` timestamp (§4.5 "ISO-8601 UTC"), second
    /// precision, matching every example in §4.5/§8.
    pub fn timestamp_seconds(&self) -> String {
        self.created.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}
