//! Heimdall generates standards-compliant SBOM documents from compiled
//! binaries: it identifies every component that contributed to a linked
//! executable (or shared/static library/object), extracts per-component
//! metadata, and emits SPDX 2.3/3.0/3.0.1 or CycloneDX 1.4/1.5/1.6,
//! optionally signing the CycloneDX output (§1).
//!
//! This facade crate re-exports the component crates under short names
//! and hosts [`Generator`], the type that drives a full extraction +
//! emission run end to end.

#![warn(missing_docs)]
#![allow(missing_docs)]

mod errors;
mod generator;

#[doc(inline)]
pub use heimdall_attributors as attributors;
#[doc(inline)]
pub use heimdall_common as common;
#[doc(inline)]
pub use heimdall_component as component;
#[doc(inline)]
pub use heimdall_dwarf as dwarf;
#[doc(inline)]
pub use heimdall_readers as readers;
#[doc(inline)]
pub use heimdall_sbom as sbom;
#[doc(inline)]
pub use heimdall_sign as sign;

pub use errors::GeneratorError;
pub use generator::{metadata_for_root, Generator};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use component::ExtractorOptions;

    fn minimal_elf_executable() -> Vec<u8> {
        let mut buf = vec![0u8; 64];
        buf[0..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
        buf[4] = 2;
        buf[5] = 1;
        buf[6] = 1;
        buf[16..18].copy_from_slice(&2u16.to_le_bytes());
        buf[18..20].copy_from_slice(&0x3eu16.to_le_bytes());
        buf[20..24].copy_from_slice(&1u32.to_le_bytes());
        buf
    }

    #[test]
    fn end_to_end_generates_cyclonedx_for_one_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app");
        std::fs::write(&path, minimal_elf_executable()).unwrap();

        let mut generator = Generator::new(ExtractorOptions::default());
        generator.process_path(&path).unwrap();
        assert_eq!(generator.components().len(), 1);

        let created = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let metadata = sbom::DocumentMetadata::deterministic("app", created);
        let bytes = generator.generate("cyclonedx-1.6", &metadata).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["bomFormat"], "CycloneDX");
        assert_eq!(value["components"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn unknown_format_fails_fast() {
        let generator = Generator::default();
        let created = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let metadata = sbom::DocumentMetadata::deterministic("empty", created);
        assert!(generator.generate("not-a-format", &metadata).is_err());
    }
}
