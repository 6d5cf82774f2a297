//! The component data model (§3): `ComponentInfo` and the value types that
//! hang off it.

use std::collections::{BTreeMap, BTreeSet};

use crate::checksum::{ChecksumAlgorithm, ChecksumMap};

/// The kind of artifact a component represents (§3 `file_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileType {
    Executable,
    SharedLibrary,
    StaticArchive,
    ObjectFile,
    SourceFile,
    Unknown,
}

/// Which package manager (if any) attributed this component (§3
/// `package_manager`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PackageManager {
    System,
    Conan,
    Vcpkg,
    Gnat,
    Generic,
    Unknown,
}

impl PackageManager {
    /// The purl ecosystem segment this package manager maps to, used by
    /// the CycloneDX handler's best-effort `purl` derivation.
    pub fn purl_ecosystem(self) -> Option<&'static str> {
        match self {
            PackageManager::System => Some("deb"),
            PackageManager::Conan => Some("conan"),
            PackageManager::Vcpkg => Some("vcpkg"),
            PackageManager::Gnat => Some("generic"),
            PackageManager::Generic => Some("generic"),
            PackageManager::Unknown => None,
        }
    }
}

/// One entry from a reader's symbol table (§3 `SymbolInfo`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolInfo {
    pub name: String,
    pub size: u64,
    pub binding: String,
    pub visibility: String,
    pub section: Option<String>,
}

/// One entry from a reader's section table (§3 `SectionInfo`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionInfo {
    pub name: String,
    pub size: u64,
    pub flags: Vec<String>,
}

/// A component's processing error, captured in-place rather than aborting
/// the batch (§4.4 "Failure policy").
pub type ProcessingError = String;

/// The central entity of the whole pipeline: one software artifact that
/// contributed to the scanned binary (§3 `ComponentInfo`).
///
/// `ComponentInfo` is built up incrementally by the extractor
/// (`heimdall-component`) and then frozen: once [`ComponentInfo::mark_processed`]
/// is called, structural fields must not be mutated again (§3 invariant I2).
/// This struct does not enforce that at the type level — Rust's ownership
/// model already prevents the read-only `heimdall-sbom` handlers from
/// mutating anything they only borrow — but the extractor observes the
/// discipline described in §4.4 and never calls mutating methods again
/// after publication.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub name: String,
    pub file_path: String,
    identity_key: Option<String>,

    pub version: Option<String>,
    pub supplier: Option<String>,
    pub download_location: Option<String>,
    pub homepage: Option<String>,

    pub license_declared: Option<String>,
    pub license_concluded: Option<String>,

    pub checksums: ChecksumMap,

    pub package_manager: Option<PackageManager>,
    pub file_type: FileType,
    pub file_size: u64,

    pub symbols: BTreeSet<SymbolInfo>,
    pub sections: BTreeSet<SectionInfo>,
    pub dependencies: Vec<String>,
    pub source_files: Vec<String>,
    pub functions: BTreeSet<String>,
    pub compile_units: BTreeSet<String>,

    pub properties: BTreeMap<String, String>,

    pub was_processed: bool,
    pub contains_debug_info: bool,
    pub is_stripped: bool,
    pub is_system_library: bool,
    pub detected_by: Option<String>,

    pub processing_error: Option<ProcessingError>,
}

impl ComponentInfo {
    /// Creates a fresh, unprocessed component seeded from a file path
    /// (§3 lifecycle: "created by the Extractor on first encounter of a
    /// path").
    pub fn new(name: impl Into<String>, file_path: impl Into<String>) -> Self {
        ComponentInfo {
            name: name.into(),
            file_path: file_path.into(),
            identity_key: None,
            version: None,
            supplier: None,
            download_location: None,
            homepage: None,
            license_declared: None,
            license_concluded: None,
            checksums: ChecksumMap::new(),
            package_manager: None,
            file_type: FileType::Unknown,
            file_size: 0,
            symbols: BTreeSet::new(),
            sections: BTreeSet::new(),
            dependencies: Vec::new(),
            source_files: Vec::new(),
            functions: BTreeSet::new(),
            compile_units: BTreeSet::new(),
            properties: BTreeMap::new(),
            was_processed: false,
            contains_debug_info: false,
            is_stripped: false,
            is_system_library: false,
            detected_by: None,
            processing_error: None,
        }
    }

    /// The deduplication key (§3 I1): `hash(file_path || content_sha256)`.
    ///
    /// Set once via [`ComponentInfo::set_identity_key`]; reading it before
    /// that returns `None` since publication requires it to be set (I1).
    pub fn identity_key(&self) -> Option<&str> {
        self.identity_key.as_deref()
    }

    /// Derives and stores the identity key from the already-populated
    /// `file_path` and `checksums[SHA256]`.
    ///
    /// Returns `None` (and does not set the key) if SHA-256 has not been
    /// recorded yet, since the key is defined in terms of it.
    pub fn derive_identity_key(&mut self) -> Option<&str> {
        let sha256 = self.checksums.get(&ChecksumAlgorithm::Sha256)?.clone();
        let key = crate::checksum::sha256_hex(format!("{}\0{}", self.file_path, sha256).as_bytes());
        self.identity_key = Some(key);
        self.identity_key.as_deref()
    }

    /// Explicitly assigns the identity key, e.g. when merging archive
    /// member identities with an architecture discriminator (§4.1
    /// universal Mach-O).
    pub fn set_identity_key(&mut self, key: impl Into<String>) {
        self.identity_key = Some(key.into());
    }

    /// Marks the component as fully processed (§3 I2, I3).
    ///
    /// After this call, `checksums[SHA256]` must already be populated —
    /// callers violating I3 get a debug assertion in test builds and a
    /// best-effort fallback (`file_size == 0` hash of an empty buffer is
    /// never produced by the readers, so this only fires on a caller bug).
    pub fn mark_processed(&mut self) {
        debug_assert!(
            self.checksums.contains_key(&ChecksumAlgorithm::Sha256),
            "I3 violated: component marked processed without a SHA-256 checksum"
        );
        self.was_processed = true;
    }

    /// Records a non-fatal processing error without aborting the batch
    /// (§4.4 "Failure policy", §7 "Attribution errors").
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.processing_error = Some(message.into());
    }

    /// Adds a path alias for a component that was found to be a content
    /// duplicate of one already published (§4.4 "Dedup", S6).
    pub fn add_alias(&mut self, other_path: &str) {
        let entry = self.properties.entry("aliases".to_string()).or_default();
        if entry.is_empty() {
            *entry = other_path.to_string();
        } else if !entry.split(';').any(|p| p == other_path) {
            entry.push(';');
            entry.push_str(other_path);
        }
    }

    /// `true` once at least one checksum has been recorded.
    pub fn has_checksums(&self) -> bool {
        !self.checksums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_requires_sha256() {
        let mut c = ComponentInfo::new("app", "/bin/app");
        assert!(c.derive_identity_key().is_none());
        c.checksums
            .insert(ChecksumAlgorithm::Sha256, "a".repeat(64));
        assert!(c.derive_identity_key().is_some());
    }

    #[test]
    fn identity_key_is_stable_for_same_inputs() {
        let mut a = ComponentInfo::new("app", "/bin/app");
        a.checksums
            .insert(ChecksumAlgorithm::Sha256, "a".repeat(64));
        let mut b = a.clone();
        assert_eq!(a.derive_identity_key(), b.derive_identity_key());
    }

    #[test]
    fn add_alias_is_idempotent_and_ordered() {
        let mut c = ComponentInfo::new("app", "/bin/app");
        c.add_alias("/tmp/app");
        c.add_alias("/tmp/app");
        c.add_alias("/opt/app");
        assert_eq!(
            c.properties.get("aliases").unwrap(),
            "/tmp/app;/opt/app"
        );
    }
}
