//! `Generator`: the top-level type that owns the component set across a
//! full extraction + emission run (§3 "Ownership": "The Component set is
//! owned by the top-level Generator and outlives all handlers").

use std::path::Path;

use heimdall_common::ComponentInfo;
use heimdall_component::{ComponentId, Extractor, ExtractorOptions};
use heimdall_sbom::{DocumentMetadata, Handler};
use heimdall_sign::SigningConfig;

use crate::errors::GeneratorError;

/// Drives input paths through the Extractor (§4.4) and serializes the
/// resulting component set through the Document Engine (§4.5), with an
/// optional final signing pass (§4.5.1).
///
/// Data flow (§2): `input paths → Readers → Extractor (adds DWARF +
/// attributors) → Component set → selected Handler → (optional
/// Canonicalize + Sign) → serialized document bytes`.
pub struct Generator {
    extractor: Extractor,
}

impl Generator {
    /// Creates a generator configured with `options` (§4.4 `configure`).
    pub fn new(options: ExtractorOptions) -> Self {
        Generator {
            extractor: Extractor::new(options),
        }
    }

    /// Replaces the active extractor options mid-run.
    pub fn configure(&mut self, options: ExtractorOptions) {
        self.extractor.configure(options);
    }

    /// The currently active extractor options, for callers that need to
    /// flip a single field (e.g. the C-ABI's `set_transitive_dependencies`)
    /// without reconstructing the whole options struct from scratch.
    pub fn options(&self) -> &ExtractorOptions {
        self.extractor.options()
    }

    /// Processes one top-level input path (§4.4 `process_path`). Per-path
    /// errors are the caller's to decide whether to treat as fatal; the
    /// component batch itself never aborts on a single bad input (§4.4
    /// "Failure policy").
    pub fn process_path(&mut self, path: impl AsRef<Path>) -> Result<ComponentId, GeneratorError> {
        self.extractor.process_path(path).map_err(GeneratorError::from)
    }

    /// Processes a path known to be a library dependency (§4.4
    /// `process_library`).
    pub fn process_library(&mut self, path: impl AsRef<Path>) -> Result<ComponentId, GeneratorError> {
        self.extractor.process_library(path).map_err(GeneratorError::from)
    }

    /// Read-only view of the published component set (§4.4 `components`,
    /// §3 "Handlers hold read-only references").
    pub fn components(&self) -> &[ComponentInfo] {
        self.extractor.components()
    }

    /// Serializes the current component set with `format`'s handler
    /// (§4.5 `generate`). `format` is any token [`heimdall_sbom::resolve`]
    /// accepts (`spdx`, `spdx-2.3`, `cyclonedx-1.6`, ...).
    pub fn generate(&self, format: &str, metadata: &DocumentMetadata) -> Result<Vec<u8>, GeneratorError> {
        let handler = heimdall_sbom::resolve(format)?;
        tracing::debug!(
            format = handler.name(),
            version = handler.version(),
            components = self.components().len(),
            "generating SBOM document"
        );
        Ok(handler.generate(self.components(), metadata)?)
    }

    /// Like [`Generator::generate`], but additionally signs the result
    /// (§4.5.1). Only meaningful for CycloneDX 1.6+; callers should check
    /// `handler.supports_feature("signing")` first — §7 binds a
    /// `SignError` here to the caller's own "fail the call, don't write
    /// the unsigned document" default.
    pub fn generate_signed(
        &self,
        format: &str,
        metadata: &DocumentMetadata,
        signing: &SigningConfig<'_>,
    ) -> Result<Vec<u8>, GeneratorError> {
        let handler = heimdall_sbom::resolve(format)?;
        if !handler.supports_feature(heimdall_sbom::features::SIGNING) {
            return Err(GeneratorError::Document(heimdall_sbom::DocumentError::UnknownFormat(format!(
                "{}-{} does not support signing",
                handler.name(),
                handler.version()
            ))));
        }
        let document = handler.generate(self.components(), metadata)?;
        Ok(heimdall_sign::sign(&document, signing)?)
    }

    /// Writes `bytes` to `path`, removing the partial file if the write
    /// itself fails (§5 "Cancellation": "any written-but-incomplete
    /// output file is explicitly deleted by the Engine on error").
    pub fn write_output(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), GeneratorError> {
        let path = path.as_ref();
        if let Err(source) = std::fs::write(path, bytes) {
            let _ = std::fs::remove_file(path);
            return Err(GeneratorError::Io { path: path.to_path_buf(), source });
        }
        Ok(())
    }

    /// Validates that `path`'s parent directory exists and is writable
    /// enough to attempt a create (§7 "Configuration errors (fatal):
    /// UnwritableOutput"), checked up front before any processing runs.
    pub fn check_output_writable(path: impl AsRef<Path>) -> Result<(), GeneratorError> {
        let path = path.as_ref();
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        if !dir.is_dir() {
            return Err(GeneratorError::UnwritableOutput(path.to_path_buf()));
        }
        Ok(())
    }
}

impl Default for Generator {
    fn default() -> Self {
        Generator::new(ExtractorOptions::default())
    }
}

/// Builds [`DocumentMetadata`] the way the CLI does: a document name
/// derived from the root input's file name, `created` supplied by the
/// caller's clock (kept explicit for P3 byte-stability in tests), and a
/// freshly minted serial/namespace UUID pair for real runs.
pub fn metadata_for_root(root: &Path, created: chrono::DateTime<chrono::Utc>) -> DocumentMetadata {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sbom".to_string());
    let mut metadata = DocumentMetadata::deterministic(name, created);
    metadata.namespace_uuid = uuid::Uuid::new_v4();
    metadata.serial_uuid = uuid::Uuid::new_v4();
    metadata
}
