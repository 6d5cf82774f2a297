//! The single, process-wide plugin context (§6): linker shims call
//! `onload` once, then drive the rest of the surface through plain
//! C strings with no handle of their own to pass back in, so the state
//! those calls mutate has to live somewhere — here, behind one
//! process-wide lock, the same shape as the DWARF serialization lock in
//! `heimdall-dwarf`.

use std::path::PathBuf;

use heimdall::component::ExtractorOptions;
use heimdall::Generator;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Accumulated plugin configuration and the in-progress component set.
pub struct PluginContext {
    pub generator: Generator,
    pub format: String,
    pub spdx_version: Option<String>,
    pub cyclonedx_version: Option<String>,
    pub output_path: PathBuf,
    pub transitive_dependencies: bool,
}

impl Default for PluginContext {
    fn default() -> Self {
        PluginContext {
            generator: Generator::new(ExtractorOptions {
                detected_by: Some("heimdall-cabi".to_string()),
                ..ExtractorOptions::default()
            }),
            format: "cyclonedx".to_string(),
            spdx_version: None,
            cyclonedx_version: None,
            output_path: PathBuf::from("sbom.json"),
            transitive_dependencies: true,
        }
    }
}

impl PluginContext {
    /// The effective `(format, version)` handler token, combining
    /// `--format`/`set_format` with the more specific
    /// `--spdx-version`/`--cyclonedx-version` overrides (§6).
    pub fn handler_format(&self) -> String {
        if self.format.starts_with("spdx") {
            if let Some(v) = &self.spdx_version {
                return format!("spdx-{v}");
            }
        } else if self.format.starts_with("cyclonedx") {
            if let Some(v) = &self.cyclonedx_version {
                return format!("cyclonedx-{v}");
            }
        }
        self.format.clone()
    }
}

/// The process-wide context. `None` until `onload` runs; every other
/// entry point errors out (non-zero) if called before it.
pub static CONTEXT: Lazy<Mutex<Option<PluginContext>>> = Lazy::new(|| Mutex::new(None));
