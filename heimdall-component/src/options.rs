//! The single configuration struct threaded through the extraction
//! pipeline (§4.4 `configure`, §9 "not global mutable state").

use std::path::PathBuf;

use heimdall_attributors::AttributorContext;

/// Options accepted by [`crate::Extractor::configure`].
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Raises log verbosity (mirrors `HEIMDALL_VERBOSE`, §6); library code
    /// only reads this to decide how much detail to attach to
    /// `tracing` events, it never touches a subscriber.
    pub verbose: bool,

    /// Runs the DWARF extractor (§4.2). On by default; turning it off
    /// skips straight to the symbol-table fallback for `functions`.
    pub extract_debug_info: bool,

    /// Whether dependencies resolving into standard system library
    /// directories are themselves processed into components, or left as
    /// bare dependency strings (§4.4 step 6).
    pub include_system_libraries: bool,

    /// Recursively resolves and processes each dependency string to a
    /// component (§4.4 step 6). On by default.
    pub transitive_dependencies: bool,

    /// Directories to search for Ada `.ali` files (§4.4 `configure`
    /// option `ali_search_paths`; forwarded to [`AttributorContext`]).
    pub ali_search_paths: Vec<PathBuf>,

    /// Forces the Ada probe on even with no search paths configured.
    pub ali_enabled: bool,

    /// Enables Ada cross-reference/call-graph extraction (§9 Open
    /// Questions: optional, may ship as a later milestone).
    pub ali_enhanced: bool,

    /// Tag of the scanner or linker plugin driving this run, stamped
    /// onto every component's `detected_by` (§3). `None` leaves the
    /// field unset, e.g. for library-internal tests that never go
    /// through a front door that sets one.
    pub detected_by: Option<String>,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        ExtractorOptions {
            verbose: false,
            extract_debug_info: true,
            include_system_libraries: false,
            transitive_dependencies: true,
            ali_search_paths: Vec::new(),
            ali_enabled: false,
            ali_enhanced: false,
            detected_by: None,
        }
    }
}

impl ExtractorOptions {
    pub(crate) fn attributor_context(&self) -> AttributorContext {
        AttributorContext {
            ali_search_paths: self.ali_search_paths.clone(),
            ali_enabled: self.ali_enabled,
            ali_enhanced: self.ali_enhanced,
        }
    }
}
