//! Options threaded into every attributor probe (§4.3, §9 "a configuration
//! struct threaded explicitly through the pipeline").

use std::path::PathBuf;

/// Configuration shared by all attributors for one extraction run.
#[derive(Debug, Clone, Default)]
pub struct AttributorContext {
    /// Directories to search for `.ali` files (§4.4 `configure` option
    /// `ali_search_paths`). A non-empty list activates the Ada probe even
    /// without `ali_enabled` (§4.3: "activates when either (a) `.ali`
    /// files are discovered in a caller-specified search path, or (b)
    /// enabled via explicit option").
    pub ali_search_paths: Vec<PathBuf>,

    /// Explicitly enables the Ada ALI probe even with no search paths
    /// configured (e.g. when `.ali` files sit next to the binary itself).
    pub ali_enabled: bool,

    /// Enables the "enhanced" Ada extraction mode: cross-reference (`X`)
    /// and call-graph (`G`) records, which the spec allows shipping as a
    /// later milestone (§9 Open Questions).
    pub ali_enhanced: bool,
}

impl AttributorContext {
    /// Whether the Ada probe should run at all for this run.
    pub fn ali_probe_active(&self) -> bool {
        self.ali_enabled || !self.ali_search_paths.is_empty()
    }
}
