//! Shared plumbing for the `sbom` and `validate` binaries: logging
//! init and the single-line categorized error format (§7 "stderr
//! carries a single-line categorized error"). Everything else lives in
//! each binary's own `main` — these are argument parsers and file I/O
//! drivers, not a library with its own business logic.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Exit codes bound by §6's CLI contract.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const PLUGIN_LOAD: i32 = 1;
    pub const PLUGIN_INIT: i32 = 2;
    pub const BINARY_PROCESSING: i32 = 3;
    pub const INVALID_ARGS: i32 = 4;
    pub const SIGNING_FAILED: i32 = 5;
}

/// Initializes the one process-wide `tracing` subscriber. Only a leaf
/// binary does this — the library crates behind `heimdall` never touch
/// a subscriber themselves. `HEIMDALL_VERBOSE=1` or `--verbose` raises
/// the default level from `info` to `debug` (§6 environment variables).
pub fn init_logging(verbose: bool) {
    let env_verbose = std::env::var("HEIMDALL_VERBOSE").as_deref() == Ok("1");
    let default_level = if verbose || env_verbose { "debug" } else { "info" };

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

/// Prints the categorized one-liner `[ERROR] <kind>: <detail>` §7
/// requires on stderr.
pub fn report_error(kind: &str, detail: impl std::fmt::Display) {
    eprintln!("[ERROR] {kind}: {detail}");
}
