//! The stable C-ABI plugin surface (§6): a fixed, narrow set of
//! `extern "C"` entry points that a linker wrapper (LLD post-link, Gold
//! in-link) calls once per process — `onload`, a handful of `set_*`
//! configuration calls, `process_input_file` once per discovered linker
//! input, and a final `finalize` that writes the SBOM.
//!
//! Every entry point returns `c_int` (`0` success, non-zero error) and
//! is wrapped in [`std::panic::catch_unwind`]: a panic inside the
//! extraction or serialization path must never unwind across the FFI
//! boundary, since this is a fixed function list rather than a generic
//! foreign-object surface with its own per-call landing pad.

mod context;

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::panic;
use std::path::PathBuf;

use context::{PluginContext, CONTEXT};

const OK: c_int = 0;
const ERR_NOT_LOADED: c_int = 1;
const ERR_INVALID_ARG: c_int = 2;
const ERR_PROCESSING: c_int = 3;
const ERR_FINALIZE: c_int = 4;
const ERR_PANIC: c_int = 5;

/// Reads a borrowed `&str` out of a non-null, NUL-terminated C string.
/// Returns `None` for a null pointer or invalid UTF-8; callers turn
/// that into `ERR_INVALID_ARG`.
unsafe fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Runs `body`, converting any panic into [`ERR_PANIC`] instead of
/// letting it unwind into the caller's (possibly C++) frames.
fn guard(body: impl FnOnce() -> c_int + panic::UnwindSafe) -> c_int {
    match panic::catch_unwind(body) {
        Ok(code) => code,
        Err(_) => {
            tracing::error!("panic caught at the heimdall-cabi boundary");
            ERR_PANIC
        }
    }
}

/// Initializes the process-wide plugin context (§6 `onload`). Must be
/// called exactly once before any other entry point; calling it again
/// simply resets accumulated state, which is useful for test harnesses
/// that drive the ABI in-process.
#[no_mangle]
pub extern "C" fn onload() -> c_int {
    guard(|| {
        *CONTEXT.lock() = Some(PluginContext::default());
        OK
    })
}

/// Sets the output document family (`spdx`, `spdx-2.3`, `cyclonedx`,
/// `cyclonedx-1.6`, ...). §6 `set_format`.
#[no_mangle]
pub extern "C" fn set_format(format: *const c_char) -> c_int {
    guard(|| {
        let Some(format) = (unsafe { borrow_str(format) }) else {
            return ERR_INVALID_ARG;
        };
        let mut state = CONTEXT.lock();
        let Some(ctx) = state.as_mut() else {
            return ERR_NOT_LOADED;
        };
        ctx.format = format.to_string();
        OK
    })
}

/// Overrides the SPDX sub-version (`2.3`, `3.0`, `3.0.1`). §6
/// `set_spdx_version`.
#[no_mangle]
pub extern "C" fn set_spdx_version(version: *const c_char) -> c_int {
    guard(|| {
        let Some(version) = (unsafe { borrow_str(version) }) else {
            return ERR_INVALID_ARG;
        };
        let mut state = CONTEXT.lock();
        let Some(ctx) = state.as_mut() else {
            return ERR_NOT_LOADED;
        };
        ctx.spdx_version = Some(version.to_string());
        OK
    })
}

/// Overrides the CycloneDX sub-version (`1.4`, `1.5`, `1.6`). §6
/// `set_cyclonedx_version`.
#[no_mangle]
pub extern "C" fn set_cyclonedx_version(version: *const c_char) -> c_int {
    guard(|| {
        let Some(version) = (unsafe { borrow_str(version) }) else {
            return ERR_INVALID_ARG;
        };
        let mut state = CONTEXT.lock();
        let Some(ctx) = state.as_mut() else {
            return ERR_NOT_LOADED;
        };
        ctx.cyclonedx_version = Some(version.to_string());
        OK
    })
}

/// Sets the path `finalize` writes the document to. §6
/// `set_output_path`.
#[no_mangle]
pub extern "C" fn set_output_path(path: *const c_char) -> c_int {
    guard(|| {
        let Some(path) = (unsafe { borrow_str(path) }) else {
            return ERR_INVALID_ARG;
        };
        let mut state = CONTEXT.lock();
        let Some(ctx) = state.as_mut() else {
            return ERR_NOT_LOADED;
        };
        ctx.output_path = PathBuf::from(path);
        OK
    })
}

/// Enables or disables transitive dependency resolution. `enabled` is
/// `0` or `1`; any other value is an invalid argument. §6
/// `set_transitive_dependencies`.
#[no_mangle]
pub extern "C" fn set_transitive_dependencies(enabled: c_int) -> c_int {
    guard(|| {
        let mut state = CONTEXT.lock();
        let Some(ctx) = state.as_mut() else {
            return ERR_NOT_LOADED;
        };
        match enabled {
            0 => ctx.transitive_dependencies = false,
            1 => ctx.transitive_dependencies = true,
            _ => return ERR_INVALID_ARG,
        }
        let mut options = ctx.generator.options().clone();
        options.transitive_dependencies = ctx.transitive_dependencies;
        ctx.generator.configure(options);
        OK
    })
}

/// Processes one linker input file. Called once per input the linker
/// discovers; non-fatal per-input failures (§4.4 "Failure policy") are
/// recorded against that component rather than aborting the link, so
/// this only returns non-zero for an argument or context error, not a
/// malformed object.
#[no_mangle]
pub extern "C" fn process_input_file(path: *const c_char) -> c_int {
    guard(|| {
        let Some(path) = (unsafe { borrow_str(path) }) else {
            return ERR_INVALID_ARG;
        };
        let mut state = CONTEXT.lock();
        let Some(ctx) = state.as_mut() else {
            return ERR_NOT_LOADED;
        };
        match ctx.generator.process_path(path) {
            Ok(_) => OK,
            Err(err) => {
                tracing::warn!(path, error = %err, "failed to process linker input");
                ERR_PROCESSING
            }
        }
    })
}

/// Produces the SBOM document from every component seen so far and
/// writes it to the configured output path, then clears the context so
/// a second `onload` starts clean. §6 `finalize`.
#[no_mangle]
pub extern "C" fn finalize() -> c_int {
    guard(|| {
        let mut state = CONTEXT.lock();
        let Some(ctx) = state.take() else {
            return ERR_NOT_LOADED;
        };
        let format = ctx.handler_format();
        let metadata = heimdall::metadata_for_root(&ctx.output_path, chrono::Utc::now());
        let bytes = match ctx.generator.generate(&format, &metadata) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(format = %format, error = %err, "failed to generate SBOM document");
                return ERR_FINALIZE;
            }
        };
        if let Err(err) = heimdall::Generator::write_output(&ctx.output_path, &bytes) {
            tracing::error!(path = %ctx.output_path.display(), error = %err, "failed to write SBOM document");
            return ERR_FINALIZE;
        }
        OK
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

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
    fn full_plugin_lifecycle_writes_a_document() {
        assert_eq!(onload(), OK);

        let format = CString::new("cyclonedx-1.6").unwrap();
        assert_eq!(set_format(format.as_ptr()), OK);

        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("app");
        std::fs::write(&input_path, minimal_elf_executable()).unwrap();
        let output_path = dir.path().join("sbom.json");

        let input_c = CString::new(input_path.to_str().unwrap()).unwrap();
        let output_c = CString::new(output_path.to_str().unwrap()).unwrap();

        assert_eq!(set_output_path(output_c.as_ptr()), OK);
        assert_eq!(set_transitive_dependencies(0), OK);
        assert_eq!(process_input_file(input_c.as_ptr()), OK);
        assert_eq!(finalize(), OK);

        let contents = std::fs::read_to_string(&output_path).unwrap();
        assert!(contents.contains("CycloneDX"));
    }

    #[test]
    fn calls_before_onload_fail_without_panicking() {
        *CONTEXT.lock() = None;
        let format = CString::new("spdx").unwrap();
        assert_eq!(set_format(format.as_ptr()), ERR_NOT_LOADED);
    }

    #[test]
    fn null_pointer_is_an_invalid_argument_not_a_crash() {
        assert_eq!(onload(), OK);
        assert_eq!(set_format(std::ptr::null()), ERR_INVALID_ARG);
    }
}
