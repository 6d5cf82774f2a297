//! Demangles symbol names recovered by `heimdall-readers`.
//!
//! Currently supported languages are C++ (Itanium and MSVC mangling) and
//! Rust (`legacy` and `v0`). Ada and Swift mangled names are deliberately
//! left unchanged (§4.1: "Ada/Swift mangling unchanged") — GNAT symbol
//! names are already human-readable `package__function` identifiers once
//! the Ada attributor runs, and Swift is out of scope for a binary-level
//! SBOM tool with no Swift runtime dependency.
//!
//! # Examples
//!
//! ```
//! use heimdall_common::{Language, Name, NameMangling};
//! use heimdall_demangle::Demangle;
//!
//! let name = Name::new("_ZN3foo3barEv", NameMangling::Mangled, Language::Unknown);
//! assert_eq!(name.detect_language(), Language::Cpp);
//! assert_eq!(name.try_demangle(), "foo::bar");
//! ```

#![warn(missing_docs)]
#![allow(missing_docs)]

use std::borrow::Cow;

use heimdall_common::{Language, Name};

fn is_maybe_cpp(ident: &str) -> bool {
    ident.starts_with("_Z")
        || ident.starts_with("__Z")
        || ident.starts_with("___Z")
        || ident.starts_with("____Z")
}

fn is_maybe_msvc(ident: &str) -> bool {
    ident.starts_with('?') || ident.starts_with("@?")
}

fn try_demangle_msvc(ident: &str) -> Option<String> {
    use msvc_demangler::DemangleFlags as MsvcFlags;

    let flags = MsvcFlags::COMPLETE
        | MsvcFlags::SPACE_AFTER_COMMA
        | MsvcFlags::HUG_TYPE
        | MsvcFlags::NO_MS_KEYWORDS
        | MsvcFlags::NO_CLASS_TYPE;

    msvc_demangler::demangle(ident, flags).ok()
}

struct BoundedString {
    str: String,
    bound: usize,
}

impl BoundedString {
    fn new(bound: usize) -> Self {
        Self {
            str: String::new(),
            bound,
        }
    }

    fn into_inner(self) -> String {
        self.str
    }
}

impl std::fmt::Write for BoundedString {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        if self.str.len().saturating_add(s.len()) > self.bound {
            return Err(std::fmt::Error);
        }
        self.str.write_str(s)
    }
}

fn try_demangle_cpp(ident: &str) -> Option<String> {
    if is_maybe_msvc(ident) {
        return try_demangle_msvc(ident);
    }

    if !is_maybe_cpp(ident) {
        return None;
    }

    use cpp_demangle::{DemangleOptions as CppOptions, ParseOptions, Symbol as CppSymbol};

    let parse_options = ParseOptions::default().recursion_limit(160);
    let symbol = CppSymbol::new_with_options(ident, &parse_options).ok()?;

    let cpp_options = CppOptions::new();
    // Bound the output: a pathological number of template substitutions
    // could otherwise blow up into megabytes of text ("billion laughs").
    let mut buf = BoundedString::new(4096);
    symbol
        .structured_demangle(&mut buf, &cpp_options)
        .ok()
        .map(|_| buf.into_inner())
}

fn try_demangle_rust(ident: &str) -> Option<String> {
    match rustc_demangle::try_demangle(ident) {
        Ok(demangled) => Some(format!("{demangled:#}")),
        Err(_) => None,
    }
}

/// An extension trait on [`Name`] for demangling symbol names.
pub trait Demangle {
    /// Infers the language of a mangled name.
    ///
    /// Returns `Language::Unknown` when the symbol is not obviously
    /// mangled, or the language carried explicitly on the `Name`, if any.
    fn detect_language(&self) -> Language;

    /// Demangles the name. Returns `None` if the language cannot be
    /// detected, is unsupported, or demangling fails.
    fn demangle(&self) -> Option<String>;

    /// Demangles the name and falls back to the original (mangled) string
    /// on failure — the policy used throughout the extraction pipeline
    /// (§4.1: "on failure keep mangled name").
    fn try_demangle(&self) -> Cow<'_, str>;
}

impl Demangle for Name<'_> {
    fn detect_language(&self) -> Language {
        if self.language() != Language::Unknown {
            return self.language();
        }

        if try_demangle_rust(self.as_str()).is_some() {
            return Language::Rust;
        }

        if is_maybe_cpp(self.as_str()) || is_maybe_msvc(self.as_str()) {
            return Language::Cpp;
        }

        Language::Unknown
    }

    fn demangle(&self) -> Option<String> {
        match self.detect_language() {
            Language::Cpp => try_demangle_cpp(self.as_str()),
            Language::Rust => try_demangle_rust(self.as_str()),
            _ => None,
        }
    }

    fn try_demangle(&self) -> Cow<'_, str> {
        match self.demangle() {
            Some(demangled) => Cow::Owned(demangled),
            None => Cow::Borrowed(self.as_str()),
        }
    }
}

/// Demangles a raw (not yet wrapped in [`Name`]) symbol string, falling
/// back to the input on failure. Convenience used by the object readers
/// when building [`heimdall_common::SymbolInfo`] and by the DWARF/symbol
/// function-name fallback (§4.2).
pub fn demangle_str(raw: &str) -> Cow<'_, str> {
    Name::from(raw).try_demangle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use heimdall_common::NameMangling;

    #[test]
    fn detects_and_demangles_cpp() {
        let name = Name::new("_ZN3foo3barEv", NameMangling::Mangled, Language::Unknown);
        assert_eq!(name.detect_language(), Language::Cpp);
        assert_eq!(name.try_demangle(), "foo::bar");
    }

    #[test]
    fn unrecognized_symbol_passes_through() {
        assert_eq!(demangle_str("main"), "main");
    }

    #[test]
    fn ada_style_names_pass_through_unchanged() {
        // Ada mangling ("package__function") is intentionally not touched.
        assert_eq!(demangle_str("data_reader__read"), "data_reader__read");
    }
}
