//! Mangled-name primitives shared between the object readers and the
//! demangler.

use std::borrow::Cow;
use std::fmt;

/// The source language a mangled symbol name was produced by.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Default)]
#[non_exhaustive]
pub enum Language {
    #[default]
    Unknown,
    C,
    Cpp,
    Rust,
    Swift,
    ObjC,
    ObjCpp,
    Ada,
}

impl Language {
    /// A lowercase, parser-friendly name.
    pub fn name(self) -> &'static str {
        match self {
            Language::Unknown => "unknown",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Rust => "rust",
            Language::Swift => "swift",
            Language::ObjC => "objc",
            Language::ObjCpp => "objcpp",
            Language::Ada => "ada",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = match *self {
            Language::Unknown => "unknown",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Rust => "Rust",
            Language::Swift => "Swift",
            Language::ObjC => "Objective-C",
            Language::ObjCpp => "Objective-C++",
            Language::Ada => "Ada",
        };
        f.write_str(formatted)
    }
}

/// Whether a [`Name`] still carries its mangled form or has already been
/// demangled.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NameMangling {
    Mangled,
    Unmangled,
    Unknown,
}

/// A symbol name together with what is known about its mangling and
/// language.
///
/// Readers always preserve the raw, possibly-mangled form (§4.1
/// `iter_symbols`: "preserve mangled form as `raw_name`") and attach a best
/// guess at the language so the demangler does not need to re-sniff it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Name<'a> {
    string: Cow<'a, str>,
    lang: Language,
    mangling: NameMangling,
}

impl<'a> Name<'a> {
    pub fn new<S: Into<Cow<'a, str>>>(string: S, mangling: NameMangling, lang: Language) -> Self {
        Name {
            string: string.into(),
            lang,
            mangling,
        }
    }

    /// The raw string, mangled or not.
    pub fn as_str(&self) -> &str {
        &self.string
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    pub fn mangling(&self) -> NameMangling {
        self.mangling
    }
}

impl<'a> From<&'a str> for Name<'a> {
    fn from(s: &'a str) -> Self {
        Name::new(s, NameMangling::Unknown, Language::Unknown)
    }
}

impl From<String> for Name<'static> {
    fn from(s: String) -> Self {
        Name::new(s, NameMangling::Unknown, Language::Unknown)
    }
}

impl fmt::Display for Name<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string)
    }
}
