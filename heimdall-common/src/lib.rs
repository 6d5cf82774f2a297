//! Common types and utilities shared by every `heimdall` crate: the
//! component data model (§3), byte access, path normalization, and
//! streaming checksums.
//!
//! Small and dependency-light by design: every other crate in the
//! workspace imports this one.

#![warn(missing_docs)]
#![allow(missing_docs)]

pub mod byteview;
pub mod checksum;
pub mod component;
pub mod errors;
pub mod ident;
pub mod path;

pub use byteview::ByteView;
pub use checksum::{hash_bytes, hash_reader, sha1_hex, sha256_hex, ChecksumAlgorithm, ChecksumMap};
pub use component::{ComponentInfo, FileType, PackageManager, SectionInfo, SymbolInfo};
pub use errors::{ConfigError, InputError};
pub use ident::{Language, Name, NameMangling};
pub use path::{clean_path, sanitize_identifier};
