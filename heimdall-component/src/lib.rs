//! The Component Model & Metadata Extractor (§4.4): orchestrates the
//! object readers, DWARF extractor and package-manager attributors into a
//! deduplicated, published set of [`heimdall_common::ComponentInfo`]
//! records.
//!
//! This crate owns no state of its own beyond one run's worth of
//! components — callers construct an [`Extractor`], feed it paths, and
//! read back [`Extractor::components`] when done.

#![warn(missing_docs)]
#![allow(missing_docs)]

pub mod extractor;
pub mod options;

pub use extractor::{ComponentId, Extractor};
pub use options::ExtractorOptions;
