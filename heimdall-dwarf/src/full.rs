//! The full DWARF parser (§4.2 strategy 1), built on `gimli`.
//!
//! Only reachable for ELF objects (§4.2 platform matrix); Mach-O and PE
//! always take the heuristic path from [`crate::heuristic`].

use std::collections::BTreeSet;

use gimli::{EndianSlice, RunTimeEndian};

use crate::errors::DwarfError;

/// The result of a successful full-DWARF pass.
#[derive(Debug, Default, Clone)]
pub struct FullDwarfResult {
    pub source_files: BTreeSet<String>,
    pub compile_units: Vec<String>,
    pub functions: BTreeSet<String>,
}

type Slice<'d> = EndianSlice<'d, RunTimeEndian>;
type Reader<'d> = gimli::read::Dwarf<Slice<'d>>;

/// Parses `.debug_info`/`.debug_abbrev`/`.debug_str`/`.debug_line` (and
/// friends) via `section_data`, a callback returning the raw bytes of a
/// named section (the caller bridges this to `ObjectView::section_data`
/// without `heimdall-dwarf` depending on any one object format crate
/// directly beyond `heimdall-readers`).
pub fn extract<'d>(
    little_endian: bool,
    mut section_data: impl FnMut(&'static str) -> Option<&'d [u8]>,
) -> Result<FullDwarfResult, DwarfError> {
    let endian = if little_endian {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    };

    let has_debug_info = section_data(".debug_info").is_some();
    if !has_debug_info {
        return Err(DwarfError::NoDebugInfo);
    }

    let load = |id: gimli::SectionId| -> Result<Slice<'d>, gimli::Error> {
        let data = section_data(id.name()).unwrap_or(&[]);
        Ok(EndianSlice::new(data, endian))
    };

    let dwarf: Reader<'d> = gimli::Dwarf::load(load)?;

    let mut result = FullDwarfResult::default();
    let mut unit_headers = dwarf.units();
    while let Some(header) = unit_headers.next()? {
        let unit = dwarf.unit(header)?;
        parse_unit(&dwarf, &unit, &mut result)?;
    }

    if result.source_files.is_empty() && result.functions.is_empty() && result.compile_units.is_empty() {
        return Err(DwarfError::Corrupt(
            "debug_info present but no units/functions/files resolved".into(),
        ));
    }

    Ok(result)
}

fn resolve_string<'d>(
    dwarf: &Reader<'d>,
    unit: &gimli::Unit<Slice<'d>>,
    value: gimli::AttributeValue<Slice<'d>>,
) -> Option<String> {
    let r = dwarf.attr_string(unit, value).ok()?;
    r.to_string_lossy().ok().map(|s| s.into_owned())
}

fn parse_unit<'d>(
    dwarf: &Reader<'d>,
    unit: &gimli::Unit<Slice<'d>>,
    result: &mut FullDwarfResult,
) -> Result<(), DwarfError> {
    let mut entries = unit.entries();
    while let Some((_depth, entry)) = entries.next_dfs()? {
        match entry.tag() {
            gimli::DW_TAG_compile_unit => {
                if let Some(attr) = entry.attr_value(gimli::DW_AT_name)? {
                    if let Some(name) = resolve_string(dwarf, unit, attr) {
                        result.compile_units.push(name);
                    }
                }
            }
            gimli::DW_TAG_subprogram => {
                let name_attr = entry
                    .attr_value(gimli::DW_AT_linkage_name)?
                    .or(entry.attr_value(gimli::DW_AT_MIPS_linkage_name)?)
                    .or(entry.attr_value(gimli::DW_AT_name)?);
                if let Some(attr) = name_attr {
                    if let Some(raw) = resolve_string(dwarf, unit, attr) {
                        let demangled = heimdall_demangle::demangle_str(&raw).into_owned();
                        result.functions.insert(demangled);
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(program) = unit.line_program.clone() {
        let header = program.header();
        for file in header.file_names() {
            let Some(name) = resolve_string(dwarf, unit, file.path_name()) else {
                continue;
            };
            let dir = file
                .directory(header)
                .and_then(|d| resolve_string(dwarf, unit, d));
            let full = match dir {
                Some(dir) if !dir.is_empty() && !name.starts_with('/') => {
                    format!("{dir}/{name}")
                }
                _ => name,
            };
            result.source_files.insert(full);
        }
    }

    Ok(())
}
