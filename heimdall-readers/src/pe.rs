//! PE/COFF reader, built on `goblin::pe::PE` (§4.1).

use goblin::pe::PE;

use heimdall_common::{SectionInfo, SymbolInfo};

use crate::base::{DebugInfoProbe, Dependency};

pub struct PeObject<'data> {
    inner: PE<'data>,
    data: &'data [u8],
}

impl<'data> PeObject<'data> {
    pub fn parse(data: &'data [u8]) -> Result<Self, goblin::error::Error> {
        Ok(PeObject {
            inner: PE::parse(data)?,
            data,
        })
    }

    /// The raw bytes this object was parsed from, used to compute its
    /// content checksum (§3 `checksums`, §4.4 dedup by content SHA-256).
    pub fn raw_data(&self) -> &'data [u8] {
        self.data
    }

    pub fn is_64(&self) -> bool {
        self.inner.is_64
    }

    pub fn is_lib(&self) -> bool {
        self.inner.header.coff_header.characteristics & 0x2000 != 0
    }

    pub fn arch(&self) -> &'static str {
        match self.inner.header.coff_header.machine {
            0x8664 => "x86_64",
            0x014c => "x86",
            0xaa64 => "aarch64",
            0x01c4 => "arm",
            _ => "unknown",
        }
    }

    pub fn sections(&self) -> Vec<SectionInfo> {
        self.inner
            .sections
            .iter()
            .map(|section| {
                let name = section.name().unwrap_or_default().to_string();
                SectionInfo {
                    name,
                    size: section.size_of_raw_data as u64,
                    flags: pe_section_flags(section.characteristics),
                }
            })
            .collect()
    }

    /// PE exports are the closest analogue to ELF/Mach-O symbol tables;
    /// imports are surfaced via [`PeObject::dependencies`] instead since
    /// they name DLLs rather than defined symbols.
    pub fn symbols(&self) -> Vec<SymbolInfo> {
        self.inner
            .exports
            .iter()
            .filter_map(|export| {
                let raw_name = export.name?;
                let name = heimdall_demangle::demangle_str(raw_name).into_owned();
                Some(SymbolInfo {
                    name,
                    size: export.size as u64,
                    binding: "global".to_string(),
                    visibility: "default".to_string(),
                    section: None,
                })
            })
            .collect()
    }

    /// The distinct set of DLLs named in the import table.
    pub fn dependencies(&self) -> Vec<Dependency> {
        let mut deps: Vec<Dependency> = self
            .inner
            .libraries
            .iter()
            .map(|lib| lib.to_string())
            .collect();
        deps.sort();
        deps.dedup();
        deps
    }

    pub fn probe_debug_info(&self) -> DebugInfoProbe {
        if let Some(debug_data) = &self.inner.debug_data {
            if let Some(codeview) = &debug_data.codeview_pdb70_debug_info {
                let name = codeview.filename.strip_suffix(b"\0").unwrap_or(codeview.filename);
                let path = String::from_utf8_lossy(name).into_owned();
                return DebugInfoProbe::External { path };
            }
        }
        DebugInfoProbe::None
    }

    /// Raw bytes of section `name` (e.g. `.debug$S`), used by
    /// `heimdall-dwarf`'s heuristic `.debug_line` scan (§4.2: "PE:
    /// heuristic only").
    pub fn section_data(&self, name: &str) -> Option<&'data [u8]> {
        for section in &self.inner.sections {
            if section.name().ok()? == name {
                let start = section.pointer_to_raw_data as usize;
                let end = start.checked_add(section.size_of_raw_data as usize)?;
                return self.data.get(start..end);
            }
        }
        None
    }
}

fn pe_section_flags(characteristics: u32) -> Vec<String> {
    const FLAGS: &[(u32, &str)] = &[
        (0x2000_0000, "EXECUTE"),
        (0x4000_0000, "READ"),
        (0x8000_0000, "WRITE"),
        (0x0000_0020, "CODE"),
    ];
    FLAGS
        .iter()
        .filter(|(bit, _)| characteristics & bit != 0)
        .map(|(_, name)| name.to_string())
        .collect()
}
