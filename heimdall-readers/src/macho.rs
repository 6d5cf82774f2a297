//! Mach-O reader, built on `goblin::mach` (§4.1), including universal
//! ("fat") binaries which expand into one `MachOObject` per architecture
//! slice (§4.1 B3 "universal Mach-O splits into N components").

use goblin::mach::{Mach, MachO};

use heimdall_common::{SectionInfo, SymbolInfo};

use crate::base::{DebugInfoProbe, Dependency};

pub struct MachOObject<'data> {
    inner: MachO<'data>,
    data: &'data [u8],
}

/// Splits a Mach-O blob (thin or universal) into one slice per embedded
/// architecture. Thin binaries yield exactly one entry.
pub fn parse_slices(data: &[u8]) -> Result<Vec<MachOObject<'_>>, goblin::error::Error> {
    match Mach::parse(data)? {
        Mach::Binary(macho) => Ok(vec![MachOObject { inner: macho, data }]),
        Mach::Fat(fat) => {
            let mut out = Vec::new();
            for arch in fat.arches()? {
                let start = arch.offset as usize;
                let end = start + arch.size as usize;
                let Some(slice) = data.get(start..end) else {
                    continue;
                };
                if let Ok(macho) = MachO::parse(slice, 0) {
                    out.push(MachOObject { inner: macho, data: slice });
                }
            }
            Ok(out)
        }
    }
}

impl<'data> MachOObject<'data> {
    /// The raw bytes of this architecture slice, used to compute its
    /// content checksum (§3 `checksums`, §4.4 B3: each universal Mach-O
    /// slice gets a distinct `identity_key`, which requires hashing the
    /// slice rather than the whole fat binary).
    pub fn raw_data(&self) -> &'data [u8] {
        self.data
    }

    pub fn is_64(&self) -> bool {
        self.inner.is_64
    }

    pub fn arch(&self) -> &'static str {
        cpu_type_name(self.inner.header.cputype())
    }

    pub fn sections(&self) -> Vec<SectionInfo> {
        let mut out = Vec::new();
        for segment in &self.inner.segments {
            let segname = segment.name().unwrap_or("");
            for result in segment {
                let Ok((section, _data)) = result else {
                    break;
                };
                out.push(SectionInfo {
                    name: format!("{}.{}", segname, section.name().unwrap_or("")),
                    size: section.size,
                    flags: Vec::new(),
                });
            }
        }
        out
    }

    pub fn symbols(&self) -> Vec<SymbolInfo> {
        let Some(symbols) = self.inner.symbols.as_ref() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for entry in symbols.iter() {
            let Ok((raw_name, nlist)) = entry else {
                continue;
            };
            if raw_name.is_empty() || nlist.is_stab() {
                continue;
            }
            const N_EXT: u8 = 0x01;
            let name = heimdall_demangle::demangle_str(raw_name).into_owned();
            out.push(SymbolInfo {
                name,
                size: 0,
                binding: if nlist.n_type & N_EXT != 0 {
                    "global".to_string()
                } else {
                    "local".to_string()
                },
                visibility: "default".to_string(),
                section: None,
            });
        }
        out
    }

    /// `LC_LOAD_DYLIB` (and weak/reexport variants) entries.
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.inner.libs.iter().filter(|lib| **lib != "self").map(|lib| lib.to_string()).collect()
    }

    pub fn probe_debug_info(&self) -> DebugInfoProbe {
        let mut embedded = Vec::new();
        for segment in &self.inner.segments {
            let segname = segment.name().unwrap_or("");
            if segname == "__DWARF" {
                for result in segment {
                    let Ok((section, _data)) = result else {
                        break;
                    };
                    embedded.push(format!("__DWARF.{}", section.name().unwrap_or("")));
                }
            }
        }
        if embedded.is_empty() {
            DebugInfoProbe::None
        } else {
            DebugInfoProbe::Embedded { sections: embedded }
        }
    }

    /// Raw bytes of the `__DWARF,<name>` section (e.g. `__debug_info`),
    /// used by `heimdall-dwarf`'s heuristic `.debug_line` scan (§4.2:
    /// "Mach-O: heuristic only").
    pub fn section_data(&self, dwarf_name: &str) -> Option<&'data [u8]> {
        for segment in &self.inner.segments {
            if segment.name().unwrap_or("") != "__DWARF" {
                continue;
            }
            for result in segment {
                let Ok((section, data)) = result else {
                    break;
                };
                if section.name().unwrap_or("") == dwarf_name {
                    return Some(data);
                }
            }
        }
        None
    }
}

fn cpu_type_name(cputype: u32) -> &'static str {
    const CPU_TYPE_X86_64: u32 = 0x0100_0007;
    const CPU_TYPE_ARM64: u32 = 0x0100_000c;
    const CPU_TYPE_X86: u32 = 7;
    const CPU_TYPE_ARM: u32 = 12;
    match cputype {
        CPU_TYPE_X86_64 => "x86_64",
        CPU_TYPE_ARM64 => "arm64",
        CPU_TYPE_X86 => "x86",
        CPU_TYPE_ARM => "arm",
        _ => "unknown",
    }
}
