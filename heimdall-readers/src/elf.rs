//! ELF reader, built on `goblin::elf::Elf` (§4.1).

use std::borrow::Cow;

use goblin::elf::{sym::STB_WEAK, Elf};

use heimdall_common::{SectionInfo, SymbolInfo};

use crate::base::{DebugInfoProbe, Dependency};

/// A parsed ELF object, borrowing from the original byte buffer.
pub struct ElfObject<'data> {
    inner: Elf<'data>,
    data: &'data [u8],
}

fn elf_bind_name(info: u8) -> &'static str {
    match info >> 4 {
        0 => "local",
        1 => "global",
        STB_WEAK => "weak",
        _ => "other",
    }
}

fn elf_visibility_name(other: u8) -> &'static str {
    match other & 0x3 {
        0 => "default",
        1 => "internal",
        2 => "hidden",
        3 => "protected",
        _ => "default",
    }
}

impl<'data> ElfObject<'data> {
    pub fn parse(data: &'data [u8]) -> Result<Self, goblin::error::Error> {
        Ok(ElfObject {
            inner: Elf::parse(data)?,
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
        self.inner.is_lib
    }

    pub fn is_little_endian(&self) -> bool {
        self.inner.little_endian
    }

    pub fn arch(&self) -> &'static str {
        goblin_machine_name(self.inner.header.e_machine)
    }

    pub fn sections(&self) -> Vec<SectionInfo> {
        self.inner
            .section_headers
            .iter()
            .filter_map(|shdr| {
                let name = self.inner.shdr_strtab.get_at(shdr.sh_name)?;
                if name.is_empty() {
                    return None;
                }
                Some(SectionInfo {
                    name: name.to_string(),
                    size: shdr.sh_size,
                    flags: elf_section_flags(shdr.sh_flags),
                })
            })
            .collect()
    }

    pub fn symbols(&self) -> Vec<SymbolInfo> {
        let mut out = Vec::new();
        for table in [&self.inner.syms, &self.inner.dynsyms] {
            for sym in table.iter() {
                if sym.st_name == 0 || sym.st_value == 0 && sym.st_shndx == 0 {
                    continue;
                }
                let Some(raw_name) = self.inner.strtab.get_at(sym.st_name) else {
                    continue;
                };
                let name = heimdall_demangle::demangle_str(raw_name).into_owned();
                let section = if sym.st_shndx == 0 {
                    None
                } else {
                    self.inner
                        .section_headers
                        .get(sym.st_shndx)
                        .and_then(|shdr| self.inner.shdr_strtab.get_at(shdr.sh_name))
                        .map(str::to_string)
                };
                out.push(SymbolInfo {
                    name,
                    size: sym.st_size,
                    binding: elf_bind_name(sym.st_info).to_string(),
                    visibility: elf_visibility_name(sym.st_other).to_string(),
                    section,
                });
            }
        }
        out
    }

    /// ELF `DT_NEEDED` entries, already resolved to strings by `goblin`.
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.inner
            .libraries
            .iter()
            .map(|lib| lib.to_string())
            .collect()
    }

    pub fn probe_debug_info(&self) -> DebugInfoProbe {
        let mut embedded = Vec::new();
        let mut debuglink = None;

        for shdr in self.inner.section_headers.iter() {
            let Some(name) = self.inner.shdr_strtab.get_at(shdr.sh_name) else {
                continue;
            };
            if name.starts_with(".debug_") || name == ".zdebug_info" {
                embedded.push(name.to_string());
            } else if name == ".gnu_debuglink" {
                debuglink = Some(name.to_string());
            }
        }

        if !embedded.is_empty() {
            DebugInfoProbe::Embedded { sections: embedded }
        } else if let Some(link) = debuglink {
            DebugInfoProbe::External { path: link }
        } else {
            DebugInfoProbe::None
        }
    }

    pub fn is_stripped(&self) -> bool {
        matches!(self.probe_debug_info(), DebugInfoProbe::None) && self.inner.syms.is_empty()
    }

    /// Raw bytes of section `name` (e.g. `.debug_info`), transparently
    /// decompressing GNU-style `ZLIB`-prefixed or ELF `SHF_COMPRESSED`
    /// sections. Used by `heimdall-dwarf` to feed `gimli` without this
    /// crate depending on `gimli` itself.
    pub fn section_data(&self, name: &str) -> Option<Cow<'data, [u8]>> {
        use goblin::elf::{compression_header::ELFCOMPRESS_ZLIB, section_header::SHF_COMPRESSED};

        for shdr in self.inner.section_headers.iter() {
            let shdr_name = self.inner.shdr_strtab.get_at(shdr.sh_name)?;
            if shdr_name != name {
                continue;
            }
            if shdr.sh_type == goblin::elf::section_header::SHT_NOBITS {
                return None;
            }
            let start = shdr.sh_offset as usize;
            let end = start.checked_add(shdr.sh_size as usize)?;
            let raw = self.data.get(start..end)?;

            if raw.starts_with(b"ZLIB") && raw.len() >= 12 {
                let mut size_bytes = [0u8; 8];
                size_bytes.copy_from_slice(&raw[4..12]);
                let size = u64::from_be_bytes(size_bytes) as usize;
                return decompress_zlib(&raw[12..], size).map(Cow::Owned);
            }

            if shdr.sh_flags & SHF_COMPRESSED as u64 != 0 {
                let ctx = goblin::container::Ctx::new(
                    self.inner.header.container().ok()?,
                    self.inner.header.endianness().ok()?,
                );
                use scroll::Pread;
                let compression: goblin::elf::compression_header::CompressionHeader =
                    raw.pread_with(0, ctx).ok()?;
                if compression.ch_type != ELFCOMPRESS_ZLIB {
                    return None;
                }
                let header_size = goblin::elf::compression_header::CompressionHeader::size(ctx);
                let compressed = raw.get(header_size..)?;
                return decompress_zlib(compressed, compression.ch_size as usize).map(Cow::Owned);
            }

            return Some(Cow::Borrowed(raw));
        }
        None
    }
}

fn decompress_zlib(compressed: &[u8], expected_size: usize) -> Option<Vec<u8>> {
    use flate2::{Decompress, FlushDecompress};
    let mut out = Vec::with_capacity(expected_size);
    Decompress::new(true)
        .decompress_vec(compressed, &mut out, FlushDecompress::Finish)
        .ok()?;
    Some(out)
}

fn elf_section_flags(flags: u64) -> Vec<String> {
    const FLAGS: &[(u64, &str)] = &[
        (0x1, "WRITE"),
        (0x2, "ALLOC"),
        (0x4, "EXECINSTR"),
        (0x10, "MERGE"),
        (0x20, "STRINGS"),
        (0x200, "GROUP"),
        (0x400, "TLS"),
    ];
    FLAGS
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| name.to_string())
        .collect()
}

fn goblin_machine_name(machine: u16) -> &'static str {
    use goblin::elf::header;
    match machine {
        header::EM_X86_64 => "x86_64",
        header::EM_386 => "x86",
        header::EM_AARCH64 => "aarch64",
        header::EM_ARM => "arm",
        header::EM_RISCV => "riscv",
        header::EM_PPC64 => "ppc64",
        header::EM_PPC => "ppc",
        header::EM_MIPS => "mips",
        _ => "unknown",
    }
}
