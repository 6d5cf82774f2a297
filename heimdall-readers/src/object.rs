//! Format dispatch: turns a byte buffer into one or more [`ObjectView`]s
//! (§4.1). A buffer expands into more than one view exactly when it is a
//! static archive (one view per member) or a universal Mach-O (one view
//! per architecture slice); every other format yields exactly one.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use heimdall_common::{ByteView, SectionInfo, SymbolInfo};

use crate::archive;
use crate::base::{DebugInfoProbe, Dependency, FileFormat};
use crate::elf::ElfObject;
use crate::errors::ObjectError;
use crate::macho::{self, MachOObject};
use crate::pe::PeObject;

enum Kind<'data> {
    Elf(ElfObject<'data>),
    MachO(MachOObject<'data>),
    Pe(PeObject<'data>),
}

/// One parsed binary object: a whole ELF/PE file, one slice of a
/// universal Mach-O, or one member of a static archive.
pub struct ObjectView<'data> {
    format: FileFormat,
    /// `None` for a top-level file, `Some(member name)` inside an archive.
    pub member_name: Option<String>,
    kind: Kind<'data>,
}

impl<'data> ObjectView<'data> {
    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn arch(&self) -> &'static str {
        match &self.kind {
            Kind::Elf(elf) => elf.arch(),
            Kind::MachO(macho) => macho.arch(),
            Kind::Pe(pe) => pe.arch(),
        }
    }

    pub fn is_64(&self) -> bool {
        match &self.kind {
            Kind::Elf(elf) => elf.is_64(),
            Kind::MachO(macho) => macho.is_64(),
            Kind::Pe(pe) => pe.is_64(),
        }
    }

    pub fn is_lib(&self) -> bool {
        match &self.kind {
            Kind::Elf(elf) => elf.is_lib(),
            Kind::MachO(_) => false,
            Kind::Pe(pe) => pe.is_lib(),
        }
    }

    pub fn sections(&self) -> Vec<SectionInfo> {
        match &self.kind {
            Kind::Elf(elf) => elf.sections(),
            Kind::MachO(macho) => macho.sections(),
            Kind::Pe(pe) => pe.sections(),
        }
    }

    pub fn symbols(&self) -> Vec<SymbolInfo> {
        match &self.kind {
            Kind::Elf(elf) => elf.symbols(),
            Kind::MachO(macho) => macho.symbols(),
            Kind::Pe(pe) => pe.symbols(),
        }
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        match &self.kind {
            Kind::Elf(elf) => elf.dependencies(),
            Kind::MachO(macho) => macho.dependencies(),
            Kind::Pe(pe) => pe.dependencies(),
        }
    }

    pub fn probe_debug_info(&self) -> DebugInfoProbe {
        match &self.kind {
            Kind::Elf(elf) => elf.probe_debug_info(),
            Kind::MachO(macho) => macho.probe_debug_info(),
            Kind::Pe(pe) => pe.probe_debug_info(),
        }
    }

    pub fn is_stripped(&self) -> bool {
        match &self.kind {
            Kind::Elf(elf) => elf.is_stripped(),
            _ => matches!(self.probe_debug_info(), DebugInfoProbe::None),
        }
    }

    /// `true` for little-endian ELF; `false` for big-endian ELF or any
    /// non-ELF format (Mach-O/PE DWARF extraction is heuristic-only and
    /// never needs endianness, §4.2).
    pub fn is_little_endian(&self) -> bool {
        match &self.kind {
            Kind::Elf(elf) => elf.is_little_endian(),
            _ => true,
        }
    }

    /// Raw bytes of a named section, when this format and member retain
    /// them (§4.2 DWARF extraction reads `.debug_*`/`__debug_*` sections
    /// through this, rather than re-parsing the file).
    pub fn section_data(&self, name: &str) -> Option<Cow<'data, [u8]>> {
        match &self.kind {
            Kind::Elf(elf) => elf.section_data(name),
            Kind::MachO(macho) => macho.section_data(name).map(Cow::Borrowed),
            Kind::Pe(pe) => pe.section_data(name).map(Cow::Borrowed),
        }
    }

    /// The raw bytes this object/slice/member was parsed from (§4.4
    /// dedup/checksum by content, B3 per-slice identity).
    pub fn raw_data(&self) -> &'data [u8] {
        match &self.kind {
            Kind::Elf(elf) => elf.raw_data(),
            Kind::MachO(macho) => macho.raw_data(),
            Kind::Pe(pe) => pe.raw_data(),
        }
    }
}

/// One slot produced while parsing a (possibly archive) input: either a
/// successfully parsed object, or a named member that failed to parse as
/// an object (§4.4 B4: "an archive with one unreadable member still
/// publishes the readable members and the failing member with
/// `processing_error` set").
///
/// Non-object archive members (symbol tables, string tables, plain text
/// files accidentally bundled into an `.a`) are silently dropped rather
/// than reported as failures — they were never meant to be components.
pub enum ParsedEntry<'data> {
    Object(ObjectView<'data>),
    Failed {
        member_name: String,
        error: ObjectError,
        data: &'data [u8],
    },
}

/// Parses a buffer into one or more object views, recursing into static
/// archive members and universal Mach-O slices.
///
/// `path` is used only for error messages; it need not exist on disk (the
/// caller may be re-parsing an in-memory archive member).
pub fn parse_objects<'data>(
    data: &'data [u8],
    path: &Path,
) -> Result<Vec<ParsedEntry<'data>>, ObjectError> {
    parse_with_member(data, path, None)
}

fn parse_with_member<'data>(
    data: &'data [u8],
    path: &Path,
    member_name: Option<String>,
) -> Result<Vec<ParsedEntry<'data>>, ObjectError> {
    // `goblin::Object::parse` does the magic-byte sniffing for us; we
    // re-parse the same bytes through the format-specific reader below so
    // each `Kind` owns a type built for its own accessors.
    let peeked = goblin::Object::parse(data).map_err(|_| ObjectError::UnknownFormat {
        path: path.to_path_buf(),
    })?;

    match peeked {
        goblin::Object::Elf(_) => {
            let elf = ElfObject::parse(data)
                .map_err(|e| ObjectError::malformed(path.to_path_buf(), "elf", e))?;
            Ok(vec![ParsedEntry::Object(ObjectView {
                format: FileFormat::Elf,
                member_name,
                kind: Kind::Elf(elf),
            })])
        }
        goblin::Object::Mach(_) => {
            let slices = macho::parse_slices(data)
                .map_err(|e| ObjectError::malformed(path.to_path_buf(), "macho", e))?;
            Ok(slices
                .into_iter()
                .map(|macho| {
                    ParsedEntry::Object(ObjectView {
                        format: FileFormat::MachO,
                        member_name: member_name.clone(),
                        kind: Kind::MachO(macho),
                    })
                })
                .collect())
        }
        goblin::Object::PE(_) => {
            let pe = PeObject::parse(data)
                .map_err(|e| ObjectError::malformed(path.to_path_buf(), "pe", e))?;
            Ok(vec![ParsedEntry::Object(ObjectView {
                format: FileFormat::Pe,
                member_name,
                kind: Kind::Pe(pe),
            })])
        }
        goblin::Object::Archive(_) => {
            let members = archive::iter_members(data)
                .map_err(|e| ObjectError::malformed(path.to_path_buf(), "archive", e))?;
            let mut out = Vec::new();
            for member in members {
                match parse_with_member(member.data, path, Some(member.name.clone())) {
                    Ok(entries) => out.extend(entries),
                    Err(error) => out.push(ParsedEntry::Failed {
                        member_name: member.name,
                        error,
                        data: member.data,
                    }),
                }
            }
            Ok(out)
        }
        goblin::Object::Unknown(_) => Err(ObjectError::UnknownFormat {
            path: path.to_path_buf(),
        }),
        _ => Err(ObjectError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Reads a path from disk via [`ByteView`] and parses it (§4.1 `open`).
pub fn open(path: impl AsRef<Path>) -> Result<(ByteView<'static>, PathBuf), ObjectError> {
    let path = path.as_ref().to_path_buf();
    let view = ByteView::open(&path)?;
    Ok((view, path))
}
