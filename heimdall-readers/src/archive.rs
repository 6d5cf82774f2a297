//! `ar` static archive reader, built on `goblin::archive::Archive` (§4.1
//! "Archives expand into one component per member").

use goblin::archive::Archive;

/// One named member of a static archive, with its raw bytes borrowed from
/// the archive's backing buffer.
pub struct ArchiveMember<'data> {
    pub name: String,
    pub data: &'data [u8],
}

pub fn iter_members<'data>(
    data: &'data [u8],
) -> Result<Vec<ArchiveMember<'data>>, goblin::error::Error> {
    let archive = Archive::parse(data)?;
    let mut out = Vec::new();
    for (name, _header, _offset) in archive.summarize() {
        // Linker metadata members carry no object data and are not
        // separate components.
        if name == "/" || name == "//" || name.is_empty() {
            continue;
        }
        let member_data = archive.extract(name, data)?;
        out.push(ArchiveMember {
            name: name.to_string(),
            data: member_data,
        });
    }
    Ok(out)
}
