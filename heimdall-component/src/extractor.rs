//! The orchestrator: drives readers → DWARF → attributors for each input
//! path and publishes deduplicated [`ComponentInfo`] records (§4.4).

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use heimdall_common::{sha256_hex, ByteView, ComponentInfo, FileType, InputError};
use heimdall_readers::{FileFormat, ObjectView, ParsedEntry};

use crate::options::ExtractorOptions;

/// A stable handle to a published component, valid for the lifetime of
/// the [`Extractor`] that produced it (§4.4 `process_path` return type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(usize);

/// Standard system library directories consulted by [`is_system_path`] and
/// by transitive dependency resolution's runtime-loader approximation
/// (§4.4 `process_library`, step 6).
const SYSTEM_LIBRARY_DIRS: &[&str] = &[
    "/usr/lib",
    "/usr/lib64",
    "/usr/lib32",
    "/usr/lib/x86_64-linux-gnu",
    "/lib",
    "/lib64",
    "/lib32",
    "/usr/local/lib",
    "/System/Library",
    "/usr/libexec",
];

fn is_system_path(path: &str) -> bool {
    SYSTEM_LIBRARY_DIRS.iter().any(|prefix| path.starts_with(prefix))
}

fn classify_file_type(format: FileFormat, is_archive_member: bool, is_lib: bool) -> FileType {
    if is_archive_member {
        return FileType::ObjectFile;
    }
    match format {
        FileFormat::Elf | FileFormat::MachO | FileFormat::Pe => {
            if is_lib {
                FileType::SharedLibrary
            } else {
                FileType::Executable
            }
        }
        FileFormat::Archive => FileType::StaticArchive,
        FileFormat::Unknown => FileType::Unknown,
    }
}

/// Drives readers → DWARF → attributors for each input path and
/// publishes deduplicated [`ComponentInfo`] records (§4.4).
pub struct Extractor {
    options: ExtractorOptions,
    components: Vec<ComponentInfo>,
    /// Dedup index keyed by `(content SHA-256, file kind)` (§4.4 "Dedup"),
    /// deliberately not by path — two distinct paths with identical
    /// content and kind collapse into one component (S6).
    identity_index: HashMap<(String, FileType), usize>,
    /// Guards against symlink cycles during transitive dependency
    /// resolution; not part of the published model.
    resolving: HashSet<PathBuf>,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new(ExtractorOptions::default())
    }
}

impl Extractor {
    /// Creates an extractor configured with `options` (§4.4 `configure`).
    pub fn new(options: ExtractorOptions) -> Self {
        Extractor {
            options,
            components: Vec::new(),
            identity_index: HashMap::new(),
            resolving: HashSet::new(),
        }
    }

    /// Replaces the active options (§4.4 `configure`).
    pub fn configure(&mut self, options: ExtractorOptions) {
        self.options = options;
    }

    /// The options currently in effect.
    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// Read-only view of the published component set (§4.4 `components`).
    pub fn components(&self) -> &[ComponentInfo] {
        &self.components
    }

    /// Looks up a previously published component by its id.
    pub fn get(&self, id: ComponentId) -> &ComponentInfo {
        &self.components[id.0]
    }

    /// Processes a top-level input path (§4.4 `process_path`).
    pub fn process_path(&mut self, path: impl AsRef<Path>) -> Result<ComponentId, InputError> {
        self.process(path.as_ref(), false)
    }

    /// Processes a path known to be a library dependency, marking
    /// `is_system_library` when it resolves under a standard system
    /// prefix (§4.4 `process_library`).
    pub fn process_library(&mut self, path: impl AsRef<Path>) -> Result<ComponentId, InputError> {
        self.process(path.as_ref(), true)
    }

    fn process(&mut self, path: &Path, is_library_entry: bool) -> Result<ComponentId, InputError> {
        let normalized = heimdall_common::clean_path(&path.to_string_lossy()).into_owned();
        let is_system = is_library_entry && is_system_path(&normalized);

        let view = ByteView::open(path).map_err(|e| InputError::from_io(path, e))?;

        let entries = match heimdall_readers::parse_objects(&view, path) {
            Ok(entries) if !entries.is_empty() => entries,
            _ => {
                let id = self.publish_unrecognized(&normalized, view.as_slice(), is_system);
                return Ok(id);
            }
        };

        let mut first_id = None;
        for entry in entries {
            let id = match entry {
                ParsedEntry::Object(object_view) => {
                    self.publish_object(&normalized, &object_view, is_system)
                }
                ParsedEntry::Failed { member_name, error, data } => {
                    self.publish_failed_member(&normalized, &member_name, data, &error, is_system)
                }
            };
            first_id.get_or_insert(id);
        }

        if self.options.transitive_dependencies {
            if let Some(id) = first_id {
                self.resolve_dependencies(id, path);
            }
        }

        Ok(first_id.expect("at least one entry was produced for a non-empty parse"))
    }

    fn publish_object(&mut self, base_path: &str, view: &ObjectView<'_>, is_system: bool) -> ComponentId {
        let raw = view.raw_data();
        let sha256 = sha256_hex(raw);
        let file_type = classify_file_type(view.format(), view.member_name.is_some(), view.is_lib());

        let alias_path = match &view.member_name {
            Some(member) => format!("{base_path}({member})"),
            None => base_path.to_string(),
        };

        if let Some(&existing) = self.identity_index.get(&(sha256.clone(), file_type)) {
            self.components[existing].add_alias(&alias_path);
            return ComponentId(existing);
        }

        let name = match &view.member_name {
            Some(member) => member.clone(),
            None => component_name_from_path(base_path),
        };

        let mut component = ComponentInfo::new(name, alias_path);
        component.checksums = heimdall_common::hash_bytes(raw);
        component.file_type = file_type;
        component.file_size = raw.len() as u64;
        component.sections = view.sections().into_iter().collect();
        component.symbols = view.symbols().into_iter().collect();
        component.dependencies = dedup_preserve_order(view.dependencies());
        component.is_stripped = view.is_stripped();
        component.is_system_library = is_system;
        component.detected_by = self.options.detected_by.clone();
        component.properties.insert("arch".into(), view.arch().into());

        if self.options.extract_debug_info {
            let dwarf = heimdall_dwarf::extract(view);
            component.source_files = dwarf.source_files.into_iter().collect();
            component.compile_units = dwarf.compile_units.into_iter().collect::<BTreeSet<_>>();
            component.functions = dwarf.functions;
            component.contains_debug_info = dwarf.contains_debug_info;
        }

        let ctx = self.options.attributor_context();
        heimdall_attributors::run_attributors(&mut component, &ctx, raw);
        if component.processing_error.is_none() {
            if let Some(warnings) = component.properties.get("attribution.warnings").cloned() {
                component.record_error(warnings);
            }
        }

        component.derive_identity_key();
        component.mark_processed();

        let index = self.components.len();
        self.identity_index.insert((sha256, file_type), index);
        self.components.push(component);
        ComponentId(index)
    }

    fn publish_failed_member(
        &mut self,
        base_path: &str,
        member_name: &str,
        data: &[u8],
        error: &heimdall_readers::ObjectError,
        is_system: bool,
    ) -> ComponentId {
        let sha256 = sha256_hex(data);
        let file_type = FileType::ObjectFile;
        let alias_path = format!("{base_path}({member_name})");

        if let Some(&existing) = self.identity_index.get(&(sha256.clone(), file_type)) {
            self.components[existing].add_alias(&alias_path);
            return ComponentId(existing);
        }

        let mut component = ComponentInfo::new(member_name.to_string(), alias_path);
        component.checksums = heimdall_common::hash_bytes(data);
        component.file_type = file_type;
        component.file_size = data.len() as u64;
        component.is_system_library = is_system;
        component.detected_by = self.options.detected_by.clone();
        component.record_error(error.to_string());

        component.derive_identity_key();
        component.mark_processed();

        let index = self.components.len();
        self.identity_index.insert((sha256, file_type), index);
        self.components.push(component);
        ComponentId(index)
    }

    fn publish_unrecognized(&mut self, path: &str, data: &[u8], is_system: bool) -> ComponentId {
        let sha256 = sha256_hex(data);
        let file_type = FileType::Unknown;

        if let Some(&existing) = self.identity_index.get(&(sha256.clone(), file_type)) {
            self.components[existing].add_alias(path);
            return ComponentId(existing);
        }

        let mut component = ComponentInfo::new(component_name_from_path(path), path.to_string());
        component.checksums = heimdall_common::hash_bytes(data);
        component.file_type = file_type;
        component.file_size = data.len() as u64;
        component.is_system_library = is_system;
        component.detected_by = self.options.detected_by.clone();
        component.record_error("unrecognized object format");

        component.derive_identity_key();
        component.mark_processed();

        let index = self.components.len();
        self.identity_index.insert((sha256, file_type), index);
        self.components.push(component);
        ComponentId(index)
    }

    /// Resolves each dependency string of the published component `id`
    /// to a filesystem path and recurses, honoring
    /// `include_system_libraries` (§4.4 step 6, S3).
    fn resolve_dependencies(&mut self, id: ComponentId, origin_file: &Path) {
        let origin_dir = origin_file.parent().map(Path::to_path_buf);
        let deps = self.components[id.0].dependencies.clone();

        for dep in deps {
            let Some(resolved) = resolve_dependency_path(&dep, origin_dir.as_deref()) else {
                continue; // unresolved: stays a bare string (I4)
            };
            let resolved_str = resolved.to_string_lossy().into_owned();
            if is_system_path(&resolved_str) && !self.options.include_system_libraries {
                continue;
            }
            if !self.resolving.insert(resolved.clone()) {
                continue; // already being resolved somewhere up the call stack
            }
            if let Err(err) = self.process_library(&resolved) {
                tracing::debug!(dep = %dep, %err, "failed to process resolved dependency");
            }
            self.resolving.remove(&resolved);
        }
    }
}

fn resolve_dependency_path(dep: &str, origin_dir: Option<&Path>) -> Option<PathBuf> {
    if dep.starts_with('/') {
        return Path::new(dep).is_file().then(|| PathBuf::from(dep));
    }
    if let Some(dir) = origin_dir {
        let candidate = dir.join(dep);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    SYSTEM_LIBRARY_DIRS.iter().map(|prefix| Path::new(prefix).join(dep)).find(|p| p.is_file())
}

fn component_name_from_path(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn dedup_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_elf_executable() -> Vec<u8> {
        let mut buf = vec![0u8; 64];
        buf[0..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
        buf[4] = 2; // ELFCLASS64
        buf[5] = 1; // ELFDATA2LSB
        buf[6] = 1; // EV_CURRENT
        buf[16..18].copy_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        buf[18..20].copy_from_slice(&0x3eu16.to_le_bytes()); // EM_X86_64
        buf[20..24].copy_from_slice(&1u32.to_le_bytes());
        buf
    }

    #[test]
    fn unrecognized_file_still_publishes_a_component() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"just text, not an object file").unwrap();

        let mut extractor = Extractor::default();
        let id = extractor.process_path(&path).unwrap();
        let component = extractor.get(id);
        assert_eq!(component.file_type, FileType::Unknown);
        assert!(component.was_processed);
        assert!(component.processing_error.is_some());
        assert!(component.checksums.contains_key(&heimdall_common::ChecksumAlgorithm::Sha256));
    }

    #[test]
    fn identical_files_at_different_paths_dedup_with_alias() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("app");
        let b = dir.path().join("app_copy");
        let bytes = minimal_elf_executable();
        std::fs::write(&a, &bytes).unwrap();
        std::fs::write(&b, &bytes).unwrap();

        let mut extractor = Extractor::default();
        let id_a = extractor.process_path(&a).unwrap();
        let id_b = extractor.process_path(&b).unwrap();
        assert_eq!(id_a, id_b);
        assert_eq!(extractor.components().len(), 1);
        let component = extractor.get(id_a);
        let aliases = component.properties.get("aliases").cloned().unwrap_or_default();
        assert!(aliases.contains(&b.to_string_lossy().to_string()));
    }

    #[test]
    fn process_library_under_system_prefix_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        // Simulate a system path by writing under a directory matching
        // one of the well-known prefixes is impractical in a sandbox, so
        // this only exercises the non-system branch; the prefix-matching
        // logic itself is covered by `is_system_path` directly.
        let path = dir.path().join("libfoo.so");
        std::fs::File::create(&path).unwrap().write_all(&minimal_elf_executable()).unwrap();

        let mut extractor = Extractor::default();
        let id = extractor.process_library(&path).unwrap();
        assert!(!extractor.get(id).is_system_library);
    }

    #[test]
    fn is_system_path_matches_known_prefixes() {
        assert!(is_system_path("/usr/lib/libc.so.6"));
        assert!(is_system_path("/lib64/ld-linux-x86-64.so.2"));
        assert!(!is_system_path("/home/user/myapp"));
    }
}
