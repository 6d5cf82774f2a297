//! Ada `.ali` (Library Information) probe (§4.3 step 3).
//!
//! GNAT emits one `.ali` file per compiled unit alongside its object file.
//! A linked Ada binary typically pulls in several of them (the main
//! subprogram plus every unit it `with`s), so the probe scans every `.ali`
//! file reachable from the configured search paths and merges their
//! records onto the one component being attributed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use heimdall_common::ComponentInfo;

use crate::context::AttributorContext;
use crate::ProbeOutcome;

/// One source-file record from a `D` line.
#[derive(Debug, Clone)]
pub struct AliSourceRecord {
    pub path: String,
    pub timestamp: String,
    pub checksum: String,
    pub unit_name: String,
}

/// The parsed content of a single `.ali` file.
#[derive(Debug, Clone, Default)]
pub struct AliFile {
    pub compiler_version: Option<String>,
    pub security_flags: Vec<String>,
    pub with_deps: Vec<String>,
    pub runtime_deps: Vec<String>,
    pub sources: Vec<AliSourceRecord>,
    pub xrefs: Vec<String>,
    pub call_graph: Vec<String>,
}

/// Strips GNAT's unit-kind suffix (`%s` spec, `%b` body) from a with-clause
/// token, e.g. `data_reader%s` -> `data_reader`.
fn strip_unit_suffix(token: &str) -> &str {
    token
        .strip_suffix("%s")
        .or_else(|| token.strip_suffix("%b"))
        .unwrap_or(token)
}

/// Parses one `with`/`Z` dependency line: `package%s src.adb src.ali`.
fn parse_dep_line(rest: &str) -> Option<String> {
    let pkg = rest.split_whitespace().next()?;
    Some(strip_unit_suffix(pkg).to_string())
}

/// Parses one `D` source-file line:
/// `src.ads YYYYMMDDHHMMSS CRC pkgname%s`.
fn parse_d_line(rest: &str) -> Option<AliSourceRecord> {
    let mut parts = rest.split_whitespace();
    let path = parts.next()?.to_string();
    let timestamp = parts.next()?.to_string();
    let checksum = parts.next()?.to_string();
    let unit_name = parts.next().map(strip_unit_suffix).unwrap_or("").to_string();
    Some(AliSourceRecord {
        path,
        timestamp,
        checksum,
        unit_name,
    })
}

/// Parses the text of one `.ali` file (§4.3: `V`/`RV`/`W`/`Z`/`D`/`X`/`G`
/// record kinds).
pub fn parse_ali_text(text: &str, enhanced: bool) -> AliFile {
    let mut file = AliFile::default();

    for line in text.lines() {
        let line = line.trim_end();
        let Some((tag, rest)) = line.split_once(' ') else {
            continue;
        };
        let rest = rest.trim();

        match tag {
            "V" => file.compiler_version = Some(rest.trim_matches('"').to_string()),
            "RV" => file.security_flags.push(rest.to_string()),
            "W" => {
                if let Some(pkg) = parse_dep_line(rest) {
                    file.with_deps.push(pkg);
                }
            }
            "Z" => {
                if let Some(pkg) = parse_dep_line(rest) {
                    file.runtime_deps.push(pkg);
                }
            }
            "D" => {
                if let Some(rec) = parse_d_line(rest) {
                    file.sources.push(rec);
                }
            }
            "X" if enhanced => file.xrefs.push(rest.to_string()),
            "G" if enhanced => file.call_graph.push(rest.to_string()),
            _ => {}
        }
    }

    file
}

/// Finds every `*.ali` file under the configured search paths plus the
/// directory containing the component's own file (§4.3: "`.ali` files are
/// discovered in a caller-specified search path").
fn discover_ali_files(component_path: &Path, ctx: &AttributorContext) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = ctx.ali_search_paths.clone();
    if let Some(parent) = Path::new(component_path).parent() {
        roots.push(parent.to_path_buf());
    }

    let mut found = Vec::new();
    for root in roots {
        for entry in walkdir::WalkDir::new(&root)
            .max_depth(4)
            .into_iter()
            .filter_map(Result::ok)
        {
            if entry.path().extension().and_then(|e| e.to_str()) == Some("ali") {
                found.push(entry.path().to_path_buf());
            }
        }
    }
    found.sort();
    found.dedup();
    found
}

/// Runs the Ada probe, merging every discovered `.ali` file's records onto
/// `component` (§4.3 step 3).
pub fn probe(component: &mut ComponentInfo, ctx: &AttributorContext) -> ProbeOutcome {
    if !ctx.ali_probe_active() {
        return ProbeOutcome::NotApplicable;
    }

    let candidates = discover_ali_files(Path::new(&component.file_path), ctx);
    if candidates.is_empty() {
        return ProbeOutcome::NotApplicable;
    }

    let mut compiler_version = None;
    let mut checksums: BTreeMap<String, String> = BTreeMap::new();
    let mut timestamps: BTreeMap<String, String> = BTreeMap::new();
    let mut had_error = false;

    for path in &candidates {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(?path, %err, "failed to read .ali file");
                had_error = true;
                continue;
            }
        };
        let parsed = parse_ali_text(&text, ctx.ali_enhanced);

        if compiler_version.is_none() {
            compiler_version = parsed.compiler_version.clone();
        }
        for (i, flag) in parsed.security_flags.iter().enumerate() {
            component
                .properties
                .insert(format!("security.ada.flag.{i}"), flag.clone());
        }
        for dep in parsed.with_deps.iter().chain(parsed.runtime_deps.iter()) {
            if dep != &unit_stem(&component.name) && !component.dependencies.contains(dep) {
                component.dependencies.push(dep.clone());
            }
        }
        for src in &parsed.sources {
            if !component.source_files.contains(&src.path) {
                component.source_files.push(src.path.clone());
            }
            checksums.insert(src.path.clone(), src.checksum.clone());
            timestamps.insert(src.path.clone(), src.timestamp.clone());
        }
        for (i, xref) in parsed.xrefs.iter().enumerate() {
            component.properties.insert(format!("ada.xref.{i}"), xref.clone());
        }
        for (i, call) in parsed.call_graph.iter().enumerate() {
            component
                .properties
                .insert(format!("ada.callgraph.{i}"), call.clone());
        }
    }

    for (path, sum) in &checksums {
        component
            .properties
            .insert(format!("ada.source.{path}.checksum"), sum.clone());
    }
    for (path, ts) in &timestamps {
        component
            .properties
            .insert(format!("ada.source.{path}.timestamp"), ts.clone());
    }

    if let Some(version) = &compiler_version {
        component.version = Some(version.clone());
    }

    if component.source_files.is_empty() && component.dependencies.is_empty() {
        return if had_error {
            ProbeOutcome::Error("failed to read any discovered .ali file".to_string())
        } else {
            ProbeOutcome::NotApplicable
        };
    }

    ProbeOutcome::Enriched(crate::system::SystemPackageInfo {
        name: component.name.clone(),
        version: compiler_version,
        supplier: None,
        license: None,
    })
}

fn unit_stem(name: &str) -> String {
    name.trim_end_matches(".exe").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_ALI: &str = r#"V "GNAT Lib v11"
A -g
RV NO_IMPLICIT_CONDITIONALS
W data_reader%s   data_reader.adb  data_reader.ali
D main.adb 20230401120000 abcd1234 main%b
D data_reader.ads 20230401120000 ef567890 data_reader%s
"#;

    #[test]
    fn parses_version_deps_and_sources() {
        let parsed = parse_ali_text(MAIN_ALI, false);
        assert_eq!(parsed.compiler_version.as_deref(), Some("GNAT Lib v11"));
        assert_eq!(parsed.with_deps, vec!["data_reader".to_string()]);
        assert_eq!(parsed.sources.len(), 2);
        assert_eq!(parsed.sources[0].path, "main.adb");
        assert_eq!(parsed.sources[0].unit_name, "main");
    }

    #[test]
    fn enhanced_flag_gates_xref_and_callgraph() {
        let text = "X 1 main.adb\nG c main foo\n";
        let plain = parse_ali_text(text, false);
        assert!(plain.xrefs.is_empty());
        assert!(plain.call_graph.is_empty());

        let enhanced = parse_ali_text(text, true);
        assert_eq!(enhanced.xrefs.len(), 1);
        assert_eq!(enhanced.call_graph.len(), 1);
    }

    #[test]
    fn probe_end_to_end_matches_scenario_s4() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.ali"), MAIN_ALI).unwrap();
        std::fs::write(
            dir.path().join("data_reader.ali"),
            "V \"GNAT Lib v11\"\nD data_reader.adb 20230401120000 11112222 data_reader%b\n",
        )
        .unwrap();

        let mut component = ComponentInfo::new("main_static", dir.path().join("main_static").to_string_lossy());
        let ctx = AttributorContext {
            ali_search_paths: vec![dir.path().to_path_buf()],
            ali_enabled: false,
            ali_enhanced: false,
        };

        let outcome = probe(&mut component, &ctx);
        assert!(matches!(outcome, ProbeOutcome::Enriched(_)));
        assert_eq!(component.version.as_deref(), Some("GNAT Lib v11"));
        assert!(component.source_files.iter().any(|f| f == "main.adb"));
        assert!(component.source_files.iter().any(|f| f == "data_reader.adb"));
        assert!(component.dependencies.contains(&"data_reader".to_string()));
    }
}
