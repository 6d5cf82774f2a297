//! System package database probe (§4.3 step 1): resolves a file path back
//! to the distro package that installed it, using whichever packaging
//! database is present on the host — `dpkg` on Debian/Ubuntu, `rpm` on
//! Fedora/RHEL/openSUSE, `pkg` on FreeBSD.
//!
//! Queries shell out to the system tools rather than re-implementing the
//! on-disk database formats: the format (e.g. dpkg's `/var/lib/dpkg/info`
//! triggers/md5sums layout) is an implementation detail the package
//! manager itself already exposes through a stable CLI.

use std::path::Path;
use std::process::Command;

use crate::ProbeOutcome;

/// Runs `dpkg -S`/`rpm -qf`/`pkg which` (whichever is available) against
/// `file_path` and, on a hit, looks up that package's metadata.
pub fn probe(file_path: &Path) -> ProbeOutcome {
    if let Some(pkg) = dpkg_owner(file_path) {
        return dpkg_metadata(&pkg)
            .map(ProbeOutcome::Enriched)
            .unwrap_or(ProbeOutcome::NotApplicable);
    }

    if let Some(pkg) = rpm_owner(file_path) {
        return rpm_metadata(&pkg)
            .map(ProbeOutcome::Enriched)
            .unwrap_or(ProbeOutcome::NotApplicable);
    }

    if let Some(info) = pkg_owner(file_path) {
        return ProbeOutcome::Enriched(info);
    }

    ProbeOutcome::NotApplicable
}

/// What a system package probe fills in on a hit.
#[derive(Debug, Clone, Default)]
pub struct SystemPackageInfo {
    pub name: String,
    pub version: Option<String>,
    pub supplier: Option<String>,
    pub license: Option<String>,
}

fn run(cmd: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(cmd).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn dpkg_owner(path: &Path) -> Option<String> {
    let out = run("dpkg", &["-S", path.to_str()?])?;
    // Format: "package-name:arch: /path/to/file" (or multiple such lines).
    let line = out.lines().next()?;
    let (pkg, _) = line.split_once(':')?;
    Some(pkg.trim().to_string())
}

fn dpkg_metadata(pkg: &str) -> Option<SystemPackageInfo> {
    let out = run("dpkg-query", &["-W", "-f=${Version}\\n${Maintainer}\\n", pkg])?;
    let mut lines = out.lines();
    let version = lines.next().map(str::to_string).filter(|s| !s.is_empty());
    let supplier = lines.next().map(str::to_string).filter(|s| !s.is_empty());
    Some(SystemPackageInfo {
        name: pkg.to_string(),
        version,
        supplier,
        license: None,
    })
}

fn rpm_owner(path: &Path) -> Option<String> {
    run("rpm", &["-qf", "--qf", "%{NAME}", path.to_str()?])
}

fn rpm_metadata(pkg: &str) -> Option<SystemPackageInfo> {
    let out = run(
        "rpm",
        &["-q", "--qf", "%{VERSION}-%{RELEASE}\\n%{VENDOR}\\n%{LICENSE}\\n", pkg],
    )?;
    let mut lines = out.lines();
    let version = lines.next().map(str::to_string).filter(|s| !s.is_empty());
    let supplier = lines.next().map(str::to_string).filter(|s| !s.is_empty());
    let license = lines.next().map(str::to_string).filter(|s| !s.is_empty());
    Some(SystemPackageInfo {
        name: pkg.to_string(),
        version,
        supplier,
        license,
    })
}

fn pkg_owner(path: &Path) -> Option<SystemPackageInfo> {
    let out = run("pkg", &["which", "-q", path.to_str()?])?;
    let name = out.trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some(SystemPackageInfo {
        name,
        version: None,
        supplier: None,
        license: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tools_yield_not_applicable() {
        // On a host with none of dpkg/rpm/pkg on PATH (or where the path
        // is not owned by any package), the probe must not error out.
        let outcome = probe(Path::new("/definitely/not/a/packaged/path-xyz"));
        assert!(matches!(outcome, ProbeOutcome::NotApplicable));
    }
}
