//! `sbom <plugin-path> <binary-path> [options]` (§6): drives one
//! `heimdall::Generator` run over a single top-level input and writes
//! the resulting document. `plugin-path` pins the same core entry
//! point the linker shims load through the C-ABI surface
//! (`heimdall-cabi`); this binary calls that core directly in-process
//! rather than through FFI, but still validates the path up front so
//! a missing plugin fails with the same "plugin load" exit code a
//! linker integration would see.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use heimdall::component::ExtractorOptions;
use heimdall::sbom::DocumentMetadata;
use heimdall::sign::{SigningAlgorithm, SigningConfig};
use heimdall::Generator;
use heimdall_cli::{exit_code, init_logging, report_error};

/// Generates an SBOM document from a compiled binary.
#[derive(Parser)]
#[command(name = "sbom")]
struct Cli {
    /// Path to the core plugin shared object (loaded the way a linker
    /// shim would load it; validated but otherwise unused by this
    /// in-process binary).
    plugin_path: PathBuf,

    /// Path to the binary (executable, shared/static library, or
    /// object file) to extract components from.
    binary_path: PathBuf,

    /// Output document format.
    #[arg(long, default_value = "cyclonedx")]
    format: String,

    /// Output file path.
    #[arg(long, default_value = "sbom.json")]
    output: PathBuf,

    /// SPDX sub-version (`2.3`, `3.0`, `3.0.1`).
    #[arg(long)]
    spdx_version: Option<String>,

    /// CycloneDX sub-version (`1.4`, `1.5`, `1.6`).
    #[arg(long)]
    cyclonedx_version: Option<String>,

    /// Disables recursive processing of resolved dependencies into
    /// their own components.
    #[arg(long)]
    no_transitive_dependencies: bool,

    /// Directory to search for Ada `.ali` files; repeatable.
    #[arg(long = "ali-file-path")]
    ali_file_path: Vec<PathBuf>,

    /// Path to a PEM private key to sign CycloneDX 1.6+ output with.
    #[arg(long)]
    sign_key: Option<PathBuf>,

    /// Path to a PEM certificate; currently only used to carry a key
    /// identifier alongside `--sign-key-id` when present.
    #[arg(long)]
    sign_cert: Option<PathBuf>,

    /// Signing algorithm (`RS256`, `RS384`, `RS512`, `ES256`, `ES384`,
    /// `ES512`, `Ed25519`).
    #[arg(long, default_value = "RS256")]
    sign_algorithm: String,

    /// Identifier attached to the signature block's `keyId` field.
    #[arg(long)]
    sign_key_id: Option<String>,

    /// Raises log verbosity (mirrors `HEIMDALL_VERBOSE=1`).
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            report_error("InvalidArgs", err);
            return ExitCode::from(exit_code::INVALID_ARGS as u8);
        }
    };

    init_logging(cli.verbose);

    if !cli.plugin_path.is_file() {
        report_error("PluginLoad", format!("{} does not exist", cli.plugin_path.display()));
        return ExitCode::from(exit_code::PLUGIN_LOAD as u8);
    }

    if let Err(err) = Generator::check_output_writable(&cli.output) {
        report_error("ConfigurationError", err);
        return ExitCode::from(exit_code::PLUGIN_INIT as u8);
    }

    let options = ExtractorOptions {
        verbose: cli.verbose,
        transitive_dependencies: !cli.no_transitive_dependencies,
        ali_search_paths: cli.ali_file_path.clone(),
        ali_enabled: !cli.ali_file_path.is_empty(),
        detected_by: Some("heimdall-cli/sbom".to_string()),
        ..ExtractorOptions::default()
    };

    let mut generator = Generator::new(options);
    if let Err(err) = generator.process_path(&cli.binary_path) {
        report_error("BinaryProcessing", err);
        return ExitCode::from(exit_code::BINARY_PROCESSING as u8);
    }

    let format = match (cli.format.as_str(), &cli.spdx_version, &cli.cyclonedx_version) {
        (family, Some(v), _) if family.starts_with("spdx") => format!("spdx-{v}"),
        (family, _, Some(v)) if family.starts_with("cyclonedx") => format!("cyclonedx-{v}"),
        (family, _, _) => family.to_string(),
    };

    let document_name = cli
        .binary_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sbom".to_string());
    let metadata = DocumentMetadata::deterministic(document_name, chrono::Utc::now());

    let bytes = if let Some(sign_key_path) = &cli.sign_key {
        if let Some(cert_path) = &cli.sign_cert {
            tracing::debug!(cert = %cert_path.display(), "signing certificate accepted, not embedded in the signature block");
        }
        let private_key = match std::fs::read_to_string(sign_key_path) {
            Ok(key) => key,
            Err(err) => {
                report_error("SigningFailed", err);
                return ExitCode::from(exit_code::SIGNING_FAILED as u8);
            }
        };
        let algorithm = match SigningAlgorithm::parse(&cli.sign_algorithm) {
            Ok(algorithm) => algorithm,
            Err(err) => {
                report_error("SigningFailed", err);
                return ExitCode::from(exit_code::SIGNING_FAILED as u8);
            }
        };
        let signing = SigningConfig {
            algorithm,
            private_key: &private_key,
            key_id: cli.sign_key_id.clone(),
            timestamp: Some(metadata.timestamp_seconds()),
        };
        match generator.generate_signed(&format, &metadata, &signing) {
            Ok(bytes) => bytes,
            Err(err) => {
                report_error("SigningFailed", err);
                return ExitCode::from(exit_code::SIGNING_FAILED as u8);
            }
        }
    } else {
        match generator.generate(&format, &metadata) {
            Ok(bytes) => bytes,
            Err(err) => {
                report_error("DocumentError", err);
                return ExitCode::from(exit_code::BINARY_PROCESSING as u8);
            }
        }
    };

    if let Err(err) = Generator::write_output(&cli.output, &bytes) {
        report_error("Io", err);
        return ExitCode::from(exit_code::PLUGIN_INIT as u8);
    }

    tracing::info!(output = %cli.output.display(), components = generator.components().len(), "SBOM written");
    ExitCode::from(exit_code::SUCCESS as u8)
}
