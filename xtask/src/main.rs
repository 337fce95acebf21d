use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::result::ZipResult;
use zip::{CompressionMethod, ZipWriter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the item handler workspace",
    long_about = "A unified CLI for CI checks and Lambda packaging\n\
                  in the item handler workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::All)]
        job: CiJob,
    },
    /// Build and package the item Lambda as a `bootstrap` zip for Terraform
    ServerlessPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory the zip is written to
        #[arg(long, env = "ITEM_LAMBDA_DIST_DIR", default_value = "infra/item_handler/dist")]
        dist_dir: String,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Unit and integration tests
    Test,
    /// Run lint + test
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

const LAMBDA_PACKAGE: &str = "item_handler_lambda";
const LAMBDA_BIN: &str = "item_lambda";

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

/// Builds `item_lambda` for `target` and zips it into `dist_dir`.
fn package_item_lambda(
    target: &str,
    profile: BuildProfile,
    dist_dir: &Path,
) -> Result<PathBuf, String> {
    check_target_installed(target)?;

    step("Build item lambda binary");
    let mut cargo_args = vec![
        "build",
        "-p",
        LAMBDA_PACKAGE,
        "--target",
        target,
        "--bin",
        LAMBDA_BIN,
    ];
    cargo_args.extend(profile.as_cargo_flag());
    run_cargo(&cargo_args);

    step("Package lambda zip artifact");
    let binary_path = lambda_binary_path(target, profile);
    let binary = fs::read(&binary_path)
        .map_err(|error| format!("cannot read {}: {error}", binary_path.display()))?;

    fs::create_dir_all(dist_dir)
        .map_err(|error| format!("cannot create {}: {error}", dist_dir.display()))?;
    let zip_path = dist_dir.join(format!("{LAMBDA_BIN}.zip"));
    let file = fs::File::create(&zip_path)
        .map_err(|error| format!("cannot create {}: {error}", zip_path.display()))?;
    write_bootstrap_zip(file, &binary)
        .map_err(|error| format!("cannot write {}: {error}", zip_path.display()))?;

    Ok(zip_path)
}

/// A missing `rustup` only skips the check; a missing target is an error.
fn check_target_installed(target: &str) -> Result<(), String> {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) => output,
        Err(error) => {
            eprintln!("warning: rustup unavailable ({error}); skipping target check");
            return Ok(());
        }
    };

    if !output.status.success() {
        return Err(format!(
            "`rustup target list --installed` failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if installed.lines().map(str::trim).any(|line| line == target) {
        Ok(())
    } else {
        Err(format!(
            "rust target `{target}` is missing; run `rustup target add {target}`"
        ))
    }
}

fn lambda_binary_path(target: &str, profile: BuildProfile) -> PathBuf {
    let file_name = if target.contains("windows") {
        format!("{LAMBDA_BIN}.exe")
    } else {
        LAMBDA_BIN.to_string()
    };
    Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(file_name)
}

/// Custom Lambda runtimes start the executable named `bootstrap` at the
/// archive root.
fn write_bootstrap_zip<W: Write + Seek>(writer: W, binary: &[u8]) -> ZipResult<W> {
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    let mut archive = ZipWriter::new(writer);
    archive.start_file("bootstrap", options)?;
    archive.write_all(binary)?;
    archive.finish()
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test item_handler_core");
    run_cargo(&["test", "-p", "item_handler_core"]);

    step("Test item_handler_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::All => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::ServerlessPackage {
            target,
            profile,
            dist_dir,
        } => {
            match package_item_lambda(&target, profile, Path::new(&dist_dir)) {
                Ok(zip_path) => eprintln!("\nPackaged artifact:\n- {}", zip_path.display()),
                Err(message) => {
                    eprintln!("error: {message}");
                    exit(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use zip::ZipArchive;

    use super::*;

    #[test]
    fn bootstrap_zip_holds_executable_binary() {
        let cursor = write_bootstrap_zip(Cursor::new(Vec::new()), b"\x7fELF-item-lambda")
            .expect("zip should be written");

        let mut archive = ZipArchive::new(cursor).expect("zip should open");
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("bootstrap").expect("bootstrap entry");
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .expect("entry should decompress");
        assert_eq!(contents, b"\x7fELF-item-lambda");
    }

    #[test]
    fn binary_path_follows_target_and_profile() {
        assert_eq!(
            lambda_binary_path("x86_64-unknown-linux-gnu", BuildProfile::Release),
            Path::new("target/x86_64-unknown-linux-gnu/release/item_lambda")
        );
        assert_eq!(
            lambda_binary_path("x86_64-pc-windows-msvc", BuildProfile::Debug),
            Path::new("target/x86_64-pc-windows-msvc/debug/item_lambda.exe")
        );
    }
}
