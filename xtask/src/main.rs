use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::result::ZipResult;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "unzip_pipeline_lambda";
const LAMBDA_BINARIES: [(&str, &str); 2] = [
    ("trigger_lambda", "trigger.zip"),
    ("aggregator_lambda", "aggregator.zip"),
];
const WORKER_BINARY: &str = "extraction_worker";
const DIST_DIR: &str = "infra/dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the archive unzip pipeline workspace",
    long_about = "A unified CLI for CI checks and for packaging the trigger and\n\
                  aggregator Lambdas and the extraction worker binary."
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
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and package Lambda zips and the Batch worker binary for Terraform inputs
    ServerlessPackage {
        /// Compilation target triple for Lambda and worker binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Formatting, clippy, and tests
    Check,
    /// Run check, then build every binary in release mode
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

fn package_serverless(target: &str, profile: BuildProfile) {
    if !rust_target_installed(target) {
        eprintln!("error: rust target `{target}` is missing; run `rustup target add {target}`");
        exit(1);
    }

    step("Build pipeline binaries");
    let mut cargo_args = vec!["build", "-p", LAMBDA_PACKAGE, "--target", target];
    for (bin_name, _) in LAMBDA_BINARIES {
        cargo_args.extend(["--bin", bin_name]);
    }
    cargo_args.extend(["--bin", WORKER_BINARY]);
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package Terraform artifacts");
    let build_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).expect("failed to create dist directory");

    let mut artifacts: Vec<DistArtifact> = LAMBDA_BINARIES
        .iter()
        .map(|(bin_name, zip_name)| DistArtifact::LambdaZip {
            binary: build_dir.join(bin_name),
            zip: dist_dir.join(zip_name),
        })
        .collect();
    // Baked into the Batch container image rather than zipped.
    artifacts.push(DistArtifact::Binary {
        binary: build_dir.join(WORKER_BINARY),
        dest: dist_dir.join(WORKER_BINARY),
    });

    for artifact in &artifacts {
        artifact.write();
        eprintln!("- {}", artifact.output().display());
    }
}

/// Assumes the target is present when rustup itself is unavailable.
fn rust_target_installed(target: &str) -> bool {
    match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line.trim() == target),
        _ => true,
    }
}

/// Lambda `provided.al2` runtimes exec a file named `bootstrap`.
fn write_bootstrap_zip(binary: &[u8], zip_path: &Path) -> ZipResult<()> {
    let mut writer = ZipWriter::new(fs::File::create(zip_path)?);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    writer.start_file("bootstrap", options)?;
    writer.write_all(binary)?;
    writer.finish()?;
    Ok(())
}

enum DistArtifact {
    LambdaZip { binary: PathBuf, zip: PathBuf },
    Binary { binary: PathBuf, dest: PathBuf },
}

impl DistArtifact {
    fn output(&self) -> &Path {
        match self {
            Self::LambdaZip { zip, .. } => zip,
            Self::Binary { dest, .. } => dest,
        }
    }

    fn write(&self) {
        match self {
            Self::LambdaZip { binary, zip } => {
                let bytes = fs::read(binary).unwrap_or_else(|error| {
                    panic!("missing lambda binary {}: {error}", binary.display())
                });
                write_bootstrap_zip(&bytes, zip)
                    .unwrap_or_else(|error| panic!("failed to write {}: {error}", zip.display()));
            }
            Self::Binary { binary, dest } => {
                fs::copy(binary, dest).unwrap_or_else(|error| {
                    panic!("failed to copy worker binary {}: {error}", binary.display())
                });
            }
        }
    }
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

fn ci_check() {
    ci_lint();

    step("Test unzip_pipeline_core");
    run_cargo(&["test", "-p", "unzip_pipeline_core"]);

    step("Test unzip_pipeline_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

fn ci_release_build() {
    step("Build release binaries");
    run_cargo(&["build", "-p", LAMBDA_PACKAGE, "--bins", "--release"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Check => ci_check(),
                CiJob::All => {
                    ci_check();
                    ci_release_build();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::ServerlessPackage { target, profile } => {
            package_serverless(&target, profile);
        }
    }
}
