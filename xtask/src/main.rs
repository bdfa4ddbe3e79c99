use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::{bail, ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const RELAY_PACKAGE: &str = "queue_relay_lambda";
const RELAY_BINARY: &str = "relay_lambda";
/// Entry point name the Lambda `provided` runtimes execute.
const BOOTSTRAP_ENTRY: &str = "bootstrap";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the queue relay workspace",
    long_about = "Builds and packages the queue relay Lambda and runs CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and package the relay Lambda into a deployable zip
    Package {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "aarch64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory the zip is written to
        #[arg(long, default_value = "dist")]
        out_dir: PathBuf,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn target_subdir(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn banner(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> Result<()> {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .context("could not spawn cargo")?;
    ensure!(status.success(), "`cargo {}` exited with {status}", args.join(" "));
    Ok(())
}

/// Fails early with an actionable message when the cross target is missing.
/// A missing `rustup` is tolerated; cargo reports the problem itself then.
fn check_target_installed(target: &str) -> Result<()> {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) => output,
        Err(error) => {
            eprintln!("warning: skipping target check, rustup unavailable ({error})");
            return Ok(());
        }
    };

    ensure!(
        output.status.success(),
        "`rustup target list --installed` failed: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        bail!("rust target `{target}` is missing; run `rustup target add {target}`");
    }
    Ok(())
}

fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) -> Result<()> {
    let binary = fs::read(binary_path)
        .with_context(|| format!("no lambda binary at '{}'", binary_path.display()))?;
    let file = fs::File::create(zip_path)
        .with_context(|| format!("cannot create '{}'", zip_path.display()))?;

    let mut archive = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    archive.start_file(BOOTSTRAP_ENTRY, options)?;
    archive.write_all(&binary)?;
    archive.finish()?;
    Ok(())
}

fn package(target: &str, profile: BuildProfile, out_dir: &Path) -> Result<()> {
    check_target_installed(target)?;

    banner("Build relay lambda");
    let mut args = vec![
        "build",
        "-p",
        RELAY_PACKAGE,
        "--bin",
        RELAY_BINARY,
        "--target",
        target,
    ];
    args.extend(profile.cargo_flag());
    cargo(&args)?;

    banner("Zip bootstrap");
    fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create '{}'", out_dir.display()))?;
    let binary_path = Path::new("target")
        .join(target)
        .join(profile.target_subdir())
        .join(RELAY_BINARY);
    let zip_path = out_dir.join(format!("{RELAY_BINARY}.zip"));
    write_bootstrap_zip(&binary_path, &zip_path)?;

    eprintln!("\nPackaged {}", zip_path.display());
    Ok(())
}

fn ci() -> Result<()> {
    banner("Check formatting");
    cargo(&["fmt", "--all", "--", "--check"])?;

    banner("Clippy");
    cargo(&["clippy", "--all-targets", "--all-features", "--", "-D", "warnings"])?;

    banner("Tests");
    cargo(&["test", "--workspace"])?;

    eprintln!("\nCI passed.");
    Ok(())
}

// ── main ───────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Package {
            target,
            profile,
            out_dir,
        } => package(&target, profile, &out_dir),
        Commands::Ci => ci(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
