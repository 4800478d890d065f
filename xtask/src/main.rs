use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;

const MAP_DIR: &str = "maps";

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for vantage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Formatting, lints, tests, bundled maps, then rustdoc
    Check {
        /// Also run cargo-deny (needs cargo-deny installed)
        #[arg(long)]
        deny: bool,
    },
    Fmt,
    Clippy,
    /// Unit tests; the wgpu backend's GPU-free tests included
    Test,
    Deny,
    Doc,
    /// Build the desktop viewer and the CLI
    Build,
    /// Load every map under a directory through `vantage-cli validate`
    Maps {
        #[arg(long, default_value = MAP_DIR)]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Check { deny } => {
            fmt()?;
            clippy()?;
            test()?;
            // Maps go through the CLI, so they only make sense once the
            // loader's own tests pass.
            maps(Path::new(MAP_DIR))?;
            doc()?;
            if deny {
                cargo_deny()?;
            }
            println!("==> vantage: all checks passed");
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Deny => cargo_deny()?,
        Commands::Doc => doc()?,
        Commands::Build => cargo("build", &["build", "-p", "vantage-desktop", "-p", "vantage-cli"])?,
        Commands::Maps { dir } => maps(&dir)?,
    }
    Ok(())
}

/// Run one cargo invocation, failing with the step name.
fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> {step}: cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("could not spawn cargo for {step}"))?;
    if !status.success() {
        bail!("{step} failed ({status})");
    }
    Ok(())
}

fn fmt() -> Result<()> {
    cargo("fmt", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test() -> Result<()> {
    cargo("test", &["test", "--workspace"])
}

fn doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn cargo_deny() -> Result<()> {
    cargo("deny", &["deny", "check", "licenses", "bans", "sources"])
}

fn maps(dir: &Path) -> Result<()> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading map directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    if files.is_empty() {
        println!("==> maps: nothing to validate in {}", dir.display());
        return Ok(());
    }
    files.sort();

    let mut args = vec!["run", "--quiet", "-p", "vantage-cli", "--", "validate"];
    let names: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
    args.extend(names.iter().map(String::as_str));
    cargo("maps", &args)
}
