//! Wire the PaddleOCR native sources into a Flutter iOS runner project.
//!
//! `pbxsync apply` rewrites `project.pbxproj` so that the groups, file
//! references, build phases, and build settings listed in the built-in
//! manifest are present exactly once. Running it again is a no-op.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pbxsync::apply::{ApplyOptions, render_summary, run_apply};
use pbxsync::exit_codes;
use pbxsync::logging;
use pbxsync::manifest::Manifest;

#[derive(Parser)]
#[command(
    name = "pbxsync",
    version,
    about = "Deterministic Xcode project mutator for the PaddleOCR integration"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply the manifest to a project and write it back once.
    Apply {
        /// `.xcodeproj` bundle or the `project.pbxproj` inside it.
        #[arg(default_value = "ios/Runner.xcodeproj")]
        project: PathBuf,
        /// Compute the changes without writing the file.
        #[arg(long)]
        dry_run: bool,
        /// Print the summary as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Exit with code 2 if `apply` would change the project.
    Check {
        #[arg(default_value = "ios/Runner.xcodeproj")]
        project: PathBuf,
    },
    /// Print the built-in manifest.
    Manifest,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Apply {
            project,
            dry_run,
            json,
        } => cmd_apply(&project, dry_run, json),
        Command::Check { project } => cmd_check(&project),
        Command::Manifest => {
            print!("{}", Manifest::builtin_source());
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_apply(project: &Path, dry_run: bool, json: bool) -> Result<i32> {
    let manifest = Manifest::builtin()?;
    let outcome = run_apply(project, &manifest, &ApplyOptions { dry_run })?;
    if json {
        let text = serde_json::to_string_pretty(&outcome).context("serialize summary")?;
        println!("{text}");
    } else {
        print!("{}", render_summary(&outcome));
    }
    Ok(exit_codes::OK)
}

fn cmd_check(project: &Path) -> Result<i32> {
    let manifest = Manifest::builtin()?;
    let outcome = run_apply(project, &manifest, &ApplyOptions { dry_run: true })?;
    if outcome.changed {
        println!("{} is out of date", outcome.path.display());
        return Ok(exit_codes::DRIFT);
    }
    println!("{} is up to date", outcome.path.display());
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_apply_defaults_to_runner_bundle() {
        let cli = Cli::parse_from(["pbxsync", "apply"]);
        match cli.command {
            Command::Apply {
                project,
                dry_run,
                json,
            } => {
                assert_eq!(project, PathBuf::from("ios/Runner.xcodeproj"));
                assert!(!dry_run);
                assert!(!json);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn parse_apply_flags() {
        let cli = Cli::parse_from([
            "pbxsync",
            "apply",
            "app/Runner.xcodeproj",
            "--dry-run",
            "--json",
        ]);
        match cli.command {
            Command::Apply {
                project,
                dry_run,
                json,
            } => {
                assert_eq!(project, PathBuf::from("app/Runner.xcodeproj"));
                assert!(dry_run);
                assert!(json);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn parse_check_and_manifest() {
        assert!(matches!(
            Cli::parse_from(["pbxsync", "check", "x.pbxproj"]).command,
            Command::Check { .. }
        ));
        assert!(matches!(
            Cli::parse_from(["pbxsync", "manifest"]).command,
            Command::Manifest
        ));
    }
}
