//! Agrcheck CLI - batch conformance checks for architectural asset bundles
//!
//! This binary sweeps a scene snapshot produced by the importer against the
//! per-tier requirement catalogues and reports which requirements fail.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use agrcheck_cli::commands;

/// Agrcheck - Asset Bundle Conformance Checker
#[derive(Parser)]
#[command(name = "agrcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both tier pipelines over a scene snapshot and report the checklist
    Check {
        /// Path to the scene snapshot JSON
        scene: String,

        /// Requirement catalogue of the high tier
        #[arg(long)]
        catalogue_high: String,

        /// Requirement catalogue of the low tier
        #[arg(long)]
        catalogue_low: String,

        /// Functional-use classifier table (`;` separated CSV)
        #[arg(long)]
        classifier: Option<String>,

        /// Threshold profile name (default, strict) or path to a JSON profile
        #[arg(long, default_value = "default")]
        profile: String,

        /// Site address shown in the report header
        #[arg(long)]
        address: Option<String>,

        /// Expected descriptor value, compared with the geojson (repeatable)
        #[arg(long, value_name = "KEY=VALUE")]
        expect: Vec<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Log every completed rule
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the rule set of each tier with its requirement ids
    Rules {
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// List the files of a bundle directory as snapshot entries
    Bundle {
        /// Bundle root directory
        dir: String,
    },
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Check { verbose: true, .. });
    init_logging(verbose);

    let result = match cli.command {
        Commands::Check {
            scene,
            catalogue_high,
            catalogue_low,
            classifier,
            profile,
            address,
            expect,
            json,
            output,
            verbose: _,
        } => commands::check::run(&commands::check::CheckArgs {
            scene,
            catalogue_high,
            catalogue_low,
            classifier,
            profile,
            address,
            json,
            output,
            expect,
        }),
        Commands::Rules { json } => commands::rules::run(json),
        Commands::Bundle { dir } => commands::bundle::run(&dir),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from([
            "agrcheck",
            "check",
            "scene.json",
            "--catalogue-high",
            "hp.json",
            "--catalogue-low",
            "lp.json",
            "--expect",
            "ZU_area=1520,5",
            "--expect",
            "h_relief=144",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Check {
                scene,
                catalogue_high,
                profile,
                expect,
                json,
                verbose,
                classifier,
                ..
            } => {
                assert_eq!(scene, "scene.json");
                assert_eq!(catalogue_high, "hp.json");
                assert_eq!(profile, "default");
                assert_eq!(expect, vec!["ZU_area=1520,5", "h_relief=144"]);
                assert!(json);
                assert!(!verbose);
                assert!(classifier.is_none());
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_cli_check_requires_catalogues() {
        let result = Cli::try_parse_from(["agrcheck", "check", "scene.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_rules() {
        let cli = Cli::try_parse_from(["agrcheck", "rules", "--json"]).unwrap();
        match cli.command {
            Commands::Rules { json } => assert!(json),
            _ => panic!("expected rules command"),
        }
    }

    #[test]
    fn test_cli_parses_bundle() {
        let cli = Cli::try_parse_from(["agrcheck", "bundle", "Lenina12"]).unwrap();
        match cli.command {
            Commands::Bundle { dir } => assert_eq!(dir, "Lenina12"),
            _ => panic!("expected bundle command"),
        }
    }
}
