//! Check command implementation
//!
//! Loads a scene snapshot and the requirement catalogues, sweeps every tier
//! that has files and prints or writes the reports.

use agrcheck_lint::{
    compare_fields, run_sweep, Catalogue, Checklist, Diagnostic, FieldReview, ReportData, SweepOptions,
};
use agrcheck_scene::{FnoClassifier, SceneSnapshot, Tier, TierProfile};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

/// Arguments of the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    pub scene: String,
    pub catalogue_high: String,
    pub catalogue_low: String,
    pub classifier: Option<String>,
    pub profile: String,
    pub address: Option<String>,
    pub json: bool,
    pub output: Option<String>,
    /// Reviewer-entered descriptor values as `KEY=VALUE`.
    pub expect: Vec<String>,
}

/// JSON output for the check command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutput {
    /// True when no automatic requirement failed.
    pub success: bool,
    pub scene_path: String,
    pub checked_at: DateTime<Utc>,
    pub reports: Vec<ReportData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_reviews: Vec<FieldReview>,
}

/// Run the check command.
///
/// # Returns
/// Exit code: 0 if every automatic requirement passed, 1 otherwise
pub fn run(args: &CheckArgs) -> Result<ExitCode> {
    let snapshot = load_snapshot(Path::new(&args.scene))?;
    if snapshot.is_empty() {
        println!("nothing to validate");
        return Ok(ExitCode::SUCCESS);
    }

    let output = evaluate(&snapshot, args)?;
    for diagnostic in &output.diagnostics {
        eprintln!("{}: {}", "warning".yellow().bold(), diagnostic);
    }

    let rendered = if args.json {
        serde_json::to_string_pretty(&output).context("Failed to serialize check output")?
    } else {
        render_text(&output)
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &rendered).with_context(|| format!("Failed to write report: {}", path))?;
            log::info!("report written to {}", path);
        }
        None => print!("{}", rendered),
    }

    if !args.json {
        print_verdict(&output);
    }

    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Sweeps every tier of `snapshot` that has files.
pub fn evaluate(snapshot: &SceneSnapshot, args: &CheckArgs) -> Result<CheckOutput> {
    let profile = TierProfile::resolve(&args.profile)
        .with_context(|| format!("Failed to resolve tier profile: {}", args.profile))?;
    let classifier = args
        .classifier
        .as_deref()
        .map(|path| load_classifier(Path::new(path)))
        .transpose()?;
    let expected = parse_expectations(&args.expect)?;
    let address = resolve_address(snapshot, args.address.as_deref());

    let options = SweepOptions {
        profile: &profile,
        classifier: classifier.as_ref(),
    };

    let mut reports = Vec::new();
    let mut diagnostics = Vec::new();
    for tier in [Tier::High, Tier::Low] {
        if snapshot.files(tier).is_empty() {
            log::info!("no {} files, skipping tier", tier);
            continue;
        }
        let catalogue_path = match tier {
            Tier::High => &args.catalogue_high,
            Tier::Low => &args.catalogue_low,
        };
        let catalogue = Catalogue::load(tier, Path::new(catalogue_path))
            .with_context(|| format!("Failed to load {} catalogue: {}", tier, catalogue_path))?;

        let sweep = run_sweep(snapshot, tier, options);
        let mut checklist = Checklist::from_catalogue(&catalogue);
        diagnostics.extend(sweep.diagnostics.iter().cloned());
        diagnostics.extend(checklist.apply_sweep(&sweep));
        reports.push(ReportData::new(&checklist, Some(&sweep), &address));
    }

    let field_reviews = if expected.is_empty() {
        Vec::new()
    } else {
        compare_fields(snapshot, &expected)
    };

    Ok(CheckOutput {
        success: reports.iter().all(ReportData::automatic_passed),
        scene_path: args.scene.clone(),
        checked_at: Utc::now(),
        reports,
        diagnostics,
        field_reviews,
    })
}

pub fn load_snapshot(path: &Path) -> Result<SceneSnapshot> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene snapshot: {}", path.display()))?;
    SceneSnapshot::from_json(&text)
        .with_context(|| format!("Failed to parse scene snapshot: {}", path.display()))
}

fn load_classifier(path: &Path) -> Result<FnoClassifier> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read classifier: {}", path.display()))?;
    let classifier = FnoClassifier::from_csv(&text)
        .with_context(|| format!("Failed to parse classifier: {}", path.display()))?;
    log::debug!("loaded {} classifier rows from {}", classifier.len(), path.display());
    Ok(classifier)
}

/// Parses `KEY=VALUE` pairs.
pub fn parse_expectations(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut expected = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected KEY=VALUE, got '{}'", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("empty key in '{}'", pair);
        }
        expected.insert(key.to_string(), value.trim().to_string());
    }
    Ok(expected)
}

/// Command line address, then the snapshot's, then the first descriptor's,
/// then the bundle name.
fn resolve_address(snapshot: &SceneSnapshot, explicit: Option<&str>) -> String {
    if let Some(address) = explicit {
        return address.to_string();
    }
    if let Some(address) = &snapshot.address {
        return address.clone();
    }
    snapshot
        .high_files
        .iter()
        .filter_map(|f| f.metadata.as_ref()?.address())
        .next()
        .unwrap_or_else(|| snapshot.root_name.clone())
}

fn render_text(output: &CheckOutput) -> String {
    let mut text = format!("Checked: {}\n", output.checked_at.format("%d.%m.%Y %H:%M"));
    for report in &output.reports {
        text.push_str(&report.render_text());
    }
    for review in &output.field_reviews {
        for mismatch in &review.mismatches {
            text.push_str(&format!(
                "{}: {} expected {}, found {}\n",
                review.file_name,
                mismatch.property,
                mismatch.expected,
                mismatch.actual.as_deref().unwrap_or("nothing")
            ));
        }
    }
    text
}

fn print_verdict(output: &CheckOutput) {
    for report in &output.reports {
        let failed = report.failed().filter(|e| e.automatic).count();
        if failed == 0 {
            println!("{} {}", report.header.title.bold(), "PASS".green().bold());
        } else {
            println!(
                "{} {} ({} automatic requirement(s) failed)",
                report.header.title.bold(),
                "FAIL".red().bold(),
                failed
            );
        }
    }
}
