//! Conformance engine for architectural asset bundles.
//!
//! Runs the high and low tier rule pipelines over a scene snapshot, folds
//! the findings into a requirement checklist and assembles report data.
//!
//! # Example
//!
//! ```no_run
//! use agrcheck_lint::{run_sweep, Catalogue, Checklist, ReportData, SweepOptions};
//! use agrcheck_scene::{SceneSnapshot, Tier, TierProfile};
//! use std::path::Path;
//!
//! let snapshot = SceneSnapshot::from_json(&std::fs::read_to_string("scene.json").unwrap()).unwrap();
//! let catalogue = Catalogue::load(Tier::High, Path::new("hp_requirements.json")).unwrap();
//! let profile = TierProfile::default();
//!
//! let sweep = run_sweep(&snapshot, Tier::High, SweepOptions { profile: &profile, classifier: None });
//! let mut checklist = Checklist::from_catalogue(&catalogue);
//! for diagnostic in checklist.apply_sweep(&sweep) {
//!     eprintln!("{}", diagnostic);
//! }
//! print!("{}", ReportData::new(&checklist, Some(&sweep), "").render_text());
//! ```

pub mod catalogue;
pub mod checklist;
pub mod context;
pub mod finding;
pub mod geometry;
pub mod naming;
pub mod registry;
pub mod report;
pub mod rules;
pub mod sweep;

pub use catalogue::{Catalogue, CatalogueError, RequirementRow};
pub use checklist::{compare_fields, CheckState, Checklist, ChecklistError, EvidenceImage, FieldReview, Progress};
pub use context::{Diagnostic, SweepContext};
pub use finding::Check;
pub use registry::{RuleMetadata, RuleRegistry};
pub use report::{ReportData, ReportEntry, ReportHeader, RuleSummary};
pub use rules::{LintRule, RuleFault, RuleInput};
pub use sweep::{run_sweep, run_with_registry, SweepOptions, TierSweep, Verdict};
