//! Checklist state: requirement items, aggregation of sweep verdicts and
//! the reviewer overlay.
//!
//! Automatic items take their state from the latest sweep. Manual items
//! belong to the reviewer and are never overwritten by a sweep. Comments
//! and evidence survive every re-run.

use crate::catalogue::{Catalogue, RequirementRow};
use crate::context::Diagnostic;
use crate::sweep::TierSweep;
use agrcheck_scene::{FieldMismatch, SceneSnapshot, Tier};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecklistError {
    #[error("requirement {0} is not in the checklist")]
    UnknownRequirement(String),

    #[error("requirement {0} is evaluated automatically; pin it manual first")]
    AutomaticItem(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    #[default]
    Undefined,
    Verified,
    Failed,
}

/// A screenshot or other file a reviewer attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceImage {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementItem {
    pub requirement_id: String,
    /// Row identifier of the catalogue.
    pub row_id: String,
    pub category: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_link: Option<String>,
    pub is_automatic: bool,
    /// Kept manual by the reviewer even when a rule produces it.
    #[serde(default)]
    pub pinned_manual: bool,
    pub check_state: CheckState,
    pub error_count: usize,
    pub error_text: String,
    #[serde(default)]
    pub user_comment: String,
    #[serde(default)]
    pub evidence_images: Vec<EvidenceImage>,
}

impl RequirementItem {
    fn from_row(row: &RequirementRow) -> Self {
        Self {
            requirement_id: row.req_num.clone(),
            row_id: row.req_id.clone(),
            category: row.category.clone(),
            name: row.name.clone(),
            description: row.description.clone(),
            help_link: row.help_link.clone().filter(|l| !l.is_empty()),
            is_automatic: row.auto,
            pinned_manual: false,
            check_state: CheckState::Undefined,
            error_count: 0,
            error_text: String::new(),
            user_comment: String::new(),
            evidence_images: Vec::new(),
        }
    }

    pub fn is_checked(&self) -> bool {
        self.check_state != CheckState::Undefined
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub items: Vec<RequirementItem>,
}

impl Category {
    /// Items with a state, and all items.
    pub fn progress(&self) -> (usize, usize) {
        let checked = self.items.iter().filter(|i| i.is_checked()).count();
        (checked, self.items.len())
    }
}

/// Verified counts, overall and split by who decides the item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub verified: usize,
    pub total: usize,
    pub automatic_verified: usize,
    pub automatic_total: usize,
    pub manual_verified: usize,
    pub manual_total: usize,
}

impl Progress {
    pub fn percent(&self) -> u32 {
        percent(self.verified, self.total)
    }

    pub fn automatic_percent(&self) -> u32 {
        percent(self.automatic_verified, self.automatic_total)
    }

    pub fn manual_percent(&self) -> u32 {
        percent(self.manual_verified, self.manual_total)
    }
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

/// The checklist of one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub tier: Tier,
    pub categories: Vec<Category>,
}

impl Checklist {
    /// Categories in order of first appearance, items in catalogue order.
    pub fn from_catalogue(catalogue: &Catalogue) -> Self {
        let mut categories: Vec<Category> = Vec::new();
        for row in catalogue.rows() {
            let item = RequirementItem::from_row(row);
            match categories.iter_mut().find(|c| c.name == row.category) {
                Some(category) => category.items.push(item),
                None => categories.push(Category {
                    name: row.category.clone(),
                    items: vec![item],
                }),
            }
        }
        Self {
            tier: catalogue.tier,
            categories,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &RequirementItem> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    fn items_mut(&mut self) -> impl Iterator<Item = &mut RequirementItem> {
        self.categories.iter_mut().flat_map(|c| c.items.iter_mut())
    }

    pub fn item(&self, requirement_id: &str) -> Option<&RequirementItem> {
        self.items().find(|i| i.requirement_id == requirement_id)
    }

    fn item_mut(&mut self, requirement_id: &str) -> Result<&mut RequirementItem, ChecklistError> {
        self.items_mut()
            .find(|i| i.requirement_id == requirement_id)
            .ok_or_else(|| ChecklistError::UnknownRequirement(requirement_id.to_string()))
    }

    /// Folds a sweep into the checklist.
    ///
    /// Items a rule produced become automatic and take the verdict, unless
    /// the reviewer pinned them manual. Automatic items no rule produced,
    /// and items of faulted rules, become manual.
    pub fn apply_sweep(&mut self, sweep: &TierSweep) -> Vec<Diagnostic> {
        let tier = self.tier;
        let verdicts = sweep.verdicts();
        let mut diagnostics = Vec::new();
        let mut known = BTreeSet::new();

        for item in self.items_mut() {
            known.insert(item.requirement_id.clone());
            if item.pinned_manual {
                continue;
            }
            let verdict = verdicts.get(&item.requirement_id);
            if sweep.faulted_requirements.contains(&item.requirement_id) {
                debug!("{}: rule fault, demoted to manual", item.requirement_id);
                item.is_automatic = false;
                item.check_state = CheckState::Undefined;
                item.error_count = verdict.map_or(0, |v| v.error_count);
                item.error_text = verdict.map(|v| v.error_text.clone()).unwrap_or_default();
                continue;
            }
            match verdict {
                Some(verdict) => {
                    item.is_automatic = true;
                    item.check_state = if verdict.verified {
                        CheckState::Verified
                    } else {
                        CheckState::Failed
                    };
                    item.error_count = verdict.error_count;
                    item.error_text = verdict.error_text.clone();
                }
                None if item.is_automatic => {
                    item.is_automatic = false;
                    diagnostics.push(Diagnostic::UnusedRequirement {
                        tier,
                        requirement_id: item.requirement_id.clone(),
                    });
                }
                None => {}
            }
        }

        for (id, verdict) in &verdicts {
            if !known.contains(id) {
                diagnostics.push(Diagnostic::UnknownRequirement {
                    tier,
                    requirement_id: id.clone(),
                    rule_name: verdict.rule_name.clone(),
                });
            }
        }
        diagnostics
    }

    /// Reviewer verdict on a manual item.
    pub fn set_state(&mut self, requirement_id: &str, state: CheckState) -> Result<(), ChecklistError> {
        let item = self.item_mut(requirement_id)?;
        if item.is_automatic {
            return Err(ChecklistError::AutomaticItem(requirement_id.to_string()));
        }
        item.check_state = state;
        Ok(())
    }

    pub fn set_comment(&mut self, requirement_id: &str, comment: impl Into<String>) -> Result<(), ChecklistError> {
        self.item_mut(requirement_id)?.user_comment = comment.into();
        Ok(())
    }

    pub fn attach_evidence(&mut self, requirement_id: &str, image: EvidenceImage) -> Result<(), ChecklistError> {
        self.item_mut(requirement_id)?.evidence_images.push(image);
        Ok(())
    }

    /// Takes an item away from the sweep. Its current state is kept.
    pub fn pin_manual(&mut self, requirement_id: &str) -> Result<(), ChecklistError> {
        let item = self.item_mut(requirement_id)?;
        item.pinned_manual = true;
        item.is_automatic = false;
        Ok(())
    }

    /// Hands an item back to the sweep; the next sweep decides its state.
    pub fn enable_automatic(&mut self, requirement_id: &str) -> Result<(), ChecklistError> {
        let item = self.item_mut(requirement_id)?;
        item.pinned_manual = false;
        item.is_automatic = true;
        Ok(())
    }

    /// Clears every automatic result. Comments, evidence and manual states
    /// stay.
    pub fn reset(&mut self) {
        for item in self.items_mut().filter(|i| i.is_automatic) {
            item.check_state = CheckState::Undefined;
            item.error_count = 0;
            item.error_text.clear();
        }
    }

    pub fn progress(&self) -> Progress {
        let mut progress = Progress::default();
        for item in self.items() {
            let verified = usize::from(item.check_state == CheckState::Verified);
            progress.total += 1;
            progress.verified += verified;
            if item.is_automatic {
                progress.automatic_total += 1;
                progress.automatic_verified += verified;
            } else {
                progress.manual_total += 1;
                progress.manual_verified += verified;
            }
        }
        progress
    }

    /// Requirement ids still without a state, in checklist order.
    pub fn not_checked(&self) -> Vec<&str> {
        self.items()
            .filter(|i| !i.is_checked())
            .map(|i| i.requirement_id.as_str())
            .collect()
    }

    /// True when no automatic item failed.
    pub fn automatic_passed(&self) -> bool {
        !self
            .items()
            .any(|i| i.is_automatic && i.check_state == CheckState::Failed)
    }
}

/// Reviewer-entered descriptor values compared against one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReview {
    pub file_name: String,
    pub mismatches: Vec<FieldMismatch>,
}

/// Compares `expected` against the descriptor of every high tier file that
/// has one.
pub fn compare_fields(snapshot: &SceneSnapshot, expected: &BTreeMap<String, String>) -> Vec<FieldReview> {
    snapshot
        .high_files
        .iter()
        .filter_map(|file| {
            let metadata = file.metadata.as_ref()?;
            Some(FieldReview {
                file_name: file.file_name.clone(),
                mismatches: metadata.compare_fields(expected),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Check;
    use crate::rules::RuleFault;
    use agrcheck_scene::{GeoMetadata, ModelFile};
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value};

    fn row(num: &str, category: &str, auto: bool) -> RequirementRow {
        RequirementRow {
            req_id: format!("r{}", num),
            req_num: num.to_string(),
            category: category.to_string(),
            name: format!("Requirement {}", num),
            description: String::new(),
            auto,
            recommendation: false,
            help_link: None,
        }
    }

    fn checklist() -> Checklist {
        let catalogue = Catalogue::new(
            Tier::High,
            vec![
                row("2.3.21", "Geometry", true),
                row("2.10.4.1", "Naming", true),
                row("2.3.13", "Geometry", true),
                row("2.4.1", "Materials", false),
                row("2.15.3", "Lights", true),
            ],
        )
        .unwrap();
        Checklist::from_catalogue(&catalogue)
    }

    fn check(id: &str, errors: &[&str]) -> Check {
        let mut check = Check::new("Rule", "SM_Lenina12", &[id]);
        check.add_errors(errors.iter().copied());
        check
    }

    fn sweep() -> TierSweep {
        let mut sweep = TierSweep::new(Tier::High);
        sweep.checks.push(check("2.3.21", &[]));
        sweep.checks.push(check("2.3.21", &["Cube: Scale=(2, 1, 1)"]));
        sweep.checks.push(check("2.10.4.1", &[]));
        sweep.checks.push(check("2.3.13", &[]));
        sweep
    }

    #[test]
    fn test_categories_keep_catalogue_order() {
        let list = checklist();
        let names: Vec<&str> = list.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Geometry", "Naming", "Materials", "Lights"]);
        let geometry: Vec<&str> = list.categories[0].items.iter().map(|i| i.requirement_id.as_str()).collect();
        assert_eq!(geometry, vec!["2.3.21", "2.3.13"]);
    }

    #[test]
    fn test_apply_sweep_aggregates_and_demotes() {
        let mut list = checklist();
        let diagnostics = list.apply_sweep(&sweep());

        let transforms = list.item("2.3.21").unwrap();
        assert_eq!(transforms.check_state, CheckState::Failed);
        assert_eq!(transforms.error_count, 1);
        assert_eq!(transforms.error_text, "    SM_Lenina12\n        Cube: Scale=(2, 1, 1)\n");
        assert_eq!(list.item("2.10.4.1").unwrap().check_state, CheckState::Verified);

        let lights = list.item("2.15.3").unwrap();
        assert!(!lights.is_automatic);
        assert_eq!(lights.check_state, CheckState::Undefined);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnusedRequirement {
                tier: Tier::High,
                requirement_id: "2.15.3".to_string(),
            }]
        );
        assert!(!list.automatic_passed());
    }

    #[test]
    fn test_unknown_ids_are_reported() {
        let mut list = checklist();
        let mut sweep = sweep();
        sweep.checks.push(check("9.9.9", &[]));
        let diagnostics = list.apply_sweep(&sweep);
        assert!(diagnostics.contains(&Diagnostic::UnknownRequirement {
            tier: Tier::High,
            requirement_id: "9.9.9".to_string(),
            rule_name: "Rule".to_string(),
        }));
    }

    #[test]
    fn test_faulted_rule_demotes_its_ids() {
        struct Collision;
        impl crate::rules::LintRule for Collision {
            fn id(&self) -> &'static str {
                "high/collision"
            }
            fn description(&self) -> &'static str {
                ""
            }
            fn tier(&self) -> Tier {
                Tier::High
            }
            fn requirement_ids(&self) -> &'static [&'static str] {
                &["2.3.13"]
            }
            fn check(&self, _: &crate::rules::RuleInput) -> Result<Vec<Check>, RuleFault> {
                Ok(Vec::new())
            }
        }

        let mut list = checklist();
        let mut sweep = sweep();
        sweep.record_fault(&Collision, RuleFault::internal("high/collision", "boom"));
        list.apply_sweep(&sweep);
        let item = list.item("2.3.13").unwrap();
        assert!(!item.is_automatic);
        assert_eq!(item.check_state, CheckState::Undefined);
        assert_eq!(item.error_text, "    high/collision\n        rule high/collision failed: boom\n");
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let mut list = checklist();
        list.apply_sweep(&sweep());
        let first = list.clone();
        list.apply_sweep(&sweep());
        assert_eq!(list, first);
    }

    #[test]
    fn test_overlay_survives_sweeps() {
        let mut list = checklist();
        list.set_comment("2.3.21", "scale baked in the next delivery").unwrap();
        list.attach_evidence(
            "2.3.21",
            EvidenceImage {
                name: "scale.png".to_string(),
                path: "/tmp/scale.png".to_string(),
                comment: String::new(),
            },
        )
        .unwrap();
        list.pin_manual("2.10.4.1").unwrap();
        list.set_state("2.10.4.1", CheckState::Failed).unwrap();

        list.apply_sweep(&sweep());
        let transforms = list.item("2.3.21").unwrap();
        assert_eq!(transforms.user_comment, "scale baked in the next delivery");
        assert_eq!(transforms.evidence_images.len(), 1);
        assert_eq!(list.item("2.10.4.1").unwrap().check_state, CheckState::Failed);

        list.enable_automatic("2.10.4.1").unwrap();
        list.apply_sweep(&sweep());
        assert_eq!(list.item("2.10.4.1").unwrap().check_state, CheckState::Verified);
    }

    #[test]
    fn test_state_of_automatic_items_is_not_editable() {
        let mut list = checklist();
        assert_eq!(
            list.set_state("2.3.21", CheckState::Verified),
            Err(ChecklistError::AutomaticItem("2.3.21".to_string()))
        );
        assert_eq!(
            list.set_comment("0.0", "x"),
            Err(ChecklistError::UnknownRequirement("0.0".to_string()))
        );
        list.set_state("2.4.1", CheckState::Verified).unwrap();
    }

    #[test]
    fn test_reset_keeps_overlay() {
        let mut list = checklist();
        list.apply_sweep(&sweep());
        list.set_state("2.4.1", CheckState::Verified).unwrap();
        list.set_comment("2.3.21", "seen").unwrap();
        list.reset();
        assert_eq!(list.item("2.3.21").unwrap().check_state, CheckState::Undefined);
        assert_eq!(list.item("2.3.21").unwrap().error_text, "");
        assert_eq!(list.item("2.3.21").unwrap().user_comment, "seen");
        assert_eq!(list.item("2.4.1").unwrap().check_state, CheckState::Verified);
    }

    #[test]
    fn test_progress_split() {
        let mut list = checklist();
        list.apply_sweep(&sweep());
        list.set_state("2.4.1", CheckState::Verified).unwrap();
        let progress = list.progress();
        assert_eq!(
            progress,
            Progress {
                verified: 3,
                total: 5,
                automatic_verified: 2,
                automatic_total: 3,
                manual_verified: 1,
                manual_total: 2,
            }
        );
        assert_eq!(progress.percent(), 60);
        assert_eq!(progress.automatic_percent(), 67);
        assert_eq!(list.categories[0].progress(), (2, 2));
        assert_eq!(list.not_checked(), vec!["2.15.3"]);
    }

    #[test]
    fn test_compare_fields() {
        let mut properties = Map::new();
        properties.insert("ZU_area".to_string(), Value::String("1520,5".to_string()));
        properties.insert("h_relief".to_string(), Value::String("144.2".to_string()));
        let metadata = GeoMetadata {
            properties,
            ..Default::default()
        };
        let snapshot = SceneSnapshot {
            high_files: vec![
                ModelFile::new("SM_Lenina12_Ground.fbx").with_metadata(metadata),
                ModelFile::new("SM_Lenina12_Ground_Light.fbx"),
            ],
            ..Default::default()
        };
        let expected = BTreeMap::from([
            ("ZU_area".to_string(), "1520.5".to_string()),
            ("h_relief".to_string(), "150".to_string()),
        ]);
        let reviews = compare_fields(&snapshot, &expected);
        assert_eq!(reviews.len(), 1);
        assert_eq!(
            reviews[0].mismatches,
            vec![FieldMismatch {
                property: "h_relief".to_string(),
                expected: "150".to_string(),
                actual: Some("144.2".to_string()),
            }]
        );
    }
}
