//! One tier sweep: every rule of the tier over one snapshot.

use crate::context::{Diagnostic, SweepContext};
use crate::finding::Check;
use crate::registry::RuleRegistry;
use crate::rules::{LintRule, RuleFault, RuleInput};
use agrcheck_scene::{FnoClassifier, SceneSnapshot, Tier, TierProfile};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Rule name of the finding that stands in for a rule that could not
/// finish.
pub const RULE_FAULT: &str = "Rule fault";

/// Aggregated outcome of every finding that names one requirement id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub verified: bool,
    /// Errors of every contributing finding, passing ones included.
    pub error_count: usize,
    /// Context and error lines of the failing findings.
    pub error_text: String,
    /// Rule name of the first contributing finding.
    pub rule_name: String,
}

/// Findings of one tier, in rule order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSweep {
    pub tier: Tier,
    pub checks: Vec<Check>,
    pub faults: Vec<RuleFault>,
    /// Requirement ids of faulted rules. These need a human verdict.
    pub faulted_requirements: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl TierSweep {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            checks: Vec::new(),
            faults: Vec::new(),
            faulted_requirements: BTreeSet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Records a rule that could not finish as one failed finding on its
    /// requirement ids.
    pub fn record_fault(&mut self, rule: &dyn LintRule, fault: RuleFault) {
        let mut check = Check::new(RULE_FAULT, rule.id(), rule.requirement_ids());
        check.add_error(fault.to_string());
        self.checks.push(check);
        self.faulted_requirements
            .extend(rule.requirement_ids().iter().map(|id| id.to_string()));
        self.faults.push(fault);
    }

    /// True when every finding passed and no rule faulted.
    pub fn passed(&self) -> bool {
        self.faults.is_empty() && self.checks.iter().all(|c| c.verified)
    }

    pub fn error_count(&self) -> usize {
        self.checks.iter().map(Check::error_count).sum()
    }

    /// Verdict per requirement id, in id order.
    pub fn verdicts(&self) -> BTreeMap<String, Verdict> {
        let mut verdicts: BTreeMap<String, Verdict> = BTreeMap::new();
        for check in &self.checks {
            for id in &check.requirement_ids {
                let verdict = verdicts.entry(id.clone()).or_insert_with(|| Verdict {
                    verified: true,
                    error_count: 0,
                    error_text: String::new(),
                    rule_name: check.rule_name.clone(),
                });
                verdict.error_count += check.error_count();
                if !check.verified {
                    verdict.verified = false;
                    verdict.error_text.push_str(&check.error_text());
                }
            }
        }
        verdicts
    }

    /// Findings grouped by rule name, names sorted.
    pub fn by_rule_name(&self) -> BTreeMap<&str, Vec<&Check>> {
        let mut groups: BTreeMap<&str, Vec<&Check>> = BTreeMap::new();
        for check in &self.checks {
            groups.entry(check.rule_name.as_str()).or_default().push(check);
        }
        groups
    }
}

/// Everything a sweep needs besides the snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SweepOptions<'a> {
    pub profile: &'a TierProfile,
    pub classifier: Option<&'a FnoClassifier>,
}

/// Runs the default rule set of `tier`.
pub fn run_sweep(snapshot: &SceneSnapshot, tier: Tier, options: SweepOptions<'_>) -> TierSweep {
    run_with_registry(&RuleRegistry::for_tier(tier), snapshot, tier, options)
}

/// Runs the rules of `registry` that belong to `tier`.
pub fn run_with_registry(
    registry: &RuleRegistry,
    snapshot: &SceneSnapshot,
    tier: Tier,
    options: SweepOptions<'_>,
) -> TierSweep {
    let mut ctx = SweepContext::new(tier);
    let input = RuleInput::new(snapshot, tier, options.profile).with_classifier(options.classifier);
    let mut sweep = registry.run(&input, &mut ctx);
    sweep.diagnostics = ctx.finish();
    sweep
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check(rule: &str, id: &str, errors: &[&str]) -> Check {
        let mut check = Check::new(rule, "SM_Lenina12", &[id]);
        check.add_errors(errors.iter().copied());
        check
    }

    #[test]
    fn test_one_failure_fails_the_requirement() {
        let mut sweep = TierSweep::new(Tier::High);
        sweep.checks.push(check("Geometry. Transforms", "2.3.21", &[]));
        sweep.checks.push(check("Geometry. Transforms", "2.3.21", &["Cube: Scale=(2, 1, 1)", "Cone: Scale=(1, 3, 1)"]));
        sweep.checks.push(check("Geometry. Duplicates", "2.3.13", &[]));

        let verdicts = sweep.verdicts();
        assert_eq!(verdicts.len(), 2);
        let transforms = &verdicts["2.3.21"];
        assert!(!transforms.verified);
        assert_eq!(transforms.error_count, 2);
        assert_eq!(
            transforms.error_text,
            "    SM_Lenina12\n        Cube: Scale=(2, 1, 1)\n        Cone: Scale=(1, 3, 1)\n"
        );
        assert!(verdicts["2.3.13"].verified);
        assert!(!sweep.passed());
        assert_eq!(sweep.error_count(), 2);
    }

    #[test]
    fn test_every_requirement_id_receives_the_outcome() {
        let mut sweep = TierSweep::new(Tier::High);
        let mut moved = Check::new("Geometry. Transforms", "SM_Lenina12", &["2.3.21", "2.9.3"]);
        moved.add_error("SM_Lenina12_Main, Location=1, 0, 0");
        sweep.checks.push(moved);
        sweep.checks.push(check("Geometry. Pivot", "2.9.3", &[]));

        let verdicts = sweep.verdicts();
        assert_eq!(verdicts.len(), 2);
        assert!(!verdicts["2.3.21"].verified);
        assert!(!verdicts["2.9.3"].verified);
        assert_eq!(verdicts["2.9.3"].error_count, 1);
    }

    #[test]
    fn test_groups_by_rule_name() {
        let mut sweep = TierSweep::new(Tier::Low);
        sweep.checks.push(check("Naming. Zip", "2.10.3.1", &[]));
        sweep.checks.push(check("FBX. Hierarchy", "2.3.5", &[]));
        sweep.checks.push(check("Naming. Zip", "2.10.3.1", &[]));
        let groups = sweep.by_rule_name();
        let names: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(names, vec!["FBX. Hierarchy", "Naming. Zip"]);
        assert_eq!(groups["Naming. Zip"].len(), 2);
        assert!(sweep.passed());
    }
}
