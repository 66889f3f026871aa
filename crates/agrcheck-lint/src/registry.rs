//! Rule registry for one tier's pipeline.

use crate::context::SweepContext;
use crate::rules::{high, low, LintRule, RuleFault, RuleInput};
use crate::sweep::TierSweep;
use agrcheck_scene::Tier;
use log::debug;
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

/// Ordered rules of one tier.
pub struct RuleRegistry {
    tier: Tier,
    rules: Vec<Box<dyn LintRule>>,
    disabled_rules: HashSet<String>,
    enabled_only: Option<HashSet<String>>,
}

impl RuleRegistry {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            rules: Vec::new(),
            disabled_rules: HashSet::new(),
            enabled_only: None,
        }
    }

    /// Creates a registry with the tier's pipeline registered in order.
    pub fn for_tier(tier: Tier) -> Self {
        let mut registry = Self::new(tier);
        let rules = match tier {
            Tier::High => high::all_rules(),
            Tier::Low => low::all_rules(),
        };
        for rule in rules {
            registry.register(rule);
        }
        registry
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Registers a rule at the end of the pipeline.
    pub fn register(&mut self, rule: Box<dyn LintRule>) {
        self.rules.push(rule);
    }

    /// Skips `rule_id` on later runs.
    pub fn disable_rule(&mut self, rule_id: &str) {
        self.disabled_rules.insert(rule_id.to_string());
    }

    /// Restricts runs to `rule_ids`.
    pub fn enable_only(&mut self, rule_ids: &[&str]) {
        self.enabled_only = Some(rule_ids.iter().map(|s| s.to_string()).collect());
    }

    pub fn rules(&self) -> &[Box<dyn LintRule>] {
        &self.rules
    }

    /// Id, description and requirement ids of every rule, in pipeline order.
    pub fn rule_metadata(&self) -> Vec<RuleMetadata> {
        self.rules
            .iter()
            .map(|r| RuleMetadata {
                id: r.id().to_string(),
                description: r.description().to_string(),
                tier: r.tier(),
                requirement_ids: r.requirement_ids().iter().map(|s| s.to_string()).collect(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        !self.disabled_rules.contains(rule_id)
            && self.enabled_only.as_ref().map_or(true, |only| only.contains(rule_id))
    }

    /// Runs every enabled rule in registration order.
    ///
    /// A rule that returns a fault or panics becomes one failed finding;
    /// the rules after it still run.
    pub fn run(&self, input: &RuleInput, ctx: &mut SweepContext) -> TierSweep {
        let mut sweep = TierSweep::new(input.tier);
        for rule in &self.rules {
            if !self.is_rule_enabled(rule.id()) {
                debug!("skipping disabled rule {}", rule.id());
                continue;
            }
            if rule.tier() != input.tier {
                continue;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.check(input))).unwrap_or_else(|payload| {
                Err(RuleFault::Panicked {
                    rule: rule.id().to_string(),
                    message: panic_message(payload.as_ref()),
                })
            });
            match outcome {
                Ok(checks) => sweep.checks.extend(checks),
                Err(fault) => {
                    ctx.rule_faulted(fault.clone());
                    sweep.record_fault(rule.as_ref(), fault);
                }
            }
            ctx.rule_completed(rule.id());
        }
        sweep
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// What `agrcheck rules` prints for one rule.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RuleMetadata {
    /// Rule identifier.
    pub id: String,
    pub description: String,
    pub tier: Tier,
    /// Requirement ids the rule decides.
    pub requirement_ids: Vec<String>,
}
