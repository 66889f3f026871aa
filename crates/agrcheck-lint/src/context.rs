//! Per-sweep context: timing, fault logging and aggregation diagnostics.

use crate::rules::RuleFault;
use agrcheck_scene::Tier;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Something the sweep or the aggregation noticed that is not a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A rule could not finish; its requirement ids were demoted to manual.
    RuleFault { tier: Tier, fault: RuleFault },
    /// An automatic catalogue item no rule produced.
    UnusedRequirement { tier: Tier, requirement_id: String },
    /// A finding whose requirement id is not in the catalogue.
    UnknownRequirement {
        tier: Tier,
        requirement_id: String,
        rule_name: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RuleFault { tier, fault } => write!(f, "[{}] {}", tier, fault),
            Diagnostic::UnusedRequirement { tier, requirement_id } => {
                write!(f, "[{}] requirement {} is automatic but no rule checks it", tier, requirement_id)
            }
            Diagnostic::UnknownRequirement {
                tier,
                requirement_id,
                rule_name,
            } => write!(
                f,
                "[{}] {} reports requirement {} which is not in the catalogue",
                tier, rule_name, requirement_id
            ),
        }
    }
}

/// Lives for exactly one tier sweep.
#[derive(Debug)]
pub struct SweepContext {
    tier: Tier,
    started: Instant,
    diagnostics: Vec<Diagnostic>,
}

impl SweepContext {
    pub fn new(tier: Tier) -> Self {
        debug!("{} sweep started", tier);
        Self {
            tier,
            started: Instant::now(),
            diagnostics: Vec::new(),
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Seconds since the sweep started, rounded to hundredths.
    pub fn elapsed_secs(&self) -> f64 {
        (self.started.elapsed().as_secs_f64() * 100.0).round() / 100.0
    }

    pub fn rule_completed(&self, name: &str) {
        debug!("completed rule - {}, timestamp={}s", name, self.elapsed_secs());
    }

    pub fn rule_faulted(&mut self, fault: RuleFault) {
        warn!("{} sweep: {}", self.tier, fault);
        self.diagnostics.push(Diagnostic::RuleFault { tier: self.tier, fault });
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Ends the sweep, handing over what was collected.
    pub fn finish(self) -> Vec<Diagnostic> {
        debug!(
            "{} sweep finished in {}s with {} diagnostics",
            self.tier,
            self.elapsed_secs(),
            self.diagnostics.len()
        );
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_faults_are_collected() {
        let mut ctx = SweepContext::new(Tier::Low);
        ctx.rule_completed("low/naming");
        ctx.rule_faulted(RuleFault::internal("low/texel", "bad template"));
        assert_eq!(ctx.diagnostics().len(), 1);
        let diagnostics = ctx.finish();
        assert_eq!(diagnostics[0].to_string(), "[low] rule low/texel failed: bad template");
    }

    #[test]
    fn test_diagnostic_text() {
        let unused = Diagnostic::UnusedRequirement {
            tier: Tier::High,
            requirement_id: "2.3.21".to_string(),
        };
        assert_eq!(unused.to_string(), "[high] requirement 2.3.21 is automatic but no rule checks it");
    }
}
