//! Rules command implementation
//!
//! Lists the rule set of each tier in pipeline order with the requirement
//! ids every rule decides.

use agrcheck_lint::{RuleMetadata, RuleRegistry};
use agrcheck_scene::Tier;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;

/// Rules of one tier, in pipeline order.
#[derive(Debug, Clone, Serialize)]
pub struct TierRules {
    pub tier: Tier,
    pub rules: Vec<RuleMetadata>,
}

pub fn collect() -> Vec<TierRules> {
    [Tier::High, Tier::Low]
        .into_iter()
        .map(|tier| TierRules {
            tier,
            rules: RuleRegistry::for_tier(tier).rule_metadata(),
        })
        .collect()
}

/// Run the rules command.
pub fn run(json: bool) -> Result<ExitCode> {
    let tiers = collect();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tiers).context("Failed to serialize rule list")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    for tier in &tiers {
        println!("{} ({} rules)", tier.tier.title().bold(), tier.rules.len());
        for rule in &tier.rules {
            println!(
                "  {:<28} {} [{}]",
                rule.id.cyan(),
                rule.description,
                rule.requirement_ids.join(", ")
            );
        }
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_lists_both_tiers() {
        let tiers = collect();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].tier, Tier::High);
        assert_eq!(tiers[1].tier, Tier::Low);
        assert!(tiers
            .iter()
            .flat_map(|t| &t.rules)
            .all(|r| !r.requirement_ids.is_empty()));
    }
}
