//! Lint rule trait and the per-tier rule modules.

use crate::finding::Check;
use crate::naming::NameMask;
use agrcheck_scene::{
    BundleEntry, ClassifiedFile, FnoClassifier, ModelFile, SceneSnapshot, Tier, TierProfile,
};
use log::warn;
use serde::{Deserialize, Serialize};

pub mod common;
pub mod high;
pub mod low;

/// Everything a rule may look at during one tier sweep.
///
/// Built once per sweep; rules only read it.
pub struct RuleInput<'a> {
    pub tier: Tier,
    /// Files of this tier with roles resolved.
    pub files: Vec<ClassifiedFile<'a>>,
    /// Every on-disk entry of the bundle.
    pub bundle: &'a [BundleEntry],
    pub root_name: &'a str,
    pub profile: &'a TierProfile,
    pub classifier: Option<&'a FnoClassifier>,
    /// Site address used to build name templates. Empty when it could not
    /// be derived.
    pub address: String,
    /// Number of building archives in the bundle.
    pub oks_count: usize,
}

impl<'a> RuleInput<'a> {
    pub fn new(snapshot: &'a SceneSnapshot, tier: Tier, profile: &'a TierProfile) -> Self {
        let models = snapshot.files(tier);
        let address = snapshot
            .address
            .clone()
            .filter(|a| !a.is_empty())
            .or_else(|| derive_address(models, tier))
            .unwrap_or_else(|| {
                warn!("no ground file among {} {} files, site address unknown", models.len(), tier);
                String::new()
            });
        Self {
            tier,
            files: models.iter().map(ClassifiedFile::new).collect(),
            bundle: &snapshot.bundle_entries,
            root_name: &snapshot.root_name,
            profile,
            classifier: None,
            address,
            oks_count: snapshot.oks_count(),
        }
    }

    /// Builder method to attach the functional-use classifier.
    pub fn with_classifier(mut self, classifier: Option<&'a FnoClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// True when the site has more than one building archive.
    pub fn is_multi_building(&self) -> bool {
        self.oks_count > 1
    }
}

/// Middle `_`-separated segments of a name: `0001_Lenina_12_Ground` gives
/// `Lenina_12`.
pub fn inner_segments(name: &str) -> String {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() <= 2 {
        return String::new();
    }
    parts[1..parts.len() - 1].join("_")
}

/// Derives the site address from the ground file name of a tier.
///
/// The last matching file wins.
pub fn derive_address(files: &[ModelFile], tier: Tier) -> Option<String> {
    files
        .iter()
        .filter(|f| {
            let name = f.name().to_lowercase();
            name.contains("ground") && (tier == Tier::Low || !name.contains("light"))
        })
        .last()
        .map(|f| match tier {
            Tier::High => f.name().replace("_Ground", "").replace("SM_", ""),
            Tier::Low => inner_segments(f.name()),
        })
}

/// A conformance rule that inspects one tier of a scene and reports checks.
pub trait LintRule: Send + Sync {
    /// Unique identifier (e.g., "high/transforms", "low/naming").
    fn id(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Tier this rule belongs to.
    fn tier(&self) -> Tier;

    /// Requirement ids the rule decides, in the order its checks carry
    /// them.
    fn requirement_ids(&self) -> &'static [&'static str];

    /// Runs the rule. Data problems become check errors; only faults of the
    /// rule itself are returned as `Err`.
    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault>;
}

/// A rule that could not finish.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RuleFault {
    /// The rule returned an error.
    #[error("rule {rule} failed: {message}")]
    Internal { rule: String, message: String },

    /// The rule panicked and was stopped at the sweep boundary.
    #[error("rule {rule} panicked: {message}")]
    Panicked { rule: String, message: String },
}

impl RuleFault {
    pub fn internal(rule: impl Into<String>, message: impl Into<String>) -> Self {
        RuleFault::Internal {
            rule: rule.into(),
            message: message.into(),
        }
    }

    pub fn rule(&self) -> &str {
        match self {
            RuleFault::Internal { rule, .. } | RuleFault::Panicked { rule, .. } => rule,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RuleFault::Internal { message, .. } | RuleFault::Panicked { message, .. } => message,
        }
    }
}

/// Compiles a name template, reporting a bad template as a fault of `rule`.
pub(crate) fn mask(rule: &str, pattern: impl Into<String>) -> Result<NameMask, RuleFault> {
    let pattern = pattern.into();
    NameMask::new(pattern.as_str())
        .map_err(|e| RuleFault::internal(rule, format!("invalid name template {}: {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inner_segments() {
        assert_eq!(inner_segments("0001_Lenina_12_Ground"), "Lenina_12");
        assert_eq!(inner_segments("0001_Ground"), "");
        assert_eq!(inner_segments("Ground"), "");
    }

    #[test]
    fn test_derive_high_address() {
        let files = vec![
            ModelFile::new("SM_Lenina12_Ground_Light.fbx"),
            ModelFile::new("SM_Lenina12_Ground.fbx"),
            ModelFile::new("SM_Lenina12_001.fbx"),
        ];
        assert_eq!(derive_address(&files, Tier::High), Some("Lenina12".to_string()));
    }

    #[test]
    fn test_derive_low_address() {
        let files = vec![
            ModelFile::new("0001_Lenina12_01.fbx"),
            ModelFile::new("0001_Lenina12_Ground.fbx"),
        ];
        assert_eq!(derive_address(&files, Tier::Low), Some("Lenina12".to_string()));
        assert_eq!(derive_address(&files[..1], Tier::Low), None);
    }

    #[test]
    fn test_snapshot_address_wins() {
        let snapshot = SceneSnapshot {
            high_files: vec![ModelFile::new("SM_Lenina12_Ground.fbx")],
            address: Some("Mira5".to_string()),
            ..Default::default()
        };
        let profile = TierProfile::default();
        let input = RuleInput::new(&snapshot, Tier::High, &profile);
        assert_eq!(input.address, "Mira5");
        assert_eq!(input.files.len(), 1);
    }

    #[test]
    fn test_fault_accessors() {
        let fault = RuleFault::internal("high/naming", "boom");
        assert_eq!(fault.rule(), "high/naming");
        assert_eq!(fault.message(), "boom");
        assert_eq!(fault.to_string(), "rule high/naming failed: boom");
    }
}
