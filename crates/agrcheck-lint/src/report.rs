//! Report data assembly.
//!
//! Turns a checklist and the sweep behind it into an ordered structure a
//! writer can render: a header, one entry per requirement (categories
//! alphabetical, items in catalogue order) and a summary line per rule
//! name.

use crate::checklist::{CheckState, Checklist};
use crate::sweep::TierSweep;
use agrcheck_scene::Tier;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Error lines kept per requirement; the rest is summarised in one line.
pub const MAX_ERROR_LINES: usize = 200;

/// Width of the dotted rule name column in the text summary.
const RULE_COLUMN: usize = 70;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub tier: Tier,
    pub title: String,
    pub address: String,
    /// Share of verified requirements, rounded.
    pub conformance_percent: u32,
    pub automatic_percent: u32,
    pub manual_percent: u32,
    /// Requirement ids nobody decided yet.
    pub not_checked: Vec<String>,
}

/// One requirement line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub category: String,
    pub requirement_id: String,
    pub name: String,
    pub state: CheckState,
    pub automatic: bool,
    pub error_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl ReportEntry {
    pub fn passed(&self) -> bool {
        self.state == CheckState::Verified
    }
}

/// Outcome of every finding sharing one rule name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub rule_name: String,
    pub passed: bool,
    pub checked_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportData {
    pub header: ReportHeader,
    pub entries: Vec<ReportEntry>,
    pub rules: Vec<RuleSummary>,
    /// blake3 of the automatic verdicts, hex encoded.
    pub digest: String,
}

impl ReportData {
    pub fn new(checklist: &Checklist, sweep: Option<&TierSweep>, address: &str) -> Self {
        let progress = checklist.progress();
        let header = ReportHeader {
            tier: checklist.tier,
            title: checklist.tier.title().to_string(),
            address: address.to_string(),
            conformance_percent: progress.percent(),
            automatic_percent: progress.automatic_percent(),
            manual_percent: progress.manual_percent(),
            not_checked: checklist.not_checked().into_iter().map(String::from).collect(),
        };

        let mut categories: Vec<_> = checklist.categories.iter().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        let entries = categories
            .into_iter()
            .flat_map(|c| c.items.iter())
            .map(|item| ReportEntry {
                category: item.category.clone(),
                requirement_id: item.requirement_id.clone(),
                name: item.name.clone(),
                state: item.check_state,
                automatic: item.is_automatic,
                error_lines: capped_lines(&item.error_text),
                comment: item.user_comment.clone(),
            })
            .collect();

        let rules = sweep
            .map(|sweep| {
                sweep
                    .by_rule_name()
                    .into_iter()
                    .map(|(name, checks)| RuleSummary {
                        rule_name: name.to_string(),
                        passed: checks.iter().all(|c| c.verified),
                        checked_count: checks.iter().map(|c| c.checked_count).sum(),
                        error_count: checks.iter().map(|c| c.error_count()).sum(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut report = Self {
            header,
            entries,
            rules,
            digest: String::new(),
        };
        report.digest = report.compute_digest();
        report
    }

    /// Hash over the automatic states and error texts. Comments, manual
    /// states and progress do not take part.
    pub fn compute_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.header.tier.to_string().as_bytes());
        for entry in self.entries.iter().filter(|e| e.automatic) {
            hasher.update(entry.requirement_id.as_bytes());
            hasher.update(&[0]);
            hasher.update(format!("{:?}", entry.state).as_bytes());
            for line in &entry.error_lines {
                hasher.update(&[0]);
                hasher.update(line.as_bytes());
            }
            hasher.update(&[1]);
        }
        hasher.finalize().to_hex().to_string()
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn failed(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.state == CheckState::Failed)
    }

    /// True when no automatic requirement failed.
    pub fn automatic_passed(&self) -> bool {
        !self.failed().any(|e| e.automatic)
    }

    /// Plain text rendering: header, rule summary, then every failed
    /// requirement with its error lines.
    pub fn render_text(&self) -> String {
        let header = &self.header;
        let mut out = String::new();
        let _ = writeln!(out, "{:-^77}", header.title);
        if !header.address.is_empty() {
            let _ = writeln!(out, "Address: {}", header.address);
        }
        let _ = writeln!(
            out,
            "{} model meets the requirements by {}% (automatic {}%, manual {}%)",
            header.title, header.conformance_percent, header.automatic_percent, header.manual_percent
        );
        if !header.not_checked.is_empty() {
            let _ = writeln!(
                out,
                "{}. Every requirement checked except - {}",
                header.title,
                header.not_checked.join(", ")
            );
        }

        if !self.rules.is_empty() {
            let _ = writeln!(out, "\nChecks:");
            for rule in &self.rules {
                let _ = writeln!(
                    out,
                    "{:.<width$}{:<6} (checked: {}, errors: {})",
                    rule.rule_name,
                    rule.passed,
                    rule.checked_count,
                    rule.error_count,
                    width = RULE_COLUMN
                );
            }
        }

        let _ = writeln!(out, "\nErrors:");
        for (n, entry) in self.failed().enumerate() {
            let _ = writeln!(
                out,
                "----Error {}. Requirement {}. {}",
                n + 1,
                entry.requirement_id,
                entry.name
            );
            for line in &entry.error_lines {
                let _ = writeln!(out, "{}", line);
            }
            if !entry.comment.is_empty() {
                let _ = writeln!(out, "----Comment:\n{}", entry.comment);
            }
        }
        let _ = writeln!(out, "{}", "-".repeat(77));
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn capped_lines(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = lines.iter().take(MAX_ERROR_LINES).map(|l| l.to_string()).collect();
    if lines.len() > MAX_ERROR_LINES {
        out.push(format!("    ... and {} more lines", lines.len() - MAX_ERROR_LINES));
    }
    out
}
