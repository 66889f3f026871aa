//! Findings produced by rule invocations.

use serde::{Deserialize, Serialize};

/// The result of one rule invocation against one file or object scope.
///
/// A check starts verified and flips to failed on its first error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    /// Human-readable rule name, shared by all checks of a rule family.
    pub rule_name: String,
    /// Directory, file or object the check covers.
    pub context: String,
    /// Requirement ids this check decides. Every id receives its outcome.
    pub requirement_ids: Vec<String>,
    pub verified: bool,
    pub errors: Vec<String>,
    /// How many items (objects, polygons, files) were inspected.
    pub checked_count: usize,
}

impl Check {
    pub fn new(rule_name: impl Into<String>, context: impl Into<String>, requirement_ids: &[&str]) -> Self {
        Self {
            rule_name: rule_name.into(),
            context: context.into(),
            requirement_ids: requirement_ids.iter().map(|s| s.to_string()).collect(),
            verified: true,
            errors: Vec::new(),
            checked_count: 0,
        }
    }

    /// Builder method to set the checked count.
    pub fn with_checked(mut self, count: usize) -> Self {
        self.checked_count = count;
        self
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.verified = false;
        self.errors.push(error.into());
    }

    pub fn add_errors<I, S>(&mut self, errors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for error in errors {
            self.add_error(error);
        }
    }

    /// Marks one more item as inspected.
    pub fn inspect(&mut self) {
        self.checked_count += 1;
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// First requirement id, the one a rule reports the check under.
    pub fn primary_id(&self) -> Option<&str> {
        self.requirement_ids.first().map(String::as_str)
    }

    /// Context line followed by one indented line per error.
    pub fn error_text(&self) -> String {
        let mut text = format!("    {}\n", self.context);
        for error in &self.errors {
            text.push_str(&format!("        {}\n", error));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_error_flips_verified() {
        let mut check = Check::new("Collision. Convexity", "SM_A_001", &["2.13.1"]);
        assert!(check.verified);
        check.add_error("UCX_SM_A_001_Main_002");
        check.add_error("UCX_SM_A_001_Main_003");
        assert!(!check.verified);
        assert_eq!(check.error_count(), 2);
        assert_eq!(check.primary_id(), Some("2.13.1"));
    }

    #[test]
    fn test_error_text_layout() {
        let mut check = Check::new("Files. Format", "bundle", &["2.1.2"]);
        check.add_errors(["a.txt", "b.doc"]);
        assert_eq!(check.error_text(), "    bundle\n        a.txt\n        b.doc\n");
    }
}
