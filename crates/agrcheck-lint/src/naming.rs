//! Name template matching.
//!
//! Templates are regular expressions built from the site address, the
//! building index and a role suffix. A name passes only when the template
//! consumes all of it.

use crate::finding::Check;
use regex::Regex;

/// Extensions normalised to lowercase before matching.
const NORMALISED_EXTENSIONS: &[&str] = &["png", "fbx", "geojson", "zip"];

/// Lowercases a known extension, leaving the stem untouched.
pub fn lower_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if NORMALISED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => {
            format!("{}.{}", stem, ext.to_lowercase())
        }
        _ => file_name.to_string(),
    }
}

/// Human-readable form of a template: digit classes become `N`, escapes
/// are dropped.
pub fn readable_mask(pattern: &str) -> String {
    let replaced = pattern.replace(r"\d{1,2}", "N").replace(r"\d", "N");
    let mut out = String::with_capacity(replaced.len());
    let mut chars = replaced.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// A compiled, fully anchored name template.
#[derive(Debug, Clone)]
pub struct NameMask {
    pattern: String,
    regex: Regex,
}

impl NameMask {
    pub fn new(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self { pattern, regex })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(&lower_extension(name))
    }

    /// Failure line for `name`.
    pub fn message(&self, name: &str) -> String {
        format!(
            "-->{}, should be {}",
            lower_extension(name),
            readable_mask(&self.pattern)
        )
    }

    /// Records a failure on `check` when `name` does not match.
    pub fn check(&self, check: &mut Check, name: &str) -> bool {
        if self.matches(name) {
            return true;
        }
        check.add_error(self.message(name));
        false
    }
}

/// Matches `name` against `pattern`, recording a failure on `check`.
pub fn check_mask(check: &mut Check, name: &str, pattern: &str) -> Result<bool, regex::Error> {
    Ok(NameMask::new(pattern)?.check(check, name))
}

/// Caps repetitive error lines: the first `limit` go through, then a
/// single ellipsis line.
#[derive(Debug, Clone)]
pub struct Throttle {
    limit: usize,
    seen: usize,
}

impl Throttle {
    pub fn new(limit: usize) -> Self {
        Self { limit, seen: 0 }
    }

    pub fn push(&mut self, check: &mut Check, error: impl Into<String>) {
        if self.seen < self.limit {
            check.add_error(error);
        } else if self.seen == self.limit {
            check.add_error("...");
        }
        self.seen += 1;
    }

    /// Runs `mask` through the throttle.
    pub fn check_mask(&mut self, check: &mut Check, mask: &NameMask, name: &str) {
        if !mask.matches(name) {
            self.push(check, mask.message(name));
        }
    }
}

/// Numbers that break a contiguous run starting at 1: the first number if
/// it is not 1, then the first number after each gap.
pub fn sequence_breaks(numbers: &[u32]) -> Vec<u32> {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    let mut breaks = Vec::new();
    if let Some(&first) = sorted.first() {
        if first != 1 {
            breaks.push(first);
        }
    }
    for pair in sorted.windows(2) {
        if pair[1] != pair[0] + 1 {
            breaks.push(pair[1]);
        }
    }
    breaks
}

/// Trailing three-digit index of a name, if any.
pub fn numeric_suffix(name: &str) -> Option<u32> {
    let start = name.len().checked_sub(3)?;
    let tail = name.get(start..)?;
    if tail.chars().all(|c| c.is_ascii_digit()) {
        tail.parse().ok()
    } else {
        None
    }
}

/// Joins at most `limit` items, marking the rest as elided.
pub fn join_capped(items: &[String], limit: usize) -> String {
    if items.len() > limit {
        format!("{}, and so on", items[..limit].join(", "))
    } else {
        items.join(", ")
    }
}
