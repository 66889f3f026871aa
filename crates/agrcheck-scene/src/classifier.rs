//! Functional-use (FNO) classifier: a `;`-separated code to name table.
//!
//! Codes come in three lengths. A code of `n` digits (spaces ignored) is
//! looked up in column `n / 3 * 2 - 1`; its name sits in the column before.

use crate::error::SceneError;

/// Result of a classifier lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FnoLookup {
    /// The code does not have 3, 6 or 9 digits.
    Malformed,
    /// No row carries the code.
    NotFound,
    /// Names of every row carrying the code.
    Found(Vec<String>),
}

/// In-memory classifier table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FnoClassifier {
    rows: Vec<Vec<String>>,
}

/// Removes every space from a code or name before comparison.
pub fn strip_spaces(text: &str) -> String {
    text.chars().filter(|c| *c != ' ').collect()
}

impl FnoClassifier {
    /// Parses the table. A UTF-8 byte order mark is skipped; blank lines
    /// are ignored.
    pub fn from_csv(text: &str) -> Result<Self, SceneError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut rows = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row: Vec<String> = line
                .split(';')
                .map(|cell| cell.trim_matches('"').to_string())
                .collect();
            if row.len() < 2 {
                return Err(SceneError::Classifier {
                    line: index + 1,
                    message: "expected at least two ';'-separated columns".to_string(),
                });
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn lookup(&self, code: &str) -> FnoLookup {
        let code = strip_spaces(code);
        let column = match code.len() {
            3 | 6 | 9 => code.len() / 3 * 2 - 1,
            _ => return FnoLookup::Malformed,
        };
        let names: Vec<String> = self
            .rows
            .iter()
            .filter(|row| row.get(column).is_some_and(|cell| strip_spaces(cell) == code))
            .map(|row| row[column - 1].clone())
            .collect();
        if names.is_empty() {
            FnoLookup::NotFound
        } else {
            FnoLookup::Found(names)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\u{feff}Residential;020;;;;\n\
                         Residential;020;Apartment houses;020 001;;\n\
                         Residential;020;Apartment houses;020 001;Mid-rise;020 001 003\n";

    #[test]
    fn test_lookup_by_code_length() {
        let classifier = FnoClassifier::from_csv(TABLE).unwrap();
        assert_eq!(classifier.len(), 3);
        assert_eq!(
            classifier.lookup("020"),
            FnoLookup::Found(vec!["Residential".to_string(); 3])
        );
        assert_eq!(
            classifier.lookup("020 001"),
            FnoLookup::Found(vec!["Apartment houses".to_string(); 2])
        );
        assert_eq!(
            classifier.lookup("020001003"),
            FnoLookup::Found(vec!["Mid-rise".to_string()])
        );
    }

    #[test]
    fn test_short_code_not_found_in_wrong_column() {
        let classifier = FnoClassifier::from_csv(TABLE).unwrap();
        assert_eq!(classifier.lookup("999"), FnoLookup::NotFound);
        assert_eq!(classifier.lookup("12 34"), FnoLookup::Malformed);
    }

    #[test]
    fn test_single_column_row_rejected() {
        let err = FnoClassifier::from_csv("only-one-column\n").unwrap_err();
        assert!(matches!(err, SceneError::Classifier { line: 1, .. }));
    }
}
