//! Author normalization and team mapping for git statistics.
//!
//! The teams file irons out the many spellings one person accumulates in
//! commit metadata (diacritics, work vs. personal addresses) and maps the
//! normalized names onto teams.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The teams file: ordered replacements plus team membership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teams {
    /// Applied to every author line, in order, before any counting.
    #[serde(default)]
    pub normalizing_replacements: Vec<Replacement>,
    /// Team name to member name fragments.
    #[serde(default)]
    pub team_mappings: HashMap<String, Vec<String>>,
}

/// One find-and-replace rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
    pub find: String,
    pub replace_with: String,
}

impl Teams {
    /// Load and parse a teams file.
    pub fn load(path: &Path) -> Result<Teams> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read teams file {}", path.display()))?;
        let teams: Teams = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse teams file {}", path.display()))?;
        Ok(teams)
    }

    /// Apply every replacement, in order, to an author line.
    pub fn normalize(&self, author: &str) -> String {
        self.normalizing_replacements
            .iter()
            .fold(author.to_string(), |text, rule| {
                text.replace(&rule.find, &rule.replace_with)
            })
    }

    /// Team a normalized author belongs to, if any mapping lists a
    /// fragment of their name.
    pub fn team_of(&self, author: &str) -> Option<&str> {
        self.team_mappings
            .iter()
            .find(|(_, members)| members.iter().any(|member| author.contains(member.as_str())))
            .map(|(team, _)| team.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Teams {
        serde_json::from_str(
            r#"{
                "normalizingReplacements": [
                    { "find": "ó", "replaceWith": "o" },
                    { "find": "jdoe@old.example", "replaceWith": "jdoe@example.com" }
                ],
                "teamMappings": {
                    "platform": ["Jane Doe"],
                    "web": ["Ramón"]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn replacements_apply_in_order() {
        let teams = sample();
        assert_eq!(
            teams.normalize("Ramón <jdoe@old.example>"),
            "Ramon <jdoe@example.com>"
        );
    }

    #[test]
    fn team_lookup_matches_name_fragments() {
        let teams = sample();
        assert_eq!(teams.team_of("Jane Doe <jane@example.com>"), Some("platform"));
        assert_eq!(teams.team_of("Stranger <s@example.com>"), None);
    }

    #[test]
    fn empty_file_sections_are_fine() {
        let teams: Teams = serde_json::from_str("{}").unwrap();
        assert_eq!(teams.normalize("As-Is <a@b.c>"), "As-Is <a@b.c>");
        assert_eq!(teams.team_of("As-Is <a@b.c>"), None);
    }
}
