//! Rarity vocabulary normalization.
//!
//! Providers disagree on spelling ("Super Rare" vs "super_rare"). The fix-ups
//! live in a substitution table so a new variant is a config line, not a code
//! change. Unknown tokens pass through lowercased and trimmed.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

fn default_substitutions() -> BTreeMap<String, String> {
    BTreeMap::from([("super rare".to_string(), "super_rare".to_string())])
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RarityTable {
    /// Lowercased raw token → canonical token. Merged over the defaults.
    #[serde(default)]
    pub substitutions: BTreeMap<String, String>,
    /// Canonical tokens considered recognized. Empty disables the check.
    #[serde(default)]
    pub known: BTreeSet<String>,
}

impl Default for RarityTable {
    fn default() -> Self {
        Self {
            substitutions: default_substitutions(),
            known: BTreeSet::new(),
        }
    }
}

impl RarityTable {
    /// Add the built-in substitutions under any configured ones, and bring
    /// keys and the vocabulary into the same trimmed-lowercase form that
    /// lookups use.
    pub fn prepared(self) -> Self {
        let mut substitutions = default_substitutions();
        for (raw, canonical) in self.substitutions {
            substitutions.insert(raw.trim().to_lowercase(), canonical.trim().to_lowercase());
        }
        let known = self.known.iter().map(|k| k.trim().to_lowercase()).collect();
        Self { substitutions, known }
    }

    /// Canonical rarity token, or `None` for absent/blank input.
    pub fn normalize(&self, raw: Option<&str>) -> Option<String> {
        let token = raw?.trim().to_lowercase();
        if token.is_empty() {
            return None;
        }
        Some(self.substitutions.get(&token).cloned().unwrap_or(token))
    }

    /// Whether a canonical token is part of the configured vocabulary.
    pub fn is_known(&self, canonical: &str) -> bool {
        self.known.is_empty() || self.known.contains(canonical)
    }
}

/// `normalize` against the built-in table.
pub fn normalize_rarity(raw: Option<&str>) -> Option<String> {
    RarityTable::default().normalize(raw)
}
