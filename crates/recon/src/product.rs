//! Sealed-product vs playable-card heuristic.
//!
//! Substring matching on the chosen name. Approximate by nature: a card
//! literally named "Booster Pack of Leadership" is misread. Both phrase lists
//! are configuration so they can be curated without a release.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Playable,
    SealedProduct,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Playable => write!(f, "playable"),
            Self::SealedProduct => write!(f, "sealed_product"),
        }
    }
}

fn default_sealed_phrases() -> Vec<String> {
    ["booster pack", "booster box", "starter deck", "deck box", "collection"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_exclusions() -> Vec<String> {
    ["leader", "elder", "full deck"].into_iter().map(String::from).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductRules {
    #[serde(default = "default_sealed_phrases")]
    pub sealed_phrases: Vec<String>,
    /// Phrases that mark a character or card name even when a sealed phrase
    /// is present.
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<String>,
}

impl Default for ProductRules {
    fn default() -> Self {
        Self {
            sealed_phrases: default_sealed_phrases(),
            exclusions: default_exclusions(),
        }
    }
}

impl ProductRules {
    pub fn classify(&self, name: Option<&str>) -> ProductType {
        let Some(name) = name else {
            return ProductType::Playable;
        };
        let lower = name.to_lowercase();
        let contains_any = |phrases: &[String]| {
            phrases
                .iter()
                .any(|p| !p.trim().is_empty() && lower.contains(&p.trim().to_lowercase()))
        };
        if contains_any(&self.sealed_phrases) && !contains_any(&self.exclusions) {
            ProductType::SealedProduct
        } else {
            ProductType::Playable
        }
    }
}
