//! Name-mismatch classification.
//!
//! Categories overlap before normalization, so the order in
//! [`MismatchCategory::PRIORITY`] is part of the contract: the first category
//! whose predicate holds wins.

use serde::Serialize;

use crate::normalize::{lowercase, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchCategory {
    CaseDifference,
    PunctuationDifference,
    SubtitleDifference,
    WordOrderDifference,
    SignificantDifference,
}

impl std::fmt::Display for MismatchCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CaseDifference => write!(f, "case_difference"),
            Self::PunctuationDifference => write!(f, "punctuation_difference"),
            Self::SubtitleDifference => write!(f, "subtitle_difference"),
            Self::WordOrderDifference => write!(f, "word_order_difference"),
            Self::SignificantDifference => write!(f, "significant_difference"),
        }
    }
}

/// Both names with their derived forms, computed once per comparison.
pub struct NamePair<'a> {
    pub a: &'a str,
    pub b: &'a str,
    lower_a: String,
    lower_b: String,
    norm_a: String,
    norm_b: String,
}

impl<'a> NamePair<'a> {
    pub fn new(a: &'a str, b: &'a str) -> Self {
        Self {
            a,
            b,
            lower_a: lowercase(a),
            lower_b: lowercase(b),
            norm_a: normalize(a),
            norm_b: normalize(b),
        }
    }
}

const SUBTITLE_SEPARATOR: &str = " - ";

impl MismatchCategory {
    /// Evaluation order. First match wins.
    pub const PRIORITY: [MismatchCategory; 5] = [
        Self::CaseDifference,
        Self::PunctuationDifference,
        Self::SubtitleDifference,
        Self::WordOrderDifference,
        Self::SignificantDifference,
    ];

    /// This category's own predicate, ignoring priority.
    pub fn matches(self, pair: &NamePair<'_>) -> bool {
        match self {
            Self::CaseDifference => pair.norm_a == pair.norm_b && pair.lower_a == pair.lower_b,
            Self::PunctuationDifference => {
                pair.norm_a == pair.norm_b && pair.lower_a != pair.lower_b
            }
            Self::SubtitleDifference => {
                pair.a.contains(SUBTITLE_SEPARATOR) || pair.b.contains(SUBTITLE_SEPARATOR)
            }
            Self::WordOrderDifference => sorted_words(&pair.norm_a) == sorted_words(&pair.norm_b),
            Self::SignificantDifference => true,
        }
    }
}

fn sorted_words(normalized: &str) -> Vec<&str> {
    let mut words: Vec<&str> = normalized.split_whitespace().collect();
    words.sort_unstable();
    words
}

/// Classify two differing raw names.
pub fn classify(name_a: &str, name_b: &str) -> MismatchCategory {
    let pair = NamePair::new(name_a, name_b);
    MismatchCategory::PRIORITY
        .into_iter()
        .find(|category| category.matches(&pair))
        .unwrap_or(MismatchCategory::SignificantDifference)
}
