//! Card identifiers: `<set_code>-<number>` parsing and scope membership.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ReconError;

/// A parsed card identifier. The raw form is kept so output keys are exactly
/// what providers sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardId {
    pub raw: String,
    pub set_code: String,
    pub number: String,
}

impl CardId {
    /// `(unnumbered, leading number, suffix)`: cards with a numeric prefix sort
    /// by that number first, anything else sorts after them lexicographically.
    fn number_key(&self) -> (bool, u64, &str) {
        let digits = self.number.bytes().take_while(u8::is_ascii_digit).count();
        match self.number[..digits].parse::<u64>() {
            Ok(n) => (false, n, &self.number[digits..]),
            Err(_) => (true, 0, self.number.as_str()),
        }
    }
}

/// Set code first, then card number.
impl Ord for CardId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.set_code
            .cmp(&other.set_code)
            .then_with(|| self.number_key().cmp(&other.number_key()))
            .then_with(|| self.number.cmp(&other.number))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for CardId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Serialized as the raw identifier so maps keyed by `CardId` keep
/// identifier order in JSON.
impl Serialize for CardId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Split an identifier on its first `-`. Both halves must be non-empty.
pub fn parse(identifier: &str) -> Result<CardId, ReconError> {
    let trimmed = identifier.trim();
    match trimmed.split_once('-') {
        Some((set_code, number)) if !set_code.is_empty() && !number.is_empty() => Ok(CardId {
            raw: trimmed.to_string(),
            set_code: set_code.to_string(),
            number: number.to_string(),
        }),
        _ => Err(ReconError::MalformedIdentifier(identifier.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Which set codes a run reconciles.
///
/// In TOML either the keyword `"all"` or a list of set codes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "ScopeRepr")]
pub enum Scope {
    #[default]
    All,
    Sets(BTreeSet<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScopeRepr {
    Keyword(String),
    Sets(Vec<String>),
}

impl TryFrom<ScopeRepr> for Scope {
    type Error = String;

    fn try_from(repr: ScopeRepr) -> Result<Self, Self::Error> {
        match repr {
            ScopeRepr::Keyword(k) => Scope::parse(&k),
            ScopeRepr::Sets(sets) => Ok(Scope::from_sets(sets)),
        }
    }
}

impl Scope {
    pub fn from_sets<I, S>(sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scope::Sets(sets.into_iter().map(Into::into).collect())
    }

    /// Parse `all` or a comma-separated list of set codes.
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Ok(Scope::All);
        }
        let sets: BTreeSet<String> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if sets.is_empty() {
            return Err(format!("scope must be \"all\" or a list of set codes, got \"{value}\""));
        }
        Ok(Scope::Sets(sets))
    }

    pub fn contains(&self, set_code: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Sets(sets) => sets.contains(set_code),
        }
    }
}

pub fn is_in_scope(set_code: &str, scope: &Scope) -> bool {
    scope.contains(set_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_core_identifier() {
        let id = parse("009-229").unwrap();
        assert_eq!(id.set_code, "009");
        assert_eq!(id.number, "229");
        assert_eq!(id.to_string(), "009-229");
    }

    #[test]
    fn parse_splits_on_first_separator_only() {
        let id = parse("P1-12-a").unwrap();
        assert_eq!(id.set_code, "P1");
        assert_eq!(id.number, "12-a");
    }

    #[test]
    fn parse_rejects_missing_separator() {
        for bad in ["", "001229", "-229", "001-", "   "] {
            let err = parse(bad).unwrap_err();
            assert!(matches!(err, ReconError::MalformedIdentifier(_)), "{bad:?}");
        }
    }

    #[test]
    fn ordering_is_numeric_within_set() {
        let mut ids: Vec<CardId> = ["001-10", "002-1", "001-9", "001-9a", "001-x"]
            .iter()
            .map(|s| parse(s).unwrap())
            .collect();
        ids.sort();
        let raw: Vec<&str> = ids.iter().map(|i| i.raw.as_str()).collect();
        assert_eq!(raw, vec!["001-9", "001-9a", "001-10", "001-x", "002-1"]);
    }

    #[test]
    fn scope_membership() {
        let core = Scope::from_sets(["001", "002"]);
        assert!(is_in_scope("001", &core));
        assert!(!is_in_scope("P1", &core));
        assert!(is_in_scope("P1", &Scope::All));
    }

    #[test]
    fn scope_parse_keyword_and_list() {
        assert_eq!(Scope::parse("ALL").unwrap(), Scope::All);
        assert_eq!(Scope::parse("001, 002").unwrap(), Scope::from_sets(["001", "002"]));
        assert!(Scope::parse(" , ").is_err());
    }
}
