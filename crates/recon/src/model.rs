use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::MismatchCategory;
use crate::error::DataWarning;
use crate::identifier::{self, CardId};
use crate::product::ProductType;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Provider-reported price point. Carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pricing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Pricing {
    pub fn is_empty(&self) -> bool {
        self.market.is_none() && self.low.is_none()
    }
}

/// One provider's view of one card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderRecord {
    pub identifier: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub rarity: Option<String>,
    pub set_code: Option<String>,
    pub pricing: Option<Pricing>,
}

impl ProviderRecord {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_rarity(mut self, rarity: impl Into<String>) -> Self {
        self.rarity = Some(rarity.into());
        self
    }

    pub fn with_set_code(mut self, set_code: impl Into<String>) -> Self {
        self.set_code = Some(set_code.into());
        self
    }

    /// Name if present and not blank.
    pub fn usable_name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A provider's records keyed by identifier.
pub type ProviderCollection = BTreeMap<String, ProviderRecord>;

/// Pre-loaded collections grouped by provider name.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub providers: BTreeMap<String, ProviderCollection>,
    /// `(provider, identifier)` pairs seen more than once by `with_provider`.
    /// `reconcile` refuses an input that has any.
    pub(crate) duplicates: Vec<(String, String)>,
}

impl ReconInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider<I>(mut self, provider: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = ProviderRecord>,
    {
        let provider = provider.into();
        let mut collection = ProviderCollection::new();
        for record in records {
            if collection.contains_key(&record.identifier) {
                self.duplicates.push((provider.clone(), record.identifier.clone()));
                continue;
            }
            collection.insert(record.identifier.clone(), record);
        }
        self.providers.insert(provider, collection);
        self
    }

    /// First `(provider, identifier)` given more than once, if any.
    pub fn first_duplicate(&self) -> Option<(&str, &str)> {
        self.duplicates
            .first()
            .map(|(p, id)| (p.as_str(), id.as_str()))
    }

    pub fn total_records(&self) -> usize {
        self.providers.values().map(|c| c.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The merged, canonical record for one card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterCardRecord {
    pub id: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub rarity: Option<String>,
    pub set_code: String,
    pub sources_available: BTreeMap<String, bool>,
    pub product_type: ProductType,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub prices: BTreeMap<String, Pricing>,
}

impl MasterCardRecord {
    pub fn has_source(&self, provider: &str) -> bool {
        self.sources_available.get(provider).copied().unwrap_or(false)
    }

    pub fn present_in(&self) -> Vec<String> {
        self.sources_available
            .iter()
            .filter(|(_, present)| **present)
            .map(|(p, _)| p.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MismatchRecord {
    pub identifier: String,
    pub names: BTreeMap<String, Option<String>>,
    pub normalized: BTreeMap<String, String>,
    pub category: MismatchCategory,
    pub set_code: String,
}

/// Raw per-set counts. Percentages are derived by the coverage document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageStat {
    pub total: usize,
    pub providers: BTreeMap<String, usize>,
    pub all_providers: usize,
}

/// High-value card missing from the watched provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedCard {
    pub identifier: String,
    pub set_code: String,
    pub name: Option<String>,
    pub rarity: String,
    pub missing_provider: String,
    pub present_in: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total_records: usize,
    pub universe: usize,
    pub out_of_scope: usize,
    pub malformed_identifiers: usize,
    pub missing_names: usize,
    pub unrecognized_rarities: usize,
    pub set_code_disagreements: usize,
    pub mismatches: usize,
    pub flagged: usize,
    pub in_all_providers: usize,
}

/// Everything one reconciliation pass produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconOutput {
    pub providers: Vec<String>,
    pub cards: BTreeMap<CardId, MasterCardRecord>,
    pub mismatches: Vec<MismatchRecord>,
    pub coverage: BTreeMap<String, CoverageStat>,
    pub flagged: Vec<FlaggedCard>,
    pub warnings: Vec<DataWarning>,
    pub summary: ValidationSummary,
}

impl ReconOutput {
    /// Master record by raw identifier.
    pub fn card(&self, identifier: &str) -> Option<&MasterCardRecord> {
        let id = identifier::parse(identifier).ok()?;
        self.cards.get(&id)
    }
}
