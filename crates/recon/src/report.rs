//! Persisted document shapes built from a [`ReconOutput`].
//!
//! Document builders take `created_at` from the caller so identical inputs
//! always serialize to identical bytes apart from that one field.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::coverage::{overall, percent};
use crate::error::ReconError;
use crate::identifier::CardId;
use crate::model::{
    CoverageStat, FlaggedCard, MasterCardRecord, MismatchRecord, ReconOutput, ValidationSummary,
};
use crate::product::ProductType;

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ---------------------------------------------------------------------------
// Master database
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MasterMetadata {
    pub created_at: String,
    pub engine_version: String,
    pub providers: Vec<String>,
    pub total_cards: usize,
    pub playable_count: usize,
    pub product_count: usize,
    pub source_counts: BTreeMap<String, usize>,
    /// Hex SHA-256 over the canonical JSON of all cards.
    pub fingerprint: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MasterDocument {
    pub metadata: MasterMetadata,
    pub playable_cards: BTreeMap<CardId, MasterCardRecord>,
    pub market_products: BTreeMap<CardId, MasterCardRecord>,
}

/// SHA-256 of the serialized card map. Stable across runs because every map
/// in a card is ordered.
pub fn fingerprint(cards: &BTreeMap<CardId, MasterCardRecord>) -> Result<String, ReconError> {
    let bytes = serde_json::to_vec(cards)
        .map_err(|e| ReconError::InvariantViolation(format!("cards do not serialize: {e}")))?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

pub fn master_document(
    output: &ReconOutput,
    created_at: DateTime<Utc>,
) -> Result<MasterDocument, ReconError> {
    let (market_products, playable_cards): (BTreeMap<_, _>, BTreeMap<_, _>) = output
        .cards
        .iter()
        .map(|(id, card)| (id.clone(), card.clone()))
        .partition(|(_, card)| card.product_type == ProductType::SealedProduct);

    let mut source_counts: BTreeMap<String, usize> =
        output.providers.iter().map(|p| (p.clone(), 0)).collect();
    for card in output.cards.values() {
        for provider in card.present_in() {
            *source_counts.entry(provider).or_insert(0) += 1;
        }
    }

    Ok(MasterDocument {
        metadata: MasterMetadata {
            created_at: timestamp(created_at),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            providers: output.providers.clone(),
            total_cards: output.cards.len(),
            playable_count: playable_cards.len(),
            product_count: market_products.len(),
            source_counts,
            fingerprint: fingerprint(&output.cards)?,
        },
        playable_cards,
        market_products,
    })
}

// ---------------------------------------------------------------------------
// Mismatch report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MismatchMetadata {
    pub created_at: String,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MismatchReport {
    pub metadata: MismatchMetadata,
    pub by_category: BTreeMap<String, usize>,
    pub by_set: BTreeMap<String, usize>,
    pub mismatches: Vec<MismatchRecord>,
}

pub fn mismatch_report(output: &ReconOutput, created_at: DateTime<Utc>) -> MismatchReport {
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_set: BTreeMap<String, usize> = BTreeMap::new();
    for m in &output.mismatches {
        *by_category.entry(m.category.to_string()).or_insert(0) += 1;
        *by_set.entry(m.set_code.clone()).or_insert(0) += 1;
    }

    MismatchReport {
        metadata: MismatchMetadata {
            created_at: timestamp(created_at),
            total: output.mismatches.len(),
        },
        by_category,
        by_set,
        mismatches: output.mismatches.clone(),
    }
}

// ---------------------------------------------------------------------------
// Coverage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Share {
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetCoverage {
    pub total: usize,
    pub providers: BTreeMap<String, Share>,
    pub all_providers: Share,
}

impl From<&CoverageStat> for SetCoverage {
    fn from(stat: &CoverageStat) -> Self {
        let share = |count: usize| Share {
            count,
            percent: percent(count, stat.total),
        };
        Self {
            total: stat.total,
            providers: stat
                .providers
                .iter()
                .map(|(p, count)| (p.clone(), share(*count)))
                .collect(),
            all_providers: share(stat.all_providers),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageMetadata {
    pub created_at: String,
    pub providers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageDocument {
    pub metadata: CoverageMetadata,
    pub sets: BTreeMap<String, SetCoverage>,
    pub overall: SetCoverage,
    pub validation: ValidationSummary,
}

pub fn coverage_document(output: &ReconOutput, created_at: DateTime<Utc>) -> CoverageDocument {
    CoverageDocument {
        metadata: CoverageMetadata {
            created_at: timestamp(created_at),
            providers: output.providers.clone(),
        },
        sets: output
            .coverage
            .iter()
            .map(|(set, stat)| (set.clone(), SetCoverage::from(stat)))
            .collect(),
        overall: SetCoverage::from(&overall(&output.coverage)),
        validation: output.summary.clone(),
    }
}

// ---------------------------------------------------------------------------
// Flagged cards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct FlaggedMetadata {
    pub created_at: String,
    pub missing_provider: Option<String>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlaggedDocument {
    pub metadata: FlaggedMetadata,
    pub by_set: BTreeMap<String, Vec<FlaggedCard>>,
}

pub fn flagged_document(
    output: &ReconOutput,
    missing_provider: Option<&str>,
    created_at: DateTime<Utc>,
) -> FlaggedDocument {
    let mut by_set: BTreeMap<String, Vec<FlaggedCard>> = BTreeMap::new();
    for card in &output.flagged {
        by_set.entry(card.set_code.clone()).or_default().push(card.clone());
    }
    FlaggedDocument {
        metadata: FlaggedMetadata {
            created_at: timestamp(created_at),
            missing_provider: missing_provider.map(String::from),
            total: output.flagged.len(),
        },
        by_set,
    }
}
