use std::collections::{BTreeMap, BTreeSet};

use crate::classify::classify;
use crate::config::ReconConfig;
use crate::coverage::compute_coverage;
use crate::error::{DataWarning, ReconError};
use crate::identifier::{self, CardId};
use crate::model::{
    non_blank, FlaggedCard, MasterCardRecord, MismatchRecord, ProviderRecord, ReconInput,
    ReconOutput, ValidationSummary,
};
use crate::normalize::normalize;

/// Warnings and counters for one pass. Returned inside the output, never
/// kept between runs.
#[derive(Default)]
struct RunAccumulator {
    warnings: Vec<DataWarning>,
    summary: ValidationSummary,
}

impl RunAccumulator {
    fn warn(&mut self, warning: DataWarning) {
        tracing::debug!(%warning, "data-quality warning");
        match &warning {
            DataWarning::MalformedIdentifier { .. } => self.summary.malformed_identifiers += 1,
            DataWarning::MissingRequiredField { .. } => self.summary.missing_names += 1,
            DataWarning::UnrecognizedRarity { .. } => self.summary.unrecognized_rarities += 1,
            DataWarning::SetCodeDisagreement { .. } => self.summary.set_code_disagreements += 1,
        }
        self.warnings.push(warning);
    }
}

/// Reconcile provider collections into master records, mismatches, coverage
/// and flags.
pub fn reconcile(config: &ReconConfig, input: &ReconInput) -> Result<ReconOutput, ReconError> {
    if let Some((provider, identifier)) = input.first_duplicate() {
        return Err(ReconError::InvariantViolation(format!(
            "provider '{provider}': identifier '{identifier}' appears more than once"
        )));
    }

    let order = provider_order(config, input);
    let mut acc = RunAccumulator::default();
    acc.summary.total_records = input.total_records();

    let universe = build_universe(&order, input, config, &mut acc)?;
    if universe.is_empty()
        && acc.summary.total_records > 0
        && acc.summary.malformed_identifiers == acc.summary.total_records
    {
        return Err(ReconError::EmptyUniverse {
            records: acc.summary.total_records,
        });
    }
    acc.summary.universe = universe.len();

    let mut cards = BTreeMap::new();
    let mut mismatches = Vec::new();
    let mut flagged = Vec::new();

    for id in &universe {
        let present: Vec<(&str, &ProviderRecord)> = order
            .iter()
            .filter_map(|p| lookup(input, p, &id.raw).map(|r| (p.as_str(), r)))
            .collect();
        if present.is_empty() {
            return Err(ReconError::InvariantViolation(format!(
                "identifier '{id}' is in the universe but no provider has it"
            )));
        }

        for (provider, record) in &present {
            check_record(provider, id, record, &mut acc);
        }

        if let Some(mismatch) = primary_pair_mismatch(id, &order, &present) {
            mismatches.push(mismatch);
        }

        let card = merge(id, &order, &present, config, &mut acc);

        if let Some(flag) = flag_card(&card, config) {
            flagged.push(flag);
        }

        cards.insert(id.clone(), card);
    }

    let coverage = compute_coverage(cards.values(), &order);

    acc.summary.mismatches = mismatches.len();
    acc.summary.flagged = flagged.len();
    acc.summary.in_all_providers = coverage.values().map(|s| s.all_providers).sum();

    tracing::info!(
        config = %config.name,
        providers = order.len(),
        cards = cards.len(),
        mismatches = mismatches.len(),
        flagged = flagged.len(),
        warnings = acc.warnings.len(),
        "reconciliation complete"
    );

    Ok(ReconOutput {
        providers: order,
        cards,
        mismatches,
        coverage,
        flagged,
        warnings: acc.warnings,
        summary: acc.summary,
    })
}

/// Configured providers present in the input, then any unconfigured input
/// providers by name.
fn provider_order(config: &ReconConfig, input: &ReconInput) -> Vec<String> {
    let mut order: Vec<String> = config
        .providers
        .iter()
        .filter(|p| input.providers.contains_key(p.as_str()))
        .cloned()
        .collect();
    for provider in input.providers.keys() {
        if !order.contains(provider) {
            tracing::debug!(provider = %provider, "provider not in configured order, appending");
            order.push(provider.clone());
        }
    }
    order
}

fn lookup<'a>(input: &'a ReconInput, provider: &str, key: &str) -> Option<&'a ProviderRecord> {
    input.providers.get(provider)?.get(key)
}

fn build_universe(
    order: &[String],
    input: &ReconInput,
    config: &ReconConfig,
    acc: &mut RunAccumulator,
) -> Result<BTreeSet<CardId>, ReconError> {
    let mut universe = BTreeSet::new();

    for provider in order {
        let Some(collection) = input.providers.get(provider) else {
            continue;
        };
        for (key, record) in collection {
            if record.identifier != *key {
                return Err(ReconError::InvariantViolation(format!(
                    "provider '{provider}': record filed under '{key}' carries identifier '{}'",
                    record.identifier
                )));
            }
            let id = match identifier::parse(key) {
                Ok(id) if id.raw == *key => id,
                _ => {
                    acc.warn(DataWarning::MalformedIdentifier {
                        provider: provider.clone(),
                        identifier: key.clone(),
                    });
                    continue;
                }
            };
            if !identifier::is_in_scope(&id.set_code, &config.scope) {
                acc.summary.out_of_scope += 1;
                continue;
            }
            universe.insert(id);
        }
    }

    Ok(universe)
}

fn check_record(provider: &str, id: &CardId, record: &ProviderRecord, acc: &mut RunAccumulator) {
    if record.usable_name().is_none() {
        acc.warn(DataWarning::MissingRequiredField {
            provider: provider.to_string(),
            identifier: id.raw.clone(),
            field: "name".into(),
        });
    }
    if let Some(reported) = non_blank(record.set_code.as_deref()) {
        if reported.trim() != id.set_code {
            acc.warn(DataWarning::SetCodeDisagreement {
                provider: provider.to_string(),
                identifier: id.raw.clone(),
                reported: reported.to_string(),
                derived: id.set_code.clone(),
            });
        }
    }
}

/// Compare the first two named records. Only that pair is compared: a
/// disagreement between later providers is not reported.
fn primary_pair_mismatch(
    id: &CardId,
    order: &[String],
    present: &[(&str, &ProviderRecord)],
) -> Option<MismatchRecord> {
    let mut named = present
        .iter()
        .filter_map(|(p, r)| r.usable_name().map(|n| (*p, n)));
    let (_, name_a) = named.next()?;
    let (_, name_b) = named.next()?;
    if name_a == name_b {
        return None;
    }

    let category = classify(name_a, name_b);

    let mut names = BTreeMap::new();
    let mut normalized = BTreeMap::new();
    for provider in order {
        let name = present
            .iter()
            .find(|(p, _)| *p == provider.as_str())
            .and_then(|(_, r)| r.usable_name());
        if let Some(n) = name {
            normalized.insert(provider.clone(), normalize(n));
        }
        names.insert(provider.clone(), name.map(String::from));
    }

    Some(MismatchRecord {
        identifier: id.raw.clone(),
        names,
        normalized,
        category,
        set_code: id.set_code.clone(),
    })
}

/// First non-blank value in provider order.
fn first_present<'a, F>(present: &[(&str, &'a ProviderRecord)], field: F) -> Option<&'a str>
where
    F: Fn(&'a ProviderRecord) -> Option<&'a str>,
{
    present.iter().find_map(|(_, r)| non_blank(field(r)))
}

fn merge(
    id: &CardId,
    order: &[String],
    present: &[(&str, &ProviderRecord)],
    config: &ReconConfig,
    acc: &mut RunAccumulator,
) -> MasterCardRecord {
    let name = first_present(present, |r| r.name.as_deref()).map(|s| s.trim().to_string());
    let title = first_present(present, |r| r.title.as_deref()).map(|s| s.trim().to_string());
    let rarity = config
        .rarity
        .normalize(first_present(present, |r| r.rarity.as_deref()));

    if let Some(ref r) = rarity {
        if !config.rarity.is_known(r) {
            acc.warn(DataWarning::UnrecognizedRarity {
                identifier: id.raw.clone(),
                rarity: r.clone(),
            });
        }
    }

    let sources_available = order
        .iter()
        .map(|p| (p.clone(), present.iter().any(|(q, _)| *q == p.as_str())))
        .collect();

    let prices = present
        .iter()
        .filter_map(|(p, r)| {
            r.pricing
                .as_ref()
                .filter(|pricing| !pricing.is_empty())
                .map(|pricing| (p.to_string(), pricing.clone()))
        })
        .collect();

    let product_type = config.products.classify(name.as_deref());

    MasterCardRecord {
        id: id.raw.clone(),
        name,
        title,
        rarity,
        set_code: id.set_code.clone(),
        sources_available,
        product_type,
        prices,
    }
}

fn flag_card(card: &MasterCardRecord, config: &ReconConfig) -> Option<FlaggedCard> {
    let watched = config.flag.missing_provider.as_deref()?;
    let rarity = card.rarity.as_deref()?;
    if !config.flag.high_value_rarities.contains(rarity) || card.has_source(watched) {
        return None;
    }
    let present_in = card.present_in();
    if present_in.is_empty() {
        return None;
    }
    Some(FlaggedCard {
        identifier: card.id.clone(),
        set_code: card.set_code.clone(),
        name: card.name.clone(),
        rarity: rarity.to_string(),
        missing_provider: watched.to_string(),
        present_in,
    })
}
