use std::collections::BTreeMap;

use crate::model::{CoverageStat, MasterCardRecord};

/// Per-set provider counts over the merged cards.
///
/// Every run provider gets an entry in every set, zero included, so
/// consumers never have to guess whether a missing key means zero.
pub fn compute_coverage<'a, I>(cards: I, providers: &[String]) -> BTreeMap<String, CoverageStat>
where
    I: IntoIterator<Item = &'a MasterCardRecord>,
{
    let mut coverage: BTreeMap<String, CoverageStat> = BTreeMap::new();

    for card in cards {
        let stat = coverage.entry(card.set_code.clone()).or_insert_with(|| CoverageStat {
            total: 0,
            providers: providers.iter().map(|p| (p.clone(), 0)).collect(),
            all_providers: 0,
        });
        stat.total += 1;

        let mut in_all = !providers.is_empty();
        for provider in providers {
            if card.has_source(provider) {
                *stat.providers.entry(provider.clone()).or_insert(0) += 1;
            } else {
                in_all = false;
            }
        }
        if in_all {
            stat.all_providers += 1;
        }
    }

    coverage
}

/// Sum of all per-set stats.
pub fn overall(coverage: &BTreeMap<String, CoverageStat>) -> CoverageStat {
    let mut total = CoverageStat::default();
    for stat in coverage.values() {
        total.total += stat.total;
        total.all_providers += stat.all_providers;
        for (provider, count) in &stat.providers {
            *total.providers.entry(provider.clone()).or_insert(0) += count;
        }
    }
    total
}

/// `count / total` as a percentage with one decimal. Zero when total is zero.
pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}
