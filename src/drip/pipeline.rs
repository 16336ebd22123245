use super::{canonicalize, DependencyItem, DripListEntry, PERCENT_SCALE};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

const GITHUB_MARKER: &str = "github.com/";

/// All items sharing one exact `package_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub package_url: String,
    pub package_names: Vec<String>,
    pub ecosystem: String,
    pub raw_score: Decimal,
}

fn is_github_hosted(url: &str) -> bool {
    url.to_lowercase().contains(GITHUB_MARKER)
}

/// Canonical form of the analyzed repository, if one can be determined.
fn self_url(analyzed_repo_url: Option<&str>) -> Option<String> {
    let raw = analyzed_repo_url.map(str::trim).filter(|u| !u.is_empty())?;
    if !raw.contains("://") {
        return Some(raw.to_lowercase());
    }
    match canonicalize(raw) {
        Ok(canonical) => Some(canonical),
        Err(e) => {
            tracing::debug!("Not filtering self references: {e}");
            None
        }
    }
}

/// Stage A: GitHub-hosted items that do not point back at the analyzed repo.
pub fn filter_items(items: &[DependencyItem], analyzed_repo_url: Option<&str>) -> Vec<DependencyItem> {
    let own = self_url(analyzed_repo_url);
    items
        .iter()
        .filter(|item| is_github_hosted(&item.package_url))
        .filter(|item| match (&own, canonicalize(&item.package_url)) {
            (Some(own), Ok(canonical)) => &canonical != own,
            _ => true,
        })
        .cloned()
        .collect()
}

/// Stage B: group by exact URL in first-seen order, summing scores.
pub fn aggregate(items: &[DependencyItem]) -> Vec<Aggregate> {
    let mut aggregates: Vec<Aggregate> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let slot = *index.entry(item.package_url.as_str()).or_insert_with(|| {
            aggregates.push(Aggregate {
                package_url: item.package_url.clone(),
                package_names: Vec::new(),
                ecosystem: item.ecosystem.clone(),
                raw_score: Decimal::ZERO,
            });
            aggregates.len() - 1
        });
        let agg = &mut aggregates[slot];
        agg.raw_score = add_scores(agg.raw_score, item.percentage);
        if !item.package_name.is_empty() && !agg.package_names.contains(&item.package_name) {
            agg.package_names.push(item.package_name.clone());
        }
    }
    aggregates
}

/// `owner/repo` for GitHub URLs, else the first package name, else the URL.
pub fn display_name(aggregate: &Aggregate) -> String {
    let url = aggregate.package_url.as_str();
    if let Some((_, tail)) = url.split_once(GITHUB_MARKER) {
        let mut segments = tail.trim_matches('/').split('/').filter(|s| !s.is_empty());
        if let (Some(owner), Some(repo)) = (segments.next(), segments.next()) {
            return format!("{owner}/{repo}");
        }
    }
    aggregate
        .package_names
        .first()
        .cloned()
        .unwrap_or_else(|| url.to_string())
}

/// Stage C: rank, truncate to `max_length`, and split 100% exactly.
pub fn normalize(mut aggregates: Vec<Aggregate>, max_length: usize) -> Vec<DripListEntry> {
    // stable: equal scores keep first-seen order
    aggregates.sort_by(|a, b| b.raw_score.cmp(&a.raw_score));
    aggregates.truncate(max_length);

    let total = aggregates
        .iter()
        .fold(Decimal::ZERO, |acc, a| add_scores(acc, a.raw_score));
    let hundred = Decimal::ONE_HUNDRED;
    let last = aggregates.len().saturating_sub(1);
    let mut assigned = Decimal::ZERO;

    aggregates
        .iter()
        .enumerate()
        .map(|(i, agg)| {
            let split = if total.is_zero() {
                Decimal::new(0, PERCENT_SCALE)
            } else if i == last {
                rescaled(hundred.saturating_sub(assigned))
            } else {
                let share = agg
                    .raw_score
                    .checked_div(total)
                    .and_then(|ratio| ratio.checked_mul(hundred))
                    .unwrap_or_default()
                    .round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
                let share = rescaled(share);
                assigned = add_scores(assigned, share);
                share
            };
            DripListEntry {
                package_name: display_name(agg),
                package_url: agg.package_url.clone(),
                ecosystem: agg.ecosystem.clone(),
                split_percentage: split,
            }
        })
        .collect()
}

/// Sum that saturates at the decimal range instead of panicking.
fn add_scores(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| {
        tracing::warn!("Score total exceeds the decimal range; saturating");
        a.saturating_add(b)
    })
}

fn rescaled(mut value: Decimal) -> Decimal {
    value.rescale(PERCENT_SCALE);
    value
}
