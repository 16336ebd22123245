//! Drip lists: exact percentage splits over a repository's dependencies.

pub mod canonical;
pub mod pipeline;

pub use canonical::canonicalize;
pub use pipeline::{aggregate, display_name, filter_items, normalize, Aggregate};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upper bound callers apply to `max_length`.
pub const MAX_DRIP_LIST_LENGTH: usize = 200;

/// Fractional digits of every split percentage.
pub const PERCENT_SCALE: u32 = 4;

fn default_ecosystem() -> String {
    "unknown".to_string()
}

/// Scored dependency produced by the usage-scoring stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyItem {
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub package_url: String,
    #[serde(default = "default_ecosystem")]
    pub ecosystem: String,
    /// Raw usage score; JSON strings and numbers are both accepted.
    #[serde(default)]
    pub percentage: Decimal,
}

impl DependencyItem {
    pub fn new(
        package_name: impl Into<String>,
        package_url: impl Into<String>,
        percentage: Decimal,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            package_url: package_url.into(),
            ecosystem: default_ecosystem(),
            percentage,
        }
    }

    pub fn with_ecosystem(mut self, ecosystem: impl Into<String>) -> Self {
        self.ecosystem = ecosystem.into();
        self
    }
}

/// One row of the final list. `split_percentage` always has four
/// fractional digits and serializes as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DripListEntry {
    pub package_name: String,
    pub package_url: String,
    pub ecosystem: String,
    pub split_percentage: Decimal,
}

/// Filter, aggregate and normalize `items` into at most `max_length` entries.
///
/// For a non-empty result with a non-zero total the split percentages sum
/// to exactly `100.0000`.
pub fn build(
    items: &[DependencyItem],
    max_length: usize,
    analyzed_repo_url: Option<&str>,
) -> Vec<DripListEntry> {
    let kept = filter_items(items, analyzed_repo_url);
    if kept.is_empty() {
        tracing::debug!("No GitHub-hosted dependencies left after filtering");
        return Vec::new();
    }
    let aggregates = aggregate(&kept);
    tracing::debug!(
        "{} items aggregated into {} repositories",
        kept.len(),
        aggregates.len()
    );
    normalize(aggregates, max_length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn item(url: &str, pct: Decimal) -> DependencyItem {
        DependencyItem::new("", url, pct)
    }

    fn total(entries: &[DripListEntry]) -> Decimal {
        entries.iter().map(|e| e.split_percentage).sum()
    }

    #[test]
    fn deserializes_with_defaults_and_string_or_number_scores() {
        let items: Vec<DependencyItem> = serde_json::from_str(
            r#"[
                {"package_url": "https://github.com/a/b", "percentage": "12.5"},
                {"package_name": "c", "package_url": "https://github.com/c/c", "percentage": 7.25, "ecosystem": "npm"},
                {}
            ]"#,
        )
        .unwrap();
        assert_eq!(items[0].percentage, dec!(12.5));
        assert_eq!(items[0].ecosystem, "unknown");
        assert_eq!(items[1].percentage, dec!(7.25));
        assert_eq!(items[1].ecosystem, "npm");
        assert_eq!(items[2].percentage, Decimal::ZERO);
        assert_eq!(items[2].package_url, "");
    }

    #[test]
    fn split_percentages_serialize_with_four_digits() {
        let entries = build(
            &[
                item("https://github.com/a/one", dec!(1)),
                item("https://github.com/a/two", dec!(2)),
            ],
            10,
            None,
        );
        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json[0]["split_percentage"], "66.6667");
        assert_eq!(json[1]["split_percentage"], "33.3333");
        assert_eq!(json[0]["package_name"], "a/two");
    }

    #[test]
    fn self_reference_is_filtered() {
        let items = [item("https://github.com/acme/app", dec!(10))];
        assert!(build(&items, 10, Some("https://github.com/acme/app")).is_empty());
        assert!(build(&items, 10, Some("github.com/ACME/app")).is_empty());
        assert_eq!(build(&items, 10, Some("https://github.com/acme/other")).len(), 1);
    }

    #[test]
    fn unparseable_self_url_skips_self_filtering() {
        let items = [item("https://github.com/acme/app", dec!(10))];
        let entries = build(&items, 10, Some("://"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].split_percentage, dec!(100.0000));
    }

    #[test]
    fn equal_scores_keep_input_order_and_residual_goes_last() {
        let items = [
            item("https://github.com/x/first", dec!(1)),
            item("https://github.com/x/second", dec!(1)),
            item("https://github.com/x/third", dec!(1)),
        ];
        let entries = build(&items, 3, None);
        let names: Vec<&str> = entries.iter().map(|e| e.package_name.as_str()).collect();
        assert_eq!(names, vec!["x/first", "x/second", "x/third"]);
        assert_eq!(entries[0].split_percentage, dec!(33.3333));
        assert_eq!(entries[1].split_percentage, dec!(33.3333));
        assert_eq!(
            entries[2].split_percentage,
            dec!(100.0000) - entries[0].split_percentage - entries[1].split_percentage
        );
        assert_eq!(entries[2].split_percentage, dec!(33.3334));
        assert_eq!(total(&entries), dec!(100.0000));
    }

    #[test]
    fn all_zero_scores_give_zero_percentages() {
        let items = [
            item("https://github.com/z/a", dec!(0)),
            item("https://github.com/z/b", dec!(0)),
        ];
        let entries = build(&items, 5, None);
        assert_eq!(entries.len(), 2);
        for entry in &entries {
            assert_eq!(entry.split_percentage, dec!(0.0000));
            assert_eq!(entry.split_percentage.to_string(), "0.0000");
        }
    }

    #[test]
    fn truncation_keeps_the_highest_scores() {
        let items: Vec<DependencyItem> = [5, 1, 4, 2, 3]
            .iter()
            .map(|n| item(&format!("https://github.com/t/r{n}"), Decimal::from(*n)))
            .collect();
        let entries = build(&items, 3, None);
        let names: Vec<&str> = entries.iter().map(|e| e.package_name.as_str()).collect();
        assert_eq!(names, vec!["t/r5", "t/r4", "t/r3"]);
        assert_eq!(total(&entries), dec!(100.0000));
    }

    #[test]
    fn nothing_in_nothing_out() {
        assert!(build(&[], 10, None).is_empty());
        let non_github = [item("https://gitlab.com/a/b", dec!(3))];
        assert!(build(&non_github, 10, None).is_empty());
    }
}
