use gardener::drip::{self, canonicalize, DependencyItem};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn items_from(scores: &[(usize, i64, u32)]) -> Vec<DependencyItem> {
    scores
        .iter()
        .map(|&(repo, mantissa, scale)| {
            DependencyItem::new(
                format!("pkg{repo}"),
                format!("https://github.com/org/repo{repo}"),
                Decimal::new(mantissa, scale),
            )
        })
        .collect()
}

fn spell(host: &str, owner: &str, repo: &str, variant: usize) -> String {
    match variant {
        0 => format!("https://{host}/{owner}/{repo}"),
        // scp syntax has no room for a port
        1 if host.contains(':') => format!("ssh://git@{host}/{owner}/{repo}.git"),
        1 => format!("git@{host}:{owner}/{repo}.git"),
        2 => format!("{host}/{owner}/{repo}"),
        3 => format!("ssh://git@{host}/{owner}/{repo}.git"),
        _ => format!("https://www.{host}/{owner}/{repo}/"),
    }
}

proptest! {
    #[test]
    fn drip_list_sums_to_exactly_one_hundred(
        scores in prop::collection::vec((0usize..12, 1i64..1_000_000, 0u32..6), 1..60)
    ) {
        let items = items_from(&scores);
        let entries = drip::build(&items, drip::MAX_DRIP_LIST_LENGTH, None);
        let total: Decimal = entries.iter().map(|e| e.split_percentage).sum();
        prop_assert_eq!(total, Decimal::new(1_000_000, 4));
        for entry in &entries {
            prop_assert_eq!(entry.split_percentage.scale(), 4);
        }
    }

    #[test]
    fn drip_list_is_ordered_and_bounded(
        scores in prop::collection::vec((0usize..30, 0i64..1000, 0u32..3), 0..80),
        max_length in 1usize..20,
    ) {
        let items = items_from(&scores);
        let entries = drip::build(&items, max_length, None);
        prop_assert!(entries.len() <= max_length);

        let groups: std::collections::HashSet<usize> = scores.iter().map(|s| s.0).collect();
        prop_assert_eq!(entries.len(), groups.len().min(max_length));
        for pair in entries.windows(2) {
            // rounding may only lift the last entry by a hair above its neighbour
            prop_assert!(
                pair[0].split_percentage + Decimal::new(1, 2) >= pair[1].split_percentage
            );
        }
    }

    #[test]
    fn canonicalize_is_idempotent(
        host in prop::sample::select(vec![
            "github.com",
            "gitlab.com",
            "codeberg.org",
            "git.example.com",
            "localhost",
            "gitserver",
            "localhost:8080",
            "git.example.com:8443",
        ]),
        owner in "[A-Za-z0-9][A-Za-z0-9_-]{0,12}",
        repo in "[A-Za-z0-9][A-Za-z0-9_-]{0,12}",
        variant in 0usize..5,
    ) {
        let url = spell(host, &owner, &repo, variant);
        let once = canonicalize(&url).unwrap();
        prop_assert_eq!(&once, &format!("{host}/{}/{}", owner.to_lowercase(), repo.to_lowercase()));
        prop_assert_eq!(canonicalize(&once).unwrap(), once);
    }
}
