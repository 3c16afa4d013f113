//! Resolve a recurring cluster to a known provider
//!
//! Two stages, the second only when the first finds nothing anywhere in the
//! catalog:
//! 1. Pattern: each entry's regex against the earliest occurrence's raw
//!    wording, first hit in catalog order wins
//! 2. Fuzzy: Levenshtein distance between a prefix of the normalized
//!    wording and the lower-cased display name, first entry within the
//!    configured distance wins

use strsim::levenshtein;

use crate::catalog::{Catalog, CatalogEntry};
use crate::cluster::TransactionCluster;
use crate::config::DetectionConfig;

/// How an entry was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    Pattern,
    Fuzzy { distance: usize },
}

/// A catalog entry resolved for a cluster
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'c> {
    pub entry: &'c CatalogEntry,
    pub stage: MatchStage,
}

/// Resolve a cluster, or None when it matches no provider
pub fn resolve<'c>(
    cluster: &TransactionCluster,
    catalog: &'c Catalog,
    config: &DetectionConfig,
) -> Option<Resolution<'c>> {
    if let Some(entry) = cluster.earliest().and_then(|tx| catalog.match_wording(tx.wording())) {
        return Some(Resolution {
            entry,
            stage: MatchStage::Pattern,
        });
    }

    let prefix: String = cluster
        .normalized_wording
        .chars()
        .take(config.fuzzy_prefix_chars)
        .collect();
    if prefix.is_empty() {
        return None;
    }

    catalog.entries().iter().find_map(|entry| {
        let distance = levenshtein(&prefix, &entry.display_name.to_lowercase());
        (distance <= config.fuzzy_max_distance).then_some(Resolution {
            entry,
            stage: MatchStage::Fuzzy { distance },
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::group;
    use crate::test_utils::tx;

    fn cluster_of(wording: &str) -> TransactionCluster {
        group(&[
            tx(1, "2024-01-05", wording, "-9.99"),
            tx(2, "2024-02-04", wording, "-9.99"),
        ])
        .remove(0)
    }

    fn qobuz_catalog() -> Catalog {
        Catalog::from_entries(vec![CatalogEntry::new(
            "Qobuz",
            "Streaming Musique",
            r"\bqobuz premium\b",
        )
        .unwrap()])
    }

    #[test]
    fn test_pattern_stage_uses_raw_wording() {
        let resolution = resolve(
            &cluster_of("SPOTIFY PARIS"),
            Catalog::builtin(),
            &DetectionConfig::default(),
        )
        .unwrap();

        assert_eq!(resolution.entry.display_name, "Spotify");
        assert_eq!(resolution.entry.category, "Streaming Musique");
        assert_eq!(resolution.stage, MatchStage::Pattern);
    }

    #[test]
    fn test_first_pattern_in_catalog_order_wins() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("Music Bundle", "Streaming Musique", "music").unwrap(),
            CatalogEntry::new("Apple Music", "Streaming Musique", r"apple\s*music").unwrap(),
        ]);

        let resolution = resolve(
            &cluster_of("APPLE MUSIC"),
            &catalog,
            &DetectionConfig::default(),
        )
        .unwrap();
        assert_eq!(resolution.entry.display_name, "Music Bundle");
    }

    #[test]
    fn test_pattern_beats_closer_fuzzy_candidate() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("Deezer", "Streaming Musique", "deezer").unwrap(),
            CatalogEntry::new("Qobuz", "Streaming Musique", r"qobuz\s*family").unwrap(),
        ]);

        let resolution = resolve(
            &cluster_of("QOBUZ DEEZER"),
            &catalog,
            &DetectionConfig::default(),
        )
        .unwrap();
        assert_eq!(resolution.entry.display_name, "Deezer");
        assert_eq!(resolution.stage, MatchStage::Pattern);
    }

    #[test]
    fn test_fuzzy_distance_three_resolves() {
        let catalog = qobuz_catalog();
        let resolution = resolve(&cluster_of("QOBUZXYZ"), &catalog, &DetectionConfig::default())
            .unwrap();
        assert_eq!(resolution.entry.display_name, "Qobuz");
        assert_eq!(resolution.stage, MatchStage::Fuzzy { distance: 3 });
    }

    #[test]
    fn test_fuzzy_distance_four_is_rejected() {
        let config = DetectionConfig::default();
        let catalog = qobuz_catalog();
        assert!(resolve(&cluster_of("QOBUZWXYZ"), &catalog, &config).is_none());
    }

    #[test]
    fn test_fuzzy_compares_truncated_prefix() {
        // "qobuz 123456789" is cut to "qobuz 1234", five edits from "qobuz"
        let catalog = qobuz_catalog();
        let config = DetectionConfig::default();
        assert!(resolve(&cluster_of("QOBUZ 123456789"), &catalog, &config).is_none());

        let wider = DetectionConfig {
            fuzzy_prefix_chars: 6,
            ..DetectionConfig::default()
        };
        let resolution = resolve(&cluster_of("QOBUZ 123456789"), &catalog, &wider).unwrap();
        assert_eq!(resolution.stage, MatchStage::Fuzzy { distance: 1 });
    }

    #[test]
    fn test_fuzzy_takes_first_entry_within_bound() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("Tidal", "Streaming Musique", r"\btidal hifi\b").unwrap(),
            CatalogEntry::new("Tidel", "Streaming Musique", r"\btidel pro\b").unwrap(),
        ]);

        let resolution = resolve(&cluster_of("TIDEL"), &catalog, &DetectionConfig::default())
            .unwrap();
        assert_eq!(resolution.entry.display_name, "Tidal");
        assert_eq!(resolution.stage, MatchStage::Fuzzy { distance: 1 });
    }

    #[test]
    fn test_empty_normalized_wording_is_unresolved() {
        // "..." normalizes to "", which is within 3 edits of short names like "box"
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("Box", "Stockage Cloud", r"\bbox\b").unwrap(),
        ]);
        let cluster = cluster_of("...");
        assert_eq!(cluster.normalized_wording, "");

        assert!(resolve(&cluster, &catalog, &DetectionConfig::default()).is_none());
        assert!(resolve(&cluster, Catalog::builtin(), &DetectionConfig::default()).is_none());
    }

    #[test]
    fn test_unknown_merchant_is_unresolved() {
        let config = DetectionConfig::default();
        assert!(resolve(&cluster_of("BOULANGERIE DUPONT"), Catalog::builtin(), &config).is_none());
        assert!(resolve(&cluster_of("CB CARREFOUR"), Catalog::builtin(), &config).is_none());
        assert!(resolve(&cluster_of("FREE MOBILE"), Catalog::builtin(), &config).is_none());
    }
}
