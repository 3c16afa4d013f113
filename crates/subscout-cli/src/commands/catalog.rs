//! Provider catalog commands

use anyhow::{bail, Result};
use subscout_core::{
    matcher, normalize, Catalog, Config, MatchStage, Transaction, TransactionCluster,
};

use super::truncate;

pub fn cmd_catalog_list(category: Option<&str>) -> Result<()> {
    let catalog = Catalog::builtin();

    let entries: Vec<_> = catalog
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, e)| category.map_or(true, |c| e.category.eq_ignore_ascii_case(c)))
        .collect();

    if entries.is_empty() {
        println!("No catalog entries in category {}", category.unwrap_or("?"));
        return Ok(());
    }

    println!();
    println!("📚 Provider catalog ({} entries, first match wins)", entries.len());
    println!("   ─────────────────────────────────────────────────────────────");
    for (i, entry) in entries {
        println!(
            "   {:>3}. {:24} │ {:20} │ {}",
            i + 1,
            truncate(&entry.display_name, 24),
            truncate(&entry.category, 20),
            entry.pattern()
        );
    }

    Ok(())
}

/// Fails when an earlier entry would capture a later entry's own name
pub fn cmd_catalog_check() -> Result<()> {
    let catalog = Catalog::builtin();
    let shadowed = catalog.shadowing();

    if shadowed.is_empty() {
        println!("✅ {} catalog entries, none shadowed", catalog.len());
        return Ok(());
    }

    println!("❌ {} shadowed catalog entries:", shadowed.len());
    for s in &shadowed {
        println!(
            "   #{} {} is captured by earlier #{} {}",
            s.later_index + 1,
            s.later,
            s.earlier_index + 1,
            s.earlier
        );
    }
    bail!("Catalog ordering check failed")
}

/// Resolve a single wording the way detection would
pub fn cmd_catalog_test(config: &Config, wording: &str) -> Result<()> {
    let cluster = TransactionCluster {
        normalized_wording: normalize(wording),
        abs_amount: Default::default(),
        occurrences: vec![Transaction {
            id: 0,
            account_id: 0,
            date: String::new(),
            original_wording: wording.to_string(),
            simplified_wording: wording.to_string(),
            kind: None,
            value: Default::default(),
            formatted_value: String::new(),
        }],
    };

    match matcher::resolve(&cluster, Catalog::builtin(), &config.detection) {
        Some(resolution) => {
            let how = match resolution.stage {
                MatchStage::Pattern => format!("pattern /{}/", resolution.entry.pattern()),
                MatchStage::Fuzzy { distance } => format!("edit distance {}", distance),
            };
            println!(
                "✅ \"{}\" → {} ({}) via {}",
                wording, resolution.entry.display_name, resolution.entry.category, how
            );
        }
        None => println!("❌ \"{}\" matches no provider", wording),
    }

    Ok(())
}
