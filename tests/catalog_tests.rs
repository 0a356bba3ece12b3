//! Catalog loading and lookup tests.
//!
//! These tests cover loading raw records the way a host receives them:
//! - Malformed records skipped or defaulted without stopping the load
//! - Case-insensitive name lookup with first-writer-wins collisions
//! - Lazy, restartable filters over rarity, type, format, and cost

use proptest::prelude::*;

use rust_ccg_sync::cards::{
    converted_cost, CardId, CardQuery, CatalogIndex, Format, RawCardRecord, Rarity, RecordField,
};
use rust_ccg_sync::error::CatalogError;

const CATALOG_JSON: &str = r#"[
    {
        "id": "bolt",
        "name": "Lightning Bolt",
        "type": "Instant",
        "manaCost": "{R}",
        "text": "Lightning Bolt deals 3 damage to any target.",
        "rarity": "common",
        "perFormatLegality": { "modern": "legal", "standard": "not_legal", "pauper": "legal" }
    },
    {
        "id": "angel",
        "name": "Serra Angel",
        "type": "Creature — Angel",
        "manaCost": "{3}{W}{W}",
        "power": "4",
        "toughness": "4",
        "rarity": "uncommon",
        "perFormatLegality": { "standard": "legal" }
    },
    {
        "id": "broken",
        "name": "Broken Cost",
        "type": "Sorcery",
        "manaCost": "{2",
        "rarity": "rare"
    },
    {
        "id": "",
        "name": "No Id"
    },
    {
        "id": "bolt",
        "name": "Bolt Again",
        "rarity": "common"
    },
    {
        "id": "bolt2",
        "name": "LIGHTNING BOLT",
        "type": "Instant",
        "manaCost": "{R}",
        "rarity": "special"
    }
]"#;

#[test]
fn test_load_skips_and_defaults() {
    let (catalog, report) = CatalogIndex::load_json(CATALOG_JSON).unwrap();

    assert_eq!(catalog.len(), 4);
    assert_eq!(report.loaded, 4);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].position, 3);
    assert_eq!(report.duplicate_ids, vec![CardId::new("bolt")]);

    let broken = catalog.by_id(&CardId::new("broken")).unwrap();
    assert_eq!(broken.converted_cost, 0);
    assert!(report
        .defaulted
        .iter()
        .any(|r| r.id.as_deref() == Some("broken")
            && r.issues.iter().any(|i| i.field == RecordField::ManaCost)));
}

#[test]
fn test_record_fields() {
    let (catalog, _) = CatalogIndex::load_json(CATALOG_JSON).unwrap();
    let angel = catalog.by_id(&CardId::new("angel")).unwrap();

    assert_eq!(angel.name, "Serra Angel");
    assert_eq!(angel.converted_cost, 5);
    assert_eq!(angel.power.as_deref(), Some("4"));
    assert_eq!(angel.rarity, Rarity::Uncommon);
    assert!(angel.is_legal_in(&Format::standard()));
    assert!(!angel.is_legal_in(&Format::new("modern")));
}

#[test]
fn test_name_lookup_and_collisions() {
    let (catalog, _) = CatalogIndex::load_json(CATALOG_JSON).unwrap();

    assert_eq!(catalog.by_name("lightning bolt"), Some(&CardId::new("bolt")));
    assert_eq!(catalog.by_name("Lightning Bolt"), Some(&CardId::new("bolt")));
    assert_eq!(catalog.by_name("Bolt Again"), None);

    let collisions = catalog.name_collisions();
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].kept, CardId::new("bolt"));
    assert_eq!(collisions[0].shadowed, CardId::new("bolt2"));
}

#[test]
fn test_filters() {
    let (catalog, _) = CatalogIndex::load_json(CATALOG_JSON).unwrap();

    let instants = CardQuery::new().type_contains("INSTANT");
    let mut ids: Vec<_> = catalog.filter(&instants).map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["bolt", "bolt2"]);

    let modern_one_drops = CardQuery::new().legal_in("Modern").converted_cost(1);
    let filter = catalog.filter(&modern_one_drops);
    let restarted = filter.clone();
    assert_eq!(filter.count(), 1);
    assert_eq!(restarted.map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["bolt"]);

    let none = CardQuery::new().rarity(Rarity::Mythic);
    assert_eq!(catalog.filter(&none).count(), 0);

    let mut pauper: Vec<_> = catalog.legal_ids(&Format::new("pauper")).collect();
    pauper.sort();
    assert_eq!(pauper, vec![&CardId::new("bolt")]);
}

#[test]
fn test_load_with_nothing_usable_fails() {
    let raw = vec![RawCardRecord::default(), RawCardRecord::default()];
    assert!(matches!(
        CatalogIndex::load(raw),
        Err(CatalogError::Empty { rejected: 2 })
    ));
}

#[test]
fn test_converted_cost_examples() {
    assert_eq!(converted_cost("{2}{B}{R}"), 4);
    assert_eq!(converted_cost("{X}{U}"), 1);
    assert_eq!(converted_cost(""), 0);
    assert_eq!(converted_cost("{W/U}{W/U}"), 2);
    assert_eq!(converted_cost("{10}"), 10);
    assert_eq!(converted_cost("{2}{"), 0);
}

fn symbol() -> impl Strategy<Value = (String, u32)> {
    prop_oneof![
        (0u32..20).prop_map(|n| (format!("{{{n}}}"), n)),
        prop::sample::select(vec!["W", "U", "B", "R", "G", "C"]).prop_map(|s| (format!("{{{s}}}"), 1)),
        prop::sample::select(vec!["X", "Y", "Z"]).prop_map(|s| (format!("{{{s}}}"), 0)),
    ]
}

proptest! {
    /// Converted cost is the sum of each symbol's contribution.
    #[test]
    fn prop_converted_cost_sums_symbols(symbols in prop::collection::vec(symbol(), 0..8)) {
        let text: String = symbols.iter().map(|(s, _)| s.as_str()).collect();
        let expected: u32 = symbols.iter().map(|(_, v)| v).sum();
        prop_assert_eq!(converted_cost(&text), expected);
    }
}
