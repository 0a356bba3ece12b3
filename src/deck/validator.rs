//! Deck construction rules.
//!
//! Validation is pure: it reads a store and returns a [`Verdict`]. The
//! replicator decides what an invalid verdict blocks.
//!
//! Basic lands are not exempt from the copy limit.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::store::DeckStore;
use crate::cards::{CardId, CatalogIndex, Format};
use crate::core::DeckLimits;

/// One broken construction rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    /// Too few cards in main.
    MainCount { found: usize, min: usize },
    /// Too many cards in the sideboard.
    SideboardCount { found: usize, max: usize },
    /// Too many copies of one id across main and sideboard.
    CopyLimit { id: CardId, count: usize, limit: usize },
    /// An id the catalog does not know.
    UnknownCard(CardId),
    /// A card not legal in the deck's format.
    NotLegalInFormat { id: CardId, format: Format },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MainCount { found, min } => {
                write!(f, "main deck has {found} cards, needs at least {min}")
            }
            Violation::SideboardCount { found, max } => {
                write!(f, "sideboard has {found} cards, allows at most {max}")
            }
            Violation::CopyLimit { id, count, limit } => {
                write!(f, "{count} copies of {id}, limit is {limit}")
            }
            Violation::UnknownCard(id) => write!(f, "unknown card {id}"),
            Violation::NotLegalInFormat { id, format } => write!(f, "{id} is not legal in {format}"),
        }
    }
}

/// Outcome of validating a deck.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    violations: SmallVec<[Violation; 4]>,
}

impl Verdict {
    /// True if no rule is broken.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Every broken rule.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True if some violation matches.
    pub fn has(&self, pred: impl Fn(&Violation) -> bool) -> bool {
        self.violations.iter().any(pred)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return f.write_str("valid");
        }
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

fn copy_counts(store: &DeckStore) -> BTreeMap<&CardId, usize> {
    let mut counts = BTreeMap::new();
    for id in store.main_ids().chain(store.sideboard_ids()) {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}

/// Check size and copy-limit rules.
///
/// ```
/// use rust_ccg_sync::core::{DeckLimits, SeatId, ShuffleRng};
/// use rust_ccg_sync::deck::{validate, DeckStore, Violation};
///
/// let store = DeckStore::new(SeatId::new(0), &DeckLimits::default(), ShuffleRng::new(0));
/// let verdict = validate(&store, &DeckLimits::default());
///
/// assert!(!verdict.is_valid());
/// assert!(verdict.has(|v| matches!(v, Violation::MainCount { found: 0, min: 60 })));
/// ```
#[must_use]
pub fn validate(store: &DeckStore, limits: &DeckLimits) -> Verdict {
    let mut violations = SmallVec::new();

    let main = store.main_count();
    if main < limits.min_main {
        violations.push(Violation::MainCount {
            found: main,
            min: limits.min_main,
        });
    }

    let sideboard = store.sideboard_count();
    if sideboard > limits.max_sideboard {
        violations.push(Violation::SideboardCount {
            found: sideboard,
            max: limits.max_sideboard,
        });
    }

    for (id, count) in copy_counts(store) {
        if count > limits.copy_limit {
            violations.push(Violation::CopyLimit {
                id: id.clone(),
                count,
                limit: limits.copy_limit,
            });
        }
    }

    Verdict { violations }
}

/// [`validate`], plus catalog membership and format legality.
#[must_use]
pub fn validate_with_catalog(store: &DeckStore, limits: &DeckLimits, catalog: &CatalogIndex) -> Verdict {
    let mut verdict = validate(store, limits);
    let format = store.format();

    for id in copy_counts(store).into_keys() {
        if !catalog.contains(id) {
            verdict.violations.push(Violation::UnknownCard(id.clone()));
        } else if !catalog.is_legal_in(id, format) {
            verdict.violations.push(Violation::NotLegalInFormat {
                id: id.clone(),
                format: format.clone(),
            });
        }
    }

    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRecord;
    use crate::core::{ParticipantId, SeatId, ShuffleRng};
    use crate::deck::ownership::{SharedOwnership, WriteToken};

    fn build(main: Vec<CardId>, side: Vec<CardId>) -> DeckStore {
        let table = SharedOwnership::new();
        table.assign(SeatId::new(0), ParticipantId::new(1));
        let view = table.view(ParticipantId::new(1));
        let token = WriteToken::acquire(&view, SeatId::new(0)).unwrap();

        let mut store = DeckStore::new(SeatId::new(0), &DeckLimits::default(), ShuffleRng::new(1));
        store.initialize(&token, main).unwrap();
        for id in side {
            store.add_to_sideboard(&token, id).unwrap();
        }
        store
    }

    fn playset(n: usize) -> Vec<CardId> {
        (0..n).map(|i| CardId::new(format!("c{}", i / 4))).collect()
    }

    #[test]
    fn test_sixty_with_four_copies_is_valid() {
        let verdict = validate(&build(playset(60), vec![]), &DeckLimits::default());
        assert!(verdict.is_valid(), "{verdict}");
        assert_eq!(verdict.to_string(), "valid");
    }

    #[test]
    fn test_fifty_nine_is_short() {
        let verdict = validate(&build(playset(59), vec![]), &DeckLimits::default());
        assert_eq!(verdict.violations(), &[Violation::MainCount { found: 59, min: 60 }]);
    }

    #[test]
    fn test_fifth_copy_breaks_limit() {
        let mut main = playset(60);
        main[59] = CardId::new("c0");
        let verdict = validate(&build(main, vec![]), &DeckLimits::default());
        assert!(verdict.has(|v| matches!(v, Violation::CopyLimit { count: 5, limit: 4, .. })));
    }

    #[test]
    fn test_copies_counted_across_sideboard() {
        let verdict = validate(
            &build(playset(60), vec![CardId::new("c3")]),
            &DeckLimits::default(),
        );
        assert_eq!(
            verdict.violations(),
            &[Violation::CopyLimit {
                id: CardId::new("c3"),
                count: 5,
                limit: 4
            }]
        );
    }

    #[test]
    fn test_relaxed_limits() {
        let limits = DeckLimits::default().with_min_main(40).with_copy_limit(1);
        let main: Vec<_> = (0..40).map(|i| CardId::new(format!("c{i}"))).collect();
        assert!(validate(&build(main, vec![]), &limits).is_valid());
    }

    #[test]
    fn test_catalog_checks() {
        let catalog = CatalogIndex::from_records((0..15).map(|i| {
            let record = CardRecord::new(format!("c{i}"), format!("Card {i}"), "Creature", "{1}");
            if i == 0 {
                record.legal_in("modern")
            } else {
                record.legal_in("standard")
            }
        }));

        let mut main = playset(60);
        main[0] = CardId::new("ghost");
        let verdict = validate_with_catalog(&build(main, vec![]), &DeckLimits::default(), &catalog);

        assert!(verdict.has(|v| *v == Violation::UnknownCard(CardId::new("ghost"))));
        assert!(verdict.has(|v| matches!(v, Violation::NotLegalInFormat { id, .. } if id.as_str() == "c0")));
        assert!(!verdict.has(|v| matches!(v, Violation::NotLegalInFormat { id, .. } if id.as_str() == "c1")));
    }
}
