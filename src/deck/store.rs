//! Per-seat deck storage.
//!
//! A [`DeckStore`] holds fixed-capacity main and sideboard slot sequences
//! plus a draw cursor. Slots are allocated up front and never grow, so a
//! full deck turns adds into no-ops instead of errors.
//!
//! The cursor counts drawn cards, not slots: the drawn cards are the first
//! `cursor` occupied main slots in slot order. Holes left by removals are
//! never drawn. Removing a drawn card pulls the cursor back, and a card
//! placed into a hole among the drawn ones counts as already passed.
//!
//! ## Key Types
//!
//! - `DeckEntry`: One slot, either empty or holding a card id
//! - `DeckEdit`: A single mutation, as queued by the replicator
//! - `EditOutcome`: What a mutation actually did
//! - `DeckSnapshot`: Complete serializable state of one store
//!
//! Every mutation takes a [`WriteToken`] and re-validates it. A rejected
//! call returns an error and leaves the store untouched.
//!
//! Slot sequences are `im::Vector`, so taking a snapshot is O(1).

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::listing::DeckList;
use super::ownership::WriteToken;
use crate::cards::{CardId, Format};
use crate::core::{DeckLimits, SeatId, ShuffleRng, ShuffleRngState};
use crate::error::DeckError;

/// Name given to a deck that was never named.
pub const DEFAULT_DECK_NAME: &str = "New Deck";

/// One deck slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeckEntry {
    #[default]
    Empty,
    Card(CardId),
}

impl DeckEntry {
    /// The card in this slot.
    #[must_use]
    pub fn card(&self) -> Option<&CardId> {
        match self {
            DeckEntry::Card(id) => Some(id),
            DeckEntry::Empty => None,
        }
    }

    /// True if no card occupies the slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, DeckEntry::Empty)
    }
}

/// Main deck or sideboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Main,
    Sideboard,
}

/// A deck mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckEdit {
    /// Fill main from the ids (truncating to capacity), empty the sideboard,
    /// and rewind the cursor.
    Initialize(Vec<CardId>),
    /// Replace name, format, main, and sideboard from a deck list.
    Load(DeckList),
    Shuffle,
    Draw,
    AddToMain(CardId),
    AddToSideboard(CardId),
    RemoveById(CardId),
    Rename(String),
    SetFormat(Format),
    Reset,
}

impl DeckEdit {
    /// True if the edit can change deck legality.
    ///
    /// Shuffles, draws, and renames never do, so a batch of only those is
    /// committed without validation.
    #[must_use]
    pub fn is_list_edit(&self) -> bool {
        !matches!(self, DeckEdit::Shuffle | DeckEdit::Draw | DeckEdit::Rename(_))
    }
}

/// Result of applying a [`DeckEdit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The store changed.
    Applied,
    /// Nothing to do: deck full, id absent, or draw past the end.
    NoOp,
    /// The cursor advanced past this card.
    Drawn(CardId),
    /// The id was placed at this slot.
    Placed(Section, usize),
    /// The id was cleared from this slot.
    Removed(Section, usize),
}

/// Complete state of one deck store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSnapshot {
    pub seat: SeatId,
    pub name: String,
    pub format: Format,
    pub main: Vector<DeckEntry>,
    pub sideboard: Vector<DeckEntry>,
    pub cursor: usize,
    /// Position of the seat's shuffle stream, so a new owner continues it.
    pub rng: ShuffleRngState,
}

/// Ordered, fixed-capacity deck for one seat.
#[derive(Clone, Debug)]
pub struct DeckStore {
    seat: SeatId,
    name: String,
    format: Format,
    main: Vector<DeckEntry>,
    sideboard: Vector<DeckEntry>,
    /// Number of main cards already drawn. Always `<=` the occupied count.
    cursor: usize,
    rng: ShuffleRng,
}

fn empty_slots(capacity: usize) -> Vector<DeckEntry> {
    std::iter::repeat(DeckEntry::Empty).take(capacity).collect()
}

fn fill_slots(capacity: usize, ids: impl IntoIterator<Item = CardId>) -> Vector<DeckEntry> {
    ids.into_iter()
        .map(DeckEntry::Card)
        .chain(std::iter::repeat(DeckEntry::Empty))
        .take(capacity)
        .collect()
}

fn fit_slots(slots: &Vector<DeckEntry>, capacity: usize) -> Vector<DeckEntry> {
    slots
        .iter()
        .cloned()
        .chain(std::iter::repeat(DeckEntry::Empty))
        .take(capacity)
        .collect()
}

fn occupied_ids(slots: &Vector<DeckEntry>) -> impl Iterator<Item = &CardId> {
    slots.iter().filter_map(DeckEntry::card)
}

impl DeckStore {
    /// Allocate an empty store for `seat`.
    ///
    /// `rng` drives this seat's shuffles; give each seat its own stream.
    #[must_use]
    pub fn new(seat: SeatId, limits: &DeckLimits, rng: ShuffleRng) -> Self {
        Self {
            seat,
            name: DEFAULT_DECK_NAME.to_string(),
            format: Format::standard(),
            main: empty_slots(limits.main_capacity),
            sideboard: empty_slots(limits.sideboard_capacity),
            cursor: 0,
            rng,
        }
    }

    fn authorize(&self, token: &WriteToken<'_>) -> Result<(), DeckError> {
        token.check(self.seat).map_err(|err| {
            warn!(seat = %self.seat, %err, "deck mutation rejected");
            err
        })
    }

    /// Fill main from `ids`, empty the sideboard, and rewind the cursor.
    ///
    /// Extra ids past the main capacity are dropped.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn initialize(
        &mut self,
        token: &WriteToken<'_>,
        ids: impl IntoIterator<Item = CardId>,
    ) -> Result<(), DeckError> {
        self.authorize(token)?;
        self.main = fill_slots(self.main.len(), ids);
        self.sideboard = empty_slots(self.sideboard.len());
        self.cursor = 0;
        Ok(())
    }

    /// Replace name, format, and both sections from a deck list.
    ///
    /// Each section is truncated to its capacity.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn load_list(&mut self, token: &WriteToken<'_>, list: &DeckList) -> Result<(), DeckError> {
        self.authorize(token)?;
        self.name = list.name.clone();
        self.format = list.format.clone();
        self.main = fill_slots(self.main.len(), list.main.iter().cloned());
        self.sideboard = fill_slots(self.sideboard.len(), list.sideboard.iter().cloned());
        self.cursor = 0;
        Ok(())
    }

    /// Shuffle the occupied main range in place.
    ///
    /// Fisher–Yates from the last occupied index down to 1, swapping with
    /// a uniform `j` in `[0, i]`. Slots past the last occupied one are
    /// never moved; holes inside the range are shuffled like cards. The
    /// cursor is left where it is.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn shuffle(&mut self, token: &WriteToken<'_>) -> Result<(), DeckError> {
        self.authorize(token)?;
        let occupied = self.occupied_len();
        for i in (1..occupied).rev() {
            let j = self.rng.index_up_to(i);
            self.main.swap(i, j);
        }
        Ok(())
    }

    /// Expose the next undrawn card and advance.
    ///
    /// Holes are skipped. Returns `None` once every main card has been
    /// drawn, so `main_count()` draws always reach the end.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn draw(&mut self, token: &WriteToken<'_>) -> Result<Option<CardId>, DeckError> {
        self.authorize(token)?;
        let Some(id) = occupied_ids(&self.main).nth(self.cursor).cloned() else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some(id))
    }

    /// Put `id` in the first empty main slot. `None` if main is full.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn add_to_main(&mut self, token: &WriteToken<'_>, id: CardId) -> Result<Option<usize>, DeckError> {
        self.authorize(token)?;
        let Some(index) = place(&mut self.main, id) else {
            return Ok(None);
        };
        if self.cards_before(index) < self.cursor {
            self.cursor += 1;
        }
        Ok(Some(index))
    }

    /// Put `id` in the first empty sideboard slot. `None` if full.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn add_to_sideboard(
        &mut self,
        token: &WriteToken<'_>,
        id: CardId,
    ) -> Result<Option<usize>, DeckError> {
        self.authorize(token)?;
        Ok(place(&mut self.sideboard, id))
    }

    /// Clear the first slot holding `id`, searching main then sideboard.
    ///
    /// Returns where it was, or `None` if the id is absent.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn remove_by_id(
        &mut self,
        token: &WriteToken<'_>,
        id: &CardId,
    ) -> Result<Option<(Section, usize)>, DeckError> {
        self.authorize(token)?;
        if let Some(index) = clear_first(&mut self.main, id) {
            if self.cards_before(index) < self.cursor {
                self.cursor -= 1;
            }
            return Ok(Some((Section::Main, index)));
        }
        Ok(clear_first(&mut self.sideboard, id).map(|index| (Section::Sideboard, index)))
    }

    /// Rename the deck.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn rename(&mut self, token: &WriteToken<'_>, name: impl Into<String>) -> Result<(), DeckError> {
        self.authorize(token)?;
        self.name = name.into();
        Ok(())
    }

    /// Change the deck's format.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn set_format(&mut self, token: &WriteToken<'_>, format: Format) -> Result<(), DeckError> {
        self.authorize(token)?;
        self.format = format;
        Ok(())
    }

    /// Clear every slot and the cursor. Name and format are kept.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn reset(&mut self, token: &WriteToken<'_>) -> Result<(), DeckError> {
        self.authorize(token)?;
        self.clear();
        Ok(())
    }

    /// Apply one queued edit.
    ///
    /// # Errors
    ///
    /// Rejected without a valid token for this seat.
    pub fn apply_edit(&mut self, token: &WriteToken<'_>, edit: &DeckEdit) -> Result<EditOutcome, DeckError> {
        let outcome = match edit {
            DeckEdit::Initialize(ids) => {
                self.initialize(token, ids.iter().cloned())?;
                EditOutcome::Applied
            }
            DeckEdit::Load(list) => {
                self.load_list(token, list)?;
                EditOutcome::Applied
            }
            DeckEdit::Shuffle => {
                self.shuffle(token)?;
                EditOutcome::Applied
            }
            DeckEdit::Draw => match self.draw(token)? {
                Some(id) => EditOutcome::Drawn(id),
                None => EditOutcome::NoOp,
            },
            DeckEdit::AddToMain(id) => match self.add_to_main(token, id.clone())? {
                Some(index) => EditOutcome::Placed(Section::Main, index),
                None => EditOutcome::NoOp,
            },
            DeckEdit::AddToSideboard(id) => match self.add_to_sideboard(token, id.clone())? {
                Some(index) => EditOutcome::Placed(Section::Sideboard, index),
                None => EditOutcome::NoOp,
            },
            DeckEdit::RemoveById(id) => match self.remove_by_id(token, id)? {
                Some((section, index)) => EditOutcome::Removed(section, index),
                None => EditOutcome::NoOp,
            },
            DeckEdit::Rename(name) => {
                self.rename(token, name.clone())?;
                EditOutcome::Applied
            }
            DeckEdit::SetFormat(format) => {
                self.set_format(token, format.clone())?;
                EditOutcome::Applied
            }
            DeckEdit::Reset => {
                self.reset(token)?;
                EditOutcome::Applied
            }
        };
        Ok(outcome)
    }

    /// Capture the full state.
    #[must_use]
    pub fn snapshot(&self) -> DeckSnapshot {
        DeckSnapshot {
            seat: self.seat,
            name: self.name.clone(),
            format: self.format.clone(),
            main: self.main.clone(),
            sideboard: self.sideboard.clone(),
            cursor: self.cursor,
            rng: self.rng.state(),
        }
    }

    /// Replace the state with a snapshot.
    ///
    /// Not ownership-gated: observers mirror the owner's snapshots, and
    /// the owner restores its own last commit when discarding an edit.
    /// Slot sequences are fitted to this store's capacities, and the
    /// shuffle stream resumes where the snapshot left it.
    pub(crate) fn restore(&mut self, snapshot: &DeckSnapshot) {
        self.name = snapshot.name.clone();
        self.format = snapshot.format.clone();
        self.main = fit_slots(&snapshot.main, self.main.len());
        self.sideboard = fit_slots(&snapshot.sideboard, self.sideboard.len());
        self.cursor = snapshot.cursor.min(self.main_count());
        self.rng = ShuffleRng::from_state(&snapshot.rng);
    }

    /// Cards in main slots before `index`.
    fn cards_before(&self, index: usize) -> usize {
        self.main.iter().take(index).filter(|e| !e.is_empty()).count()
    }

    /// Clear without a token. Used when the seat itself goes away.
    pub(crate) fn clear(&mut self) {
        self.main = empty_slots(self.main.len());
        self.sideboard = empty_slots(self.sideboard.len());
        self.cursor = 0;
    }

    /// Seat this store belongs to.
    #[must_use]
    pub fn seat(&self) -> SeatId {
        self.seat
    }

    /// Deck name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deck format.
    #[must_use]
    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Number of main cards drawn so far.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// One past the last occupied main slot; 0 if main is empty.
    #[must_use]
    pub fn occupied_len(&self) -> usize {
        self.main
            .iter()
            .rposition(|e| !e.is_empty())
            .map_or(0, |last| last + 1)
    }

    /// Number of cards in main.
    #[must_use]
    pub fn main_count(&self) -> usize {
        occupied_ids(&self.main).count()
    }

    /// Number of cards in the sideboard.
    #[must_use]
    pub fn sideboard_count(&self) -> usize {
        occupied_ids(&self.sideboard).count()
    }

    /// Main slot capacity.
    #[must_use]
    pub fn main_capacity(&self) -> usize {
        self.main.len()
    }

    /// Sideboard slot capacity.
    #[must_use]
    pub fn sideboard_capacity(&self) -> usize {
        self.sideboard.len()
    }

    /// True if main slot `index` holds a card that has been drawn.
    #[must_use]
    pub fn is_exposed(&self, index: usize) -> bool {
        self.main.get(index).is_some_and(|e| !e.is_empty())
            && self.cards_before(index) < self.cursor
    }

    /// Main slots in order, including holes.
    #[must_use]
    pub fn main_slots(&self) -> &Vector<DeckEntry> {
        &self.main
    }

    /// Sideboard slots in order, including holes.
    #[must_use]
    pub fn sideboard_slots(&self) -> &Vector<DeckEntry> {
        &self.sideboard
    }

    /// Card ids in main, in slot order.
    pub fn main_ids(&self) -> impl Iterator<Item = &CardId> {
        occupied_ids(&self.main)
    }

    /// Card ids in the sideboard, in slot order.
    pub fn sideboard_ids(&self) -> impl Iterator<Item = &CardId> {
        occupied_ids(&self.sideboard)
    }

    /// Export as a deck list.
    #[must_use]
    pub fn to_list(&self) -> DeckList {
        DeckList {
            name: self.name.clone(),
            format: self.format.clone(),
            main: self.main_ids().cloned().collect(),
            sideboard: self.sideboard_ids().cloned().collect(),
        }
    }
}

fn place(slots: &mut Vector<DeckEntry>, id: CardId) -> Option<usize> {
    let index = slots.iter().position(DeckEntry::is_empty)?;
    slots.set(index, DeckEntry::Card(id));
    Some(index)
}

fn clear_first(slots: &mut Vector<DeckEntry>, id: &CardId) -> Option<usize> {
    let index = slots.iter().position(|e| e.card() == Some(id))?;
    slots.set(index, DeckEntry::Empty);
    Some(index)
}
