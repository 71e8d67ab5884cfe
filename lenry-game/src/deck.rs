//! Policy cards and the draw/discard/reshuffle lifecycle.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::constants::{FASCIST_POLICY_COUNT, LIBERAL_POLICY_COUNT};
use crate::error::GameError;

/// A policy card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Policy {
    #[serde(rename = "l")]
    Liberal,
    #[serde(rename = "h")]
    Fascist,
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Liberal => write!(f, "liberal"),
            Self::Fascist => write!(f, "fascist"),
        }
    }
}

/// How many cards of each type a fresh deck holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckComposition {
    pub liberal: u8,
    pub fascist: u8,
}

impl DeckComposition {
    #[must_use]
    pub const fn total(self) -> u16 {
        self.liberal as u16 + self.fascist as u16
    }
}

impl Default for DeckComposition {
    fn default() -> Self {
        Self {
            liberal: LIBERAL_POLICY_COUNT,
            fascist: FASCIST_POLICY_COUNT,
        }
    }
}

/// Build the standard 17-card deck and shuffle it.
#[must_use]
pub fn create_deck<R: Rng + ?Sized>(rng: &mut R) -> Vec<Policy> {
    create_deck_with(DeckComposition::default(), rng)
}

/// Build a deck of the given composition and shuffle it.
#[must_use]
pub fn create_deck_with<R: Rng + ?Sized>(composition: DeckComposition, rng: &mut R) -> Vec<Policy> {
    let mut cards = Vec::with_capacity(usize::from(composition.total()));
    cards.extend(std::iter::repeat_n(
        Policy::Liberal,
        usize::from(composition.liberal),
    ));
    cards.extend(std::iter::repeat_n(
        Policy::Fascist,
        usize::from(composition.fascist),
    ));
    cards.shuffle(rng);
    cards
}

/// Draw and discard piles. Cards in either pile are still in play; enacted
/// cards leave the deck and are tracked by the game's counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyDeck {
    draw: Vec<Policy>,
    discard: Vec<Policy>,
}

impl PolicyDeck {
    /// Freshly shuffled deck of `composition` with an empty discard pile.
    #[must_use]
    pub fn with_composition<R: Rng + ?Sized>(composition: DeckComposition, rng: &mut R) -> Self {
        Self::from_piles(create_deck_with(composition, rng), Vec::new())
    }

    /// Rebuild a deck from persisted piles.
    #[must_use]
    pub const fn from_piles(draw: Vec<Policy>, discard: Vec<Policy>) -> Self {
        Self { draw, discard }
    }

    #[must_use]
    pub fn draw_pile(&self) -> &[Policy] {
        &self.draw
    }

    #[must_use]
    pub fn discard_pile(&self) -> &[Policy] {
        &self.discard
    }

    /// Cards in both piles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.draw.len() + self.discard.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draw.is_empty() && self.discard.is_empty()
    }

    /// Count of `policy` across both piles.
    #[must_use]
    pub fn count(&self, policy: Policy) -> usize {
        self.draw
            .iter()
            .chain(&self.discard)
            .filter(|card| **card == policy)
            .count()
    }

    /// Take the top `n` cards, in order.
    ///
    /// When the draw pile is short and `reshuffle` is allowed, the discard pile
    /// is folded back in once before drawing.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientCards` when the draw cannot be covered. The deck is
    /// left untouched in that case.
    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        n: usize,
        reshuffle: bool,
        rng: &mut R,
    ) -> Result<Vec<Policy>, GameError> {
        if n > self.draw.len() {
            let available = if reshuffle { self.len() } else { self.draw.len() };
            if n > available {
                return Err(GameError::InsufficientCards {
                    requested: n,
                    available,
                });
            }
            self.reshuffle(rng);
        }
        let remaining = self.draw.split_off(n);
        let drawn = std::mem::replace(&mut self.draw, remaining);
        log::debug!(
            "drew {} policies ({} left to draw)",
            drawn.len(),
            self.draw.len()
        );
        Ok(drawn)
    }

    /// Append cards to the discard pile in the given order.
    pub fn discard(&mut self, cards: impl IntoIterator<Item = Policy>) {
        self.discard.extend(cards);
    }

    /// Fold the discard pile (and whatever is left of the draw pile) into a
    /// freshly shuffled draw pile.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut pile = std::mem::take(&mut self.draw);
        pile.append(&mut self.discard);
        pile.shuffle(rng);
        log::debug!("reshuffled discard pile into {} card draw pile", pile.len());
        self.draw = pile;
    }
}
