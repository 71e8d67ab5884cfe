//! Host-tunable rules: deck composition and win thresholds.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    FASCIST_POLICIES_TO_WIN, FASCIST_POLICY_COUNT, HAND_SIZE, LENRY_ELECTED_AFTER,
    LIBERAL_POLICIES_TO_WIN, LIBERAL_POLICY_COUNT,
};
use crate::deck::DeckComposition;

/// Rules a game is played under.
///
/// The defaults describe the standard game. Missing JSON fields fall back to
/// their defaults, so a rules file only has to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "RulesConfig::default_liberal_to_win")]
    pub liberal_to_win: u8,
    #[serde(default = "RulesConfig::default_fascist_to_win")]
    pub fascist_to_win: u8,
    #[serde(default = "RulesConfig::default_lenry_elected_after")]
    pub lenry_elected_after: u8,
    #[serde(default = "RulesConfig::default_liberal_cards")]
    pub liberal_cards: u8,
    #[serde(default = "RulesConfig::default_fascist_cards")]
    pub fascist_cards: u8,
    /// When false, running out of cards is reported as `InsufficientCards`
    /// instead of folding the discard pile back into the draw pile.
    #[serde(default = "RulesConfig::default_reshuffle")]
    pub reshuffle: bool,
}

impl RulesConfig {
    const fn default_liberal_to_win() -> u8 {
        LIBERAL_POLICIES_TO_WIN
    }

    const fn default_fascist_to_win() -> u8 {
        FASCIST_POLICIES_TO_WIN
    }

    const fn default_lenry_elected_after() -> u8 {
        LENRY_ELECTED_AFTER
    }

    const fn default_liberal_cards() -> u8 {
        LIBERAL_POLICY_COUNT
    }

    const fn default_fascist_cards() -> u8 {
        FASCIST_POLICY_COUNT
    }

    const fn default_reshuffle() -> bool {
        true
    }

    /// Load rules from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a rules object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Deck composition implied by these rules.
    #[must_use]
    pub const fn composition(&self) -> DeckComposition {
        DeckComposition {
            liberal: self.liberal_cards,
            fascist: self.fascist_cards,
        }
    }

    /// Check that the rules describe a game that can actually finish.
    ///
    /// # Errors
    ///
    /// Returns `RulesConfigError` when a threshold is zero, exceeds the cards
    /// available for it, or the deck cannot fill a single hand.
    pub fn validate(&self) -> Result<(), RulesConfigError> {
        Self::validate_threshold("liberal_to_win", self.liberal_to_win, self.liberal_cards)?;
        Self::validate_threshold("fascist_to_win", self.fascist_to_win, self.fascist_cards)?;
        if self.lenry_elected_after > self.fascist_to_win {
            return Err(RulesConfigError::LenryThreshold {
                lenry_elected_after: self.lenry_elected_after,
                fascist_to_win: self.fascist_to_win,
            });
        }
        let total = usize::from(self.composition().total());
        if total < HAND_SIZE {
            return Err(RulesConfigError::DeckTooSmall {
                cards: total,
                hand: HAND_SIZE,
            });
        }
        Ok(())
    }

    fn validate_threshold(
        field: &'static str,
        threshold: u8,
        available: u8,
    ) -> Result<(), RulesConfigError> {
        if threshold == 0 {
            return Err(RulesConfigError::ZeroThreshold { field });
        }
        if threshold > available {
            return Err(RulesConfigError::Unreachable {
                field,
                threshold,
                available,
            });
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            liberal_to_win: Self::default_liberal_to_win(),
            fascist_to_win: Self::default_fascist_to_win(),
            lenry_elected_after: Self::default_lenry_elected_after(),
            liberal_cards: Self::default_liberal_cards(),
            fascist_cards: Self::default_fascist_cards(),
            reshuffle: Self::default_reshuffle(),
        }
    }
}

/// Errors raised when rules invariants are violated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RulesConfigError {
    #[error("{field} must be at least 1")]
    ZeroThreshold { field: &'static str },
    #[error("{field} of {threshold} can never be reached with {available} cards")]
    Unreachable {
        field: &'static str,
        threshold: u8,
        available: u8,
    },
    #[error(
        "lenry_elected_after ({lenry_elected_after}) exceeds fascist_to_win ({fascist_to_win})"
    )]
    LenryThreshold {
        lenry_elected_after: u8,
        fascist_to_win: u8,
    },
    #[error("deck of {cards} cards cannot fill a hand of {hand}")]
    DeckTooSmall { cards: usize, hand: usize },
}
