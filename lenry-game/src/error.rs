//! Error types raised by the engine and its persistence wrapper.
use thiserror::Error;

use crate::config::RulesConfigError;

/// Failures raised by game operations.
///
/// Every variant is returned before any state is touched, so a failed call
/// leaves the previous [`crate::Game`] value untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("games need between {min} and {max} players (got {count})")]
    InvalidPlayerCount { count: usize, min: usize, max: usize },
    #[error("player {0:?} is seated more than once")]
    DuplicatePlayer(String),
    #[error("player {0:?} is not seated in this game")]
    UnknownPlayer(String),
    #[error("seat {candidate} cannot be nominated while seat {governor} governs")]
    IneligibleCandidate { candidate: usize, governor: usize },
    #[error("{operation} is not valid {phase}")]
    InvalidState {
        operation: &'static str,
        phase: &'static str,
    },
    #[error("seat {0} has already voted this round")]
    DuplicateVote(usize),
    #[error("seat {voter} is not seated (table has {seats} seats)")]
    UnknownVoter { voter: usize, seats: usize },
    #[error("discard index {index} is out of range for a hand of {hand}")]
    InvalidChoice { index: usize, hand: usize },
    #[error("cannot draw {requested} policies with only {available} available")]
    InsufficientCards { requested: usize, available: usize },
    #[error("persisted game is corrupt: {0}")]
    CorruptPersistedState(String),
    #[error(transparent)]
    Rules(#[from] RulesConfigError),
}

impl GameError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptPersistedState(reason.into())
    }
}

/// Failures raised by [`crate::GameEngine`] while running a load/apply/save cycle.
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("storage failure: {0}")]
    Storage(#[source] E),
    #[error("no game stored for host {0:?}")]
    NotFound(String),
}
