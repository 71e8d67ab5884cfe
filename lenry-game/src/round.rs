//! Nomination and voting state machine.
//!
//! `Nominating -> Voting -> Resolved`. Every transition borrows the current
//! phase and hands back the next one, so a rejected call leaves the caller's
//! value exactly as it was.
use serde::{Deserialize, Serialize};

use crate::eligibility::is_eligible;
use crate::error::GameError;

/// Result of counting a round's votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Elected,
    Rejected,
}

/// Ballots indexed by voter seat; `None` until that seat votes.
pub type Ballots = Vec<Option<bool>>;

/// Phase of the current voting round.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RoundPhase {
    /// No round is open; the governor has yet to nominate.
    #[default]
    Nominating,
    Voting {
        candidate: usize,
        votes: Ballots,
    },
    Resolved {
        candidate: usize,
        votes: Ballots,
        outcome: Outcome,
    },
}

impl RoundPhase {
    /// Phase description used in `InvalidState` errors.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Nominating => "while nominating",
            Self::Voting { .. } => "while votes are open",
            Self::Resolved { .. } => "after the vote resolved",
        }
    }

    #[must_use]
    pub const fn candidate(&self) -> Option<usize> {
        match self {
            Self::Nominating => None,
            Self::Voting { candidate, .. } | Self::Resolved { candidate, .. } => Some(*candidate),
        }
    }

    #[must_use]
    pub fn votes(&self) -> Option<&[Option<bool>]> {
        match self {
            Self::Nominating => None,
            Self::Voting { votes, .. } | Self::Resolved { votes, .. } => Some(votes),
        }
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::Resolved { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }

    /// Approvals recorded so far.
    #[must_use]
    pub fn approvals(&self) -> usize {
        self.votes()
            .map_or(0, |votes| votes.iter().filter(|v| **v == Some(true)).count())
    }

    /// Open a round for `candidate`.
    ///
    /// # Errors
    ///
    /// `InvalidState` when a round is already open or resolved,
    /// `IneligibleCandidate` when the eligibility filter excludes the seat.
    pub fn nominate(
        &self,
        player_count: usize,
        governor: usize,
        candidate: usize,
    ) -> Result<Self, GameError> {
        if !matches!(self, Self::Nominating) {
            return Err(self.invalid("nominate"));
        }
        if !is_eligible(player_count, governor, candidate) {
            return Err(GameError::IneligibleCandidate {
                candidate,
                governor,
            });
        }
        Ok(Self::Voting {
            candidate,
            votes: vec![None; player_count],
        })
    }

    /// Record a single seat's vote.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside the voting phase, `UnknownVoter` for a seat that
    /// does not exist, `DuplicateVote` when the seat already voted.
    pub fn cast_vote(&self, voter: usize, approve: bool) -> Result<Self, GameError> {
        let Self::Voting { candidate, votes } = self else {
            return Err(self.invalid("cast_vote"));
        };
        match votes.get(voter) {
            None => Err(GameError::UnknownVoter {
                voter,
                seats: votes.len(),
            }),
            Some(Some(_)) => Err(GameError::DuplicateVote(voter)),
            Some(None) => {
                let mut votes = votes.clone();
                votes[voter] = Some(approve);
                Ok(Self::Voting {
                    candidate: *candidate,
                    votes,
                })
            }
        }
    }

    /// Count the votes against every seat at the table.
    ///
    /// A seat that never voted counts as not approving.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless votes are open; resolving twice is an error.
    pub fn resolve(&self) -> Result<Self, GameError> {
        let Self::Voting { candidate, votes } = self else {
            return Err(self.invalid("resolve"));
        };
        let approvals = votes.iter().filter(|v| **v == Some(true)).count();
        let outcome = if is_majority(approvals, votes.len()) {
            Outcome::Elected
        } else {
            Outcome::Rejected
        };
        Ok(Self::Resolved {
            candidate: *candidate,
            votes: votes.clone(),
            outcome,
        })
    }

    pub(crate) const fn invalid(&self, operation: &'static str) -> GameError {
        GameError::InvalidState {
            operation,
            phase: self.label(),
        }
    }
}

/// Strictly more than half of all seats.
#[must_use]
pub const fn is_majority(approvals: usize, seats: usize) -> bool {
    approvals * 2 > seats
}
