//! Hidden roles and the per-table role distribution.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_PLAYERS, MIN_PLAYERS};
use crate::error::GameError;

/// Hidden role dealt to a seat at game creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Majority role; wins by enacting liberal-type policies.
    #[serde(rename = "j")]
    Janitor,
    /// Henry-aligned minority; knows it sides with Lenry.
    #[serde(rename = "h")]
    Henry,
    /// The unique big bad. Exactly one per game.
    #[serde(rename = "l")]
    Lenry,
}

impl Role {
    #[must_use]
    pub const fn team(self) -> Team {
        match self {
            Self::Janitor => Team::Janitors,
            Self::Henry | Self::Lenry => Team::Henries,
        }
    }
}

/// Side a role plays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Janitors,
    Henries,
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Janitors => write!(f, "janitors"),
            Self::Henries => write!(f, "henries"),
        }
    }
}

/// One row of the role distribution table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleCounts {
    pub janitor: usize,
    pub henry: usize,
    pub lenry: usize,
}

const ROLE_TABLE: [RoleCounts; MAX_PLAYERS - MIN_PLAYERS + 1] = [
    RoleCounts::new(3, 1),
    RoleCounts::new(4, 1),
    RoleCounts::new(4, 2),
    RoleCounts::new(5, 2),
    RoleCounts::new(5, 3),
    RoleCounts::new(6, 3),
];

impl RoleCounts {
    const fn new(janitor: usize, henry: usize) -> Self {
        Self {
            janitor,
            henry,
            lenry: 1,
        }
    }

    #[must_use]
    pub const fn total(self) -> usize {
        self.janitor + self.henry + self.lenry
    }

    /// The unshuffled role multiset for this row.
    #[must_use]
    pub fn roles(self) -> Vec<Role> {
        let mut roles = Vec::with_capacity(self.total());
        roles.extend(std::iter::repeat_n(Role::Janitor, self.janitor));
        roles.extend(std::iter::repeat_n(Role::Henry, self.henry));
        roles.extend(std::iter::repeat_n(Role::Lenry, self.lenry));
        roles
    }

    /// Whether `roles` contains exactly the counts of this row.
    #[must_use]
    pub fn matches(self, roles: &[Role]) -> bool {
        let count = |wanted: Role| roles.iter().filter(|role| **role == wanted).count();
        roles.len() == self.total()
            && count(Role::Janitor) == self.janitor
            && count(Role::Henry) == self.henry
            && count(Role::Lenry) == self.lenry
    }
}

/// Role distribution for a table of `player_count`, if that size is supported.
#[must_use]
pub fn role_counts(player_count: usize) -> Option<RoleCounts> {
    player_count
        .checked_sub(MIN_PLAYERS)
        .and_then(|idx| ROLE_TABLE.get(idx))
        .copied()
}

/// Check that a table size is supported.
///
/// # Errors
///
/// Returns `InvalidPlayerCount` outside the supported range.
pub fn check_player_count(player_count: usize) -> Result<RoleCounts, GameError> {
    role_counts(player_count).ok_or(GameError::InvalidPlayerCount {
        count: player_count,
        min: MIN_PLAYERS,
        max: MAX_PLAYERS,
    })
}

/// Deal hidden roles to `players`.
///
/// The returned roles are parallel to `players`: seat `i` receives `roles[i]`.
///
/// # Errors
///
/// Returns `InvalidPlayerCount` unless there are between 5 and 10 players.
pub fn assign_roles<S, R>(players: &[S], rng: &mut R) -> Result<Vec<Role>, GameError>
where
    R: Rng + ?Sized,
{
    let counts = check_player_count(players.len())?;
    let mut roles = counts.roles();
    roles.shuffle(rng);
    Ok(roles)
}
