use std::fmt;

use lenry_game::{Game, Policy, Team};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Seat-level decisions a bot table makes during a round.
///
/// Bots see every role. The harness is exercising the engine, not bluffing.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick a main squeeze from `eligible` (never empty).
    fn nominate(&mut self, game: &Game, eligible: &[usize]) -> usize;

    /// Ballot of `voter` on `candidate`.
    fn vote(&mut self, game: &Game, voter: usize, candidate: usize) -> bool;

    /// Index of the card `seat` throws away from `hand`.
    fn discard(&mut self, game: &Game, seat: usize, hand: &[Policy]) -> usize;
}

/// Built-in bot behaviours for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    /// Everybody approves and the first card is always thrown away.
    Cooperative,
    /// Seats vote and discard for their own team.
    Partisan,
    Random,
    /// Most ballots are rejections, so governors rotate a lot.
    Obstructive,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [
        Self::Cooperative,
        Self::Partisan,
        Self::Random,
        Self::Obstructive,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cooperative => "Cooperative",
            Self::Partisan => "Partisan",
            Self::Random => "Random",
            Self::Obstructive => "Obstructive",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Cooperative => Box::new(CooperativePolicy),
            Self::Partisan => Box::new(PartisanPolicy::new(seed)),
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Obstructive => Box::new(ObstructivePolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CooperativePolicy;

struct PartisanPolicy {
    rng: ChaCha20Rng,
}

struct RandomPolicy {
    rng: ChaCha20Rng,
}

struct ObstructivePolicy {
    rng: ChaCha20Rng,
    approval_chance: f64,
}

impl PartisanPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl ObstructivePolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            approval_chance: 0.4,
        }
    }
}

fn team_of(game: &Game, seat: usize) -> Option<Team> {
    game.role_of(seat).map(lenry_game::Role::team)
}

/// The policy type `team` would rather see thrown away.
const fn unwanted_policy(team: Team) -> Policy {
    match team {
        Team::Janitors => Policy::Fascist,
        Team::Henries => Policy::Liberal,
    }
}

fn random_index<R: Rng>(rng: &mut R, len: usize) -> usize {
    if len == 0 { 0 } else { rng.gen_range(0..len) }
}

impl PlayerPolicy for CooperativePolicy {
    fn name(&self) -> &'static str {
        "Cooperative"
    }

    fn nominate(&mut self, _game: &Game, eligible: &[usize]) -> usize {
        eligible.first().copied().unwrap_or_default()
    }

    fn vote(&mut self, _game: &Game, _voter: usize, _candidate: usize) -> bool {
        true
    }

    fn discard(&mut self, _game: &Game, _seat: usize, _hand: &[Policy]) -> usize {
        0
    }
}

impl PlayerPolicy for PartisanPolicy {
    fn name(&self) -> &'static str {
        "Partisan"
    }

    fn nominate(&mut self, game: &Game, eligible: &[usize]) -> usize {
        let own_team = team_of(game, game.governor());
        let allies: Vec<usize> = eligible
            .iter()
            .copied()
            .filter(|seat| team_of(game, *seat) == own_team)
            .collect();
        let pool: &[usize] = if allies.is_empty() { eligible } else { &allies };
        pool.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn vote(&mut self, game: &Game, voter: usize, candidate: usize) -> bool {
        team_of(game, voter) == team_of(game, candidate)
    }

    fn discard(&mut self, game: &Game, seat: usize, hand: &[Policy]) -> usize {
        let Some(team) = team_of(game, seat) else {
            return 0;
        };
        let unwanted = unwanted_policy(team);
        hand.iter()
            .position(|card| *card == unwanted)
            .unwrap_or_else(|| random_index(&mut self.rng, hand.len()))
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn nominate(&mut self, _game: &Game, eligible: &[usize]) -> usize {
        eligible.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn vote(&mut self, _game: &Game, _voter: usize, _candidate: usize) -> bool {
        self.rng.gen_bool(0.5)
    }

    fn discard(&mut self, _game: &Game, _seat: usize, hand: &[Policy]) -> usize {
        random_index(&mut self.rng, hand.len())
    }
}

impl PlayerPolicy for ObstructivePolicy {
    fn name(&self) -> &'static str {
        "Obstructive"
    }

    fn nominate(&mut self, _game: &Game, eligible: &[usize]) -> usize {
        eligible.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn vote(&mut self, _game: &Game, _voter: usize, _candidate: usize) -> bool {
        self.rng.gen_bool(self.approval_chance)
    }

    fn discard(&mut self, _game: &Game, _seat: usize, hand: &[Policy]) -> usize {
        random_index(&mut self.rng, hand.len())
    }
}
