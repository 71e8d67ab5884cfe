use std::fmt;

use anyhow::{Context, Result, bail};
use lenry_game::{
    EngineError, Game, GameEngine, GameError, MemoryStore, Outcome, RulesConfig, Victory,
    stream_rng,
};
use rand_chacha::ChaCha20Rng;

use crate::logic::invariants::{check_game, check_transition};
use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

pub const HOST_ID: &str = "lenry-tester";
/// Rounds (nominations) before a run is declared stuck.
pub const DEFAULT_MAX_ROUNDS: usize = 400;

const STREAM_LEGISLATION: &[u8] = b"tester-legislation";
const STREAM_BOTS: &[u8] = b"tester-bots";

/// Everything needed to replay one bot game.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub player_count: usize,
    pub strategy: GameplayStrategy,
    pub rules: RulesConfig,
    pub max_rounds: usize,
    /// Route every transition through a [`GameEngine`] backed by a [`MemoryStore`].
    pub persist: bool,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(player_count: usize, strategy: GameplayStrategy) -> Self {
        Self {
            player_count,
            strategy,
            rules: RulesConfig::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            persist: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Nominate,
    Vote,
    Resolve,
    Draw,
    Discard,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Nominate => "nominate",
            Self::Vote => "vote",
            Self::Resolve => "resolve",
            Self::Draw => "draw",
            Self::Discard => "discard",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub round: usize,
    pub kind: TransitionKind,
    pub governor: usize,
    pub detail: String,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub config: SimulationConfig,
    pub initial: Game,
    pub final_game: Game,
    pub transitions: Vec<TransitionRecord>,
    pub rounds: usize,
    pub elections: usize,
    pub rejections: usize,
    /// Transitions that were stored and read back.
    pub persisted: usize,
    pub violations: Vec<String>,
    /// Why play stopped before a winner, if it did.
    pub halted: Option<String>,
    pub deck_exhausted: bool,
    pub victory: Option<Victory>,
}

impl SimulationSummary {
    #[must_use]
    pub const fn game_ended(&self) -> bool {
        self.victory.is_some()
    }

    /// The last few transitions, newest first.
    #[must_use]
    pub fn recent_transitions(&self, count: usize) -> String {
        if self.transitions.is_empty() {
            return "no transitions recorded".to_string();
        }
        self.transitions
            .iter()
            .rev()
            .take(count)
            .map(|t| {
                format!(
                    "round {} {} (governor {}) {}",
                    t.round, t.kind, t.governor, t.detail
                )
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Live table state while a run is in progress.
struct Table {
    engine: Option<GameEngine<MemoryStore>>,
    game: Game,
    round: usize,
    transitions: Vec<TransitionRecord>,
    violations: Vec<String>,
    persisted: usize,
}

impl Table {
    fn step<F>(&mut self, kind: TransitionKind, detail: String, action: F) -> Result<()>
    where
        F: FnOnce(&Game) -> Result<Game, GameError>,
    {
        let next = match &self.engine {
            Some(engine) => {
                let next = engine.apply(HOST_ID, action)?;
                let stored = engine
                    .load_game(HOST_ID)?
                    .context("stored game disappeared")?;
                if stored != next {
                    self.violations.push(format!(
                        "round {} {kind}: reloaded game differs from the applied one",
                        self.round
                    ));
                }
                self.persisted += 1;
                next
            }
            None => action(&self.game)?,
        };

        let round = self.round;
        self.violations.extend(
            check_transition(&self.game, &next)
                .into_iter()
                .map(|v| format!("round {round} {kind}: {v}")),
        );
        self.transitions.push(TransitionRecord {
            round,
            kind,
            governor: self.game.governor(),
            detail,
        });
        self.game = next;
        Ok(())
    }
}

fn seat_ids(count: usize) -> Vec<String> {
    (0..count).map(|idx| format!("bot-{idx}")).collect()
}

fn is_deck_exhausted(err: &anyhow::Error) -> bool {
    let exhausted = |game_err: &GameError| matches!(game_err, GameError::InsufficientCards { .. });
    err.downcast_ref::<GameError>().is_some_and(exhausted)
        || matches!(
            err.downcast_ref::<EngineError<serde_json::Error>>(),
            Some(EngineError::Game(game_err)) if exhausted(game_err)
        )
}

/// Play one full bot game for `seed`.
///
/// # Errors
///
/// Fails only when the table cannot be set up. Errors during play are
/// recorded on the summary as `halted`.
pub fn simulate(config: &SimulationConfig, seed: u64) -> Result<SimulationSummary> {
    let initial = Game::new_seeded(
        HOST_ID,
        seat_ids(config.player_count),
        config.rules.clone(),
        seed,
    )?;

    let engine = if config.persist {
        let engine = GameEngine::with_rules(MemoryStore::new(), config.rules.clone())?;
        engine.save_game(&initial)?;
        Some(engine)
    } else {
        None
    };

    let mut table = Table {
        engine,
        game: initial.clone(),
        round: 0,
        transitions: Vec::new(),
        violations: check_game(&initial),
        persisted: 0,
    };
    let mut policy = config.strategy.create_policy(bot_seed(seed));
    let mut draw_rng = stream_rng(seed, STREAM_LEGISLATION);
    log::debug!(
        "seed {seed}: {} seats played by {} bots",
        config.player_count,
        policy.name()
    );
    let mut elections = 0;
    let mut rejections = 0;
    let mut halted = None;
    let mut deck_exhausted = false;

    while !table.game.is_over() && table.round < config.max_rounds {
        table.round += 1;
        match play_round(&mut table, policy.as_mut(), &mut draw_rng) {
            Ok(Outcome::Elected) => elections += 1,
            Ok(Outcome::Rejected) => rejections += 1,
            Err(err) => {
                deck_exhausted = is_deck_exhausted(&err);
                log::debug!("seed {seed}: play halted: {err:#}");
                halted = Some(format!("{err:#}"));
                break;
            }
        }
    }
    if halted.is_none() && !table.game.is_over() {
        halted = Some(format!("no winner after {} rounds", table.round));
    }

    let victory = table.game.winner();
    Ok(SimulationSummary {
        seed,
        config: config.clone(),
        initial,
        final_game: table.game,
        transitions: table.transitions,
        rounds: table.round,
        elections,
        rejections,
        persisted: table.persisted,
        violations: table.violations,
        halted,
        deck_exhausted,
        victory,
    })
}

/// One nomination, its vote and, when elected, the legislative session.
fn play_round(
    table: &mut Table,
    policy: &mut dyn PlayerPolicy,
    draw_rng: &mut ChaCha20Rng,
) -> Result<Outcome> {
    let eligible: Vec<usize> = table.game.eligible_candidates().into_iter().collect();
    let candidate = policy.nominate(&table.game, &eligible);
    table.step(
        TransitionKind::Nominate,
        format!("seat {candidate}"),
        |g| g.nominate(candidate),
    )?;

    for voter in 0..table.game.player_count() {
        let approve = policy.vote(&table.game, voter, candidate);
        table.step(
            TransitionKind::Vote,
            format!("seat {voter} {}", if approve { "approves" } else { "rejects" }),
            |g| g.cast_vote(voter, approve),
        )?;
    }

    let mut outcome = Outcome::Rejected;
    table.step(TransitionKind::Resolve, String::new(), |g| {
        let (next, resolved) = g.resolve()?;
        outcome = resolved;
        Ok(next)
    })?;
    if outcome == Outcome::Rejected || table.game.is_over() {
        return Ok(outcome);
    }

    table.step(TransitionKind::Draw, String::new(), |g| {
        g.draw_policies(draw_rng)
    })?;

    let governor = table.game.governor();
    let hand = table.game.hand().to_vec();
    let index = policy.discard(&table.game, governor, &hand);
    table.step(
        TransitionKind::Discard,
        format!("governor drops {index} of {hand:?}"),
        |g| g.choose_discard(index),
    )?;

    let Some(main_squeeze) = table.game.main_squeeze() else {
        bail!("legislation reached the main squeeze with nobody elected");
    };
    let hand = table.game.hand().to_vec();
    let index = policy.discard(&table.game, main_squeeze, &hand);
    table.step(
        TransitionKind::Discard,
        format!("main squeeze drops {index} of {hand:?}"),
        |g| g.choose_discard(index),
    )?;
    Ok(outcome)
}

fn bot_seed(seed: u64) -> u64 {
    lenry_game::derive_stream_seed(seed, STREAM_BOTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooperative_tables_reach_a_winner() {
        for players in 5..=10 {
            let config = SimulationConfig::new(players, GameplayStrategy::Cooperative);
            let summary = simulate(&config, 11).unwrap();
            assert!(summary.game_ended(), "{:?}", summary.halted);
            assert!(summary.violations.is_empty(), "{:?}", summary.violations);
            assert_eq!(summary.rejections, 0);
        }
    }

    #[test]
    fn persisted_runs_store_every_transition() {
        let mut config = SimulationConfig::new(7, GameplayStrategy::Random);
        config.persist = true;
        let summary = simulate(&config, 5).unwrap();
        assert_eq!(summary.persisted, summary.transitions.len());
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
    }

    #[test]
    fn round_cap_is_reported() {
        let mut config = SimulationConfig::new(5, GameplayStrategy::Obstructive);
        config.max_rounds = 1;
        let summary = simulate(&config, 2).unwrap();
        assert_eq!(summary.rounds, 1);
        assert!(!summary.game_ended());
        assert!(summary.halted.is_some());
        assert!(!summary.deck_exhausted);
    }

    #[test]
    fn bad_table_sizes_fail_setup() {
        let config = SimulationConfig::new(4, GameplayStrategy::Random);
        assert!(simulate(&config, 1).is_err());
    }
}
