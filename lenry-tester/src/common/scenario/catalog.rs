use anyhow::{Result, ensure};
use lenry_game::{Game, GameError, Outcome, RoundPhase, VictoryReason};

use crate::common::scenario::TestScenario;
use crate::logic::plan::SimulationPlan;
use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{SimulationSummary, simulate};

pub struct CatalogEntry {
    pub key: &'static str,
    pub name: &'static str,
    build: fn() -> SimulationPlan,
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        key: "full-game",
        name: "Full Game - Partisan Bots",
        build: || full_game_plan(GameplayStrategy::Partisan),
    },
    CatalogEntry {
        key: "full-game-random",
        name: "Full Game - Random Bots",
        build: || full_game_plan(GameplayStrategy::Random),
    },
    CatalogEntry {
        key: "full-game-obstructive",
        name: "Full Game - Obstructive Bots",
        build: || full_game_plan(GameplayStrategy::Obstructive),
    },
    CatalogEntry {
        key: "vote-scenarios",
        name: "Scripted Vote Outcomes",
        build: || {
            SimulationPlan::new(GameplayStrategy::Cooperative)
                .with_max_rounds(0)
                .with_expectation(scripted_vote_expectation)
        },
    },
    CatalogEntry {
        key: "persistence-roundtrip",
        name: "Persistence Round Trip",
        build: || {
            full_game_plan(GameplayStrategy::Random)
                .with_persistence()
                .with_expectation(persisted_every_transition_expectation)
        },
    },
    CatalogEntry {
        key: "determinism",
        name: "Deterministic Replay",
        build: || {
            SimulationPlan::new(GameplayStrategy::Random)
                .with_expectation(clean_run_expectation)
                .with_expectation(replay_expectation)
        },
    },
];

pub fn catalog_scenario(key: &str) -> Option<TestScenario> {
    CATALOG
        .iter()
        .find(|entry| entry.key == key)
        .map(|entry| TestScenario::simulation(entry.name, (entry.build)()))
}

fn full_game_plan(strategy: GameplayStrategy) -> SimulationPlan {
    SimulationPlan::new(strategy)
        .with_expectation(clean_run_expectation)
        .with_expectation(reaches_winner_expectation)
        .with_expectation(victory_consistency_expectation)
        .with_expectation(finished_game_is_frozen_expectation)
}

fn clean_run_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.violations.is_empty(),
        "invariant violations: {}",
        summary.violations.join("; ")
    );
    Ok(())
}

fn reaches_winner_expectation(summary: &SimulationSummary) -> Result<()> {
    if summary.deck_exhausted {
        ensure!(
            !summary.config.rules.reshuffle,
            "draw pile ran dry although reshuffling is enabled"
        );
        return Ok(());
    }
    ensure!(
        summary.game_ended(),
        "no winner: {}",
        summary.halted.as_deref().unwrap_or("unknown reason")
    );
    Ok(())
}

fn victory_consistency_expectation(summary: &SimulationSummary) -> Result<()> {
    let Some(victory) = summary.victory else {
        return Ok(());
    };
    let game = &summary.final_game;
    let rules = &summary.config.rules;
    let enacted = game.enacted();
    match victory.reason {
        VictoryReason::LiberalPolicies => ensure!(
            enacted.liberal >= rules.liberal_to_win,
            "liberal win with {} liberal policies",
            enacted.liberal
        ),
        VictoryReason::FascistPolicies => ensure!(
            enacted.fascist >= rules.fascist_to_win,
            "fascist win with {} fascist policies",
            enacted.fascist
        ),
        VictoryReason::LenryElected => {
            ensure!(
                game.main_squeeze().is_some() && game.main_squeeze() == game.lenry_seat(),
                "Lenry win without Lenry as main squeeze"
            );
            ensure!(
                enacted.fascist >= rules.lenry_elected_after,
                "Lenry win after only {} fascist policies",
                enacted.fascist
            );
        }
    }
    Ok(())
}

fn finished_game_is_frozen_expectation(summary: &SimulationSummary) -> Result<()> {
    if !summary.game_ended() {
        return Ok(());
    }
    let game = &summary.final_game;
    let candidate = (game.governor() + 1) % game.player_count();
    ensure!(
        matches!(game.nominate(candidate), Err(GameError::InvalidState { .. })),
        "finished game accepted a nomination"
    );
    ensure!(
        matches!(game.resolve(), Err(GameError::InvalidState { .. })),
        "finished game accepted a resolve"
    );
    Ok(())
}

fn persisted_every_transition_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.persisted > 0, "nothing was persisted");
    ensure!(
        summary.persisted == summary.transitions.len(),
        "persisted {} of {} transitions",
        summary.persisted,
        summary.transitions.len()
    );
    Ok(())
}

fn replay_expectation(summary: &SimulationSummary) -> Result<()> {
    let replay = simulate(&summary.config, summary.seed)?;
    ensure!(
        replay.initial.to_record() == summary.initial.to_record(),
        "same seed dealt a different table"
    );
    ensure!(
        replay.transitions.len() == summary.transitions.len(),
        "replay took {} transitions instead of {}",
        replay.transitions.len(),
        summary.transitions.len()
    );
    ensure!(
        replay.final_game.to_record() == summary.final_game.to_record(),
        "replay ended in a different state"
    );

    let mut stored = summary.config.clone();
    stored.persist = !stored.persist;
    let through_store = simulate(&stored, summary.seed)?;
    ensure!(
        through_store.final_game == summary.final_game,
        "routing play through storage changed the outcome"
    );
    Ok(())
}

/// Nominate `candidate` and let the first `approvals` seats approve.
fn ballot(table: &Game, candidate: usize, approvals: usize) -> Result<Game, GameError> {
    (0..table.player_count()).try_fold(table.nominate(candidate)?, |game, seat| {
        game.cast_vote(seat, seat < approvals)
    })
}

/// Elections from seat 0 with a fixed number of approvals, on the dealt table.
fn scripted_vote_expectation(summary: &SimulationSummary) -> Result<()> {
    let seats = summary.config.player_count;
    let mut record = summary.initial.to_record();
    record.state.governor = 0;
    let table = Game::from_record(record, &summary.config.rules)?;
    let majority = seats / 2 + 1;

    ensure!(
        matches!(table.nominate(0), Err(GameError::IneligibleCandidate { .. })),
        "governor nominated themselves"
    );

    let (elected, outcome) = ballot(&table, 1, majority)?.resolve()?;
    ensure!(
        outcome == Outcome::Elected,
        "{majority} of {seats} approvals did not elect"
    );
    ensure!(
        elected.governor() == 0 && elected.main_squeeze() == Some(1),
        "election moved the wrong seats: governor {} main squeeze {:?}",
        elected.governor(),
        elected.main_squeeze()
    );
    ensure!(
        elected.phase().outcome() == Some(Outcome::Elected),
        "elected round was not kept"
    );

    let (rejected, outcome) = ballot(&table, 1, majority - 1)?.resolve()?;
    ensure!(
        outcome == Outcome::Rejected,
        "{} of {seats} approvals elected",
        majority - 1
    );
    ensure!(
        rejected.governor() == 1 % seats && rejected.main_squeeze() == table.main_squeeze(),
        "rejection moved governor to {} and main squeeze to {:?}",
        rejected.governor(),
        rejected.main_squeeze()
    );
    ensure!(
        *rejected.phase() == RoundPhase::Nominating,
        "rejected round was not cleared"
    );

    let partial = (0..majority - 1).try_fold(table.nominate(1)?, |game, seat| {
        game.cast_vote(seat, true)
    })?;
    let (_, outcome) = partial.resolve()?;
    ensure!(
        outcome == Outcome::Rejected,
        "missing ballots counted as approvals"
    );

    let voted = table.nominate(1)?.cast_vote(0, true)?;
    ensure!(
        voted.cast_vote(0, false) == Err(GameError::DuplicateVote(0)),
        "a seat voted twice"
    );
    Ok(())
}
