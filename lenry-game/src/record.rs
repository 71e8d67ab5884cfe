//! Persisted game record and its validating conversion to and from [`Game`].
//!
//! The wire shape matches what the hosted backend stores per game: an ordered
//! player id list next to a flat state object whose `roles` are zipped with
//! the ids by position.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::RulesConfig;
use crate::constants::{HAND_SIZE, NO_MAIN_SQUEEZE};
use crate::deck::{Policy, PolicyDeck};
use crate::error::GameError;
use crate::game::{Enacted, Game, Legislation};
use crate::roles::{Role, role_counts};
use crate::round::{Outcome, RoundPhase, is_majority};

/// Flat game state as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Remaining draw pile, top first.
    pub deck: Vec<Policy>,
    pub discard: Vec<Policy>,
    pub hen_pol: u8,
    pub len_pol: u8,
    /// Parallel to the record's player ids.
    pub roles: Vec<Role>,
    pub governor: usize,
    /// `-1` until somebody is elected.
    pub main_sq: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<Option<bool>>>,
    /// Present once the open round has elected its candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    /// Policies held by the governor (three) or main squeeze (two).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Policy>>,
}

/// One stored game, keyed by its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub host_id: String,
    pub player_ids: Vec<String>,
    pub state: PersistedState,
}

impl GameRecord {
    /// Parse a stored record.
    ///
    /// # Errors
    ///
    /// `CorruptPersistedState` when the JSON does not describe a record.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        serde_json::from_str(json).map_err(|err| GameError::corrupt(err.to_string()))
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&Game> for GameRecord {
    fn from(game: &Game) -> Self {
        let hand = game.hand();
        Self {
            host_id: game.host_id.clone(),
            player_ids: game.players.clone(),
            state: PersistedState {
                deck: game.deck.draw_pile().to_vec(),
                discard: game.deck.discard_pile().to_vec(),
                hen_pol: game.enacted.fascist,
                len_pol: game.enacted.liberal,
                roles: game.roles.clone(),
                governor: game.governor,
                main_sq: game.main_squeeze.map_or(NO_MAIN_SQUEEZE, seat_to_wire),
                candidate: game.round.candidate().map(seat_to_wire),
                votes: game.round.votes().map(<[Option<bool>]>::to_vec),
                outcome: game.round.outcome(),
                hand: (!hand.is_empty()).then(|| hand.to_vec()),
            },
        }
    }
}

impl Game {
    /// Snapshot this game for storage.
    #[must_use]
    pub fn to_record(&self) -> GameRecord {
        GameRecord::from(self)
    }

    /// Rebuild a game from storage, rejecting any record that breaks the
    /// game's invariants.
    ///
    /// # Errors
    ///
    /// `CorruptPersistedState` naming the first broken invariant.
    pub fn from_record(record: GameRecord, rules: &RulesConfig) -> Result<Self, GameError> {
        let host_id = record.host_id.clone();
        rebuild(record, rules).inspect_err(|err| {
            log::warn!("rejected stored game {host_id}: {err}");
        })
    }
}

fn rebuild(record: GameRecord, rules: &RulesConfig) -> Result<Game, GameError> {
    let GameRecord {
        host_id,
        player_ids,
        state,
    } = record;
    let seats = player_ids.len();

    let counts = role_counts(seats)
        .ok_or_else(|| GameError::corrupt(format!("unsupported table of {seats} players")))?;
    let mut seen = HashSet::with_capacity(seats);
    if let Some(dup) = player_ids.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(GameError::corrupt(format!("player {dup:?} seated twice")));
    }
    if state.roles.len() != seats {
        return Err(GameError::corrupt(format!(
            "{} roles for {seats} seats",
            state.roles.len()
        )));
    }
    if !counts.matches(&state.roles) {
        return Err(GameError::corrupt(format!(
            "role distribution {:?} does not fit {seats} players",
            state.roles
        )));
    }

    if state.governor >= seats {
        return Err(GameError::corrupt(format!(
            "governor seat {} outside {seats} seats",
            state.governor
        )));
    }
    let main_squeeze = seat_from_wire("main_sq", state.main_sq, seats)?;

    let round = rebuild_round(&state, seats, main_squeeze)?;
    let legislation = rebuild_legislation(state.hand.as_deref(), &round)?;

    let enacted = Enacted {
        liberal: state.len_pol,
        fascist: state.hen_pol,
    };
    check_card_counts(&state, legislation.cards(), enacted, rules)?;

    Ok(Game {
        host_id,
        players: player_ids,
        roles: state.roles,
        deck: PolicyDeck::from_piles(state.deck, state.discard),
        enacted,
        governor: state.governor,
        main_squeeze,
        round,
        legislation,
        rules: rules.clone(),
    })
}

fn rebuild_round(
    state: &PersistedState,
    seats: usize,
    main_squeeze: Option<usize>,
) -> Result<RoundPhase, GameError> {
    let candidate = match state.candidate {
        None => None,
        Some(raw) => seat_from_wire("candidate", raw, seats)?,
    };
    let Some(candidate) = candidate else {
        if state.votes.is_some() {
            return Err(GameError::corrupt("votes recorded without a candidate"));
        }
        if state.outcome.is_some() {
            return Err(GameError::corrupt("round outcome recorded without a candidate"));
        }
        return Ok(RoundPhase::Nominating);
    };

    if candidate == state.governor {
        return Err(GameError::corrupt(format!(
            "governor seat {candidate} nominated itself"
        )));
    }
    let votes = match &state.votes {
        None => vec![None; seats],
        Some(votes) if votes.len() == seats => votes.clone(),
        Some(votes) => {
            return Err(GameError::corrupt(format!(
                "{} ballots for {seats} seats",
                votes.len()
            )));
        }
    };
    match state.outcome {
        None => Ok(RoundPhase::Voting { candidate, votes }),
        Some(Outcome::Elected) if !is_majority(approvals(&votes), seats) => {
            Err(GameError::corrupt(format!(
                "candidate {candidate} elected with {} of {seats} approvals",
                approvals(&votes)
            )))
        }
        Some(Outcome::Elected) if main_squeeze == Some(candidate) => Ok(RoundPhase::Resolved {
            candidate,
            votes,
            outcome: Outcome::Elected,
        }),
        Some(Outcome::Elected) => Err(GameError::corrupt(format!(
            "candidate {candidate} elected but main squeeze is {}",
            state.main_sq
        ))),
        Some(Outcome::Rejected) => Err(GameError::corrupt("rejected rounds are never stored")),
    }
}

fn approvals(votes: &[Option<bool>]) -> usize {
    votes.iter().filter(|v| **v == Some(true)).count()
}

fn rebuild_legislation(
    hand: Option<&[Policy]>,
    round: &RoundPhase,
) -> Result<Legislation, GameError> {
    let Some(hand) = hand else {
        return Ok(Legislation::Idle);
    };
    if round.outcome() != Some(Outcome::Elected) {
        return Err(GameError::corrupt("policies in hand without an elected round"));
    }
    match hand.len() {
        HAND_SIZE => Ok(Legislation::Governor(hand.iter().copied().collect())),
        len if len == HAND_SIZE - 1 => Ok(Legislation::MainSqueeze(hand.iter().copied().collect())),
        len => Err(GameError::corrupt(format!("hand of {len} policies"))),
    }
}

fn check_card_counts(
    state: &PersistedState,
    hand: &[Policy],
    enacted: Enacted,
    rules: &RulesConfig,
) -> Result<(), GameError> {
    let in_play = |policy: Policy| {
        state
            .deck
            .iter()
            .chain(&state.discard)
            .chain(hand)
            .filter(|card| **card == policy)
            .count()
    };
    let liberal = in_play(Policy::Liberal) + usize::from(enacted.liberal);
    let fascist = in_play(Policy::Fascist) + usize::from(enacted.fascist);
    let composition = rules.composition();
    if liberal != usize::from(composition.liberal) || fascist != usize::from(composition.fascist) {
        return Err(GameError::corrupt(format!(
            "deck accounts for {liberal} liberal and {fascist} fascist policies, expected {} and {}",
            composition.liberal, composition.fascist
        )));
    }
    Ok(())
}

fn seat_to_wire(seat: usize) -> i32 {
    i32::try_from(seat).unwrap_or(i32::MAX)
}

fn seat_from_wire(field: &str, raw: i32, seats: usize) -> Result<Option<usize>, GameError> {
    if raw == NO_MAIN_SQUEEZE {
        return Ok(None);
    }
    match usize::try_from(raw) {
        Ok(seat) if seat < seats => Ok(Some(seat)),
        _ => Err(GameError::corrupt(format!(
            "{field} {raw} outside {seats} seats"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn players() -> Vec<String> {
        ["a", "b", "c", "d", "e"].map(String::from).to_vec()
    }

    fn fresh() -> Game {
        Game::new("host", players(), &mut ChaCha20Rng::seed_from_u64(8)).unwrap()
    }

    fn reload(game: &Game) -> Result<Game, GameError> {
        let json = game.to_record().to_json().unwrap();
        Game::from_record(GameRecord::from_json(&json)?, &RulesConfig::default())
    }

    fn base_json() -> serde_json::Value {
        serde_json::to_value(fresh().to_record()).unwrap()
    }

    fn load_value(value: serde_json::Value) -> Result<Game, GameError> {
        let record: GameRecord = serde_json::from_value(value).unwrap();
        Game::from_record(record, &RulesConfig::default())
    }

    #[test]
    fn fresh_game_roundtrips_field_for_field() {
        let game = fresh();
        assert_eq!(reload(&game).unwrap(), game);
        let json = serde_json::to_value(game.to_record()).unwrap();
        assert_eq!(json["state"]["main_sq"], -1);
        assert!(json["state"].get("candidate").is_none());
        assert!(json["state"].get("votes").is_none());
    }

    #[test]
    fn mid_round_and_mid_session_games_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let game = fresh();
        let candidate = *game.eligible_candidates().iter().next().unwrap();
        let voting = game.nominate(candidate).unwrap().cast_vote(1, true).unwrap();
        assert_eq!(reload(&voting).unwrap(), voting);

        let mut elected = voting;
        for seat in 0..5 {
            if seat != 1 {
                elected = elected.cast_vote(seat, true).unwrap();
            }
        }
        let (elected, _) = elected.resolve().unwrap();
        assert_eq!(reload(&elected).unwrap(), elected);

        let drawn = elected.draw_policies(&mut rng).unwrap();
        assert_eq!(reload(&drawn).unwrap(), drawn);
        let passed = drawn.choose_discard(0).unwrap();
        assert_eq!(reload(&passed).unwrap(), passed);
        let enacted = passed.choose_discard(0).unwrap();
        assert_eq!(reload(&enacted).unwrap(), enacted);
    }

    #[test]
    fn votes_without_candidate_are_corrupt() {
        let mut value = base_json();
        value["state"]["votes"] = serde_json::json!([true]);
        assert!(matches!(
            load_value(value),
            Err(GameError::CorruptPersistedState(reason)) if reason.contains("without a candidate")
        ));

        let mut value = base_json();
        value["state"]["candidate"] = serde_json::json!(-1);
        value["state"]["votes"] = serde_json::json!([true, null, null, null, null]);
        assert!(matches!(
            load_value(value),
            Err(GameError::CorruptPersistedState(_))
        ));
    }

    #[test]
    fn role_and_seat_mismatches_are_corrupt() {
        let mut value = base_json();
        value["state"]["roles"] = serde_json::json!(["j", "j", "h", "l"]);
        assert!(matches!(
            load_value(value),
            Err(GameError::CorruptPersistedState(_))
        ));

        let mut value = base_json();
        value["state"]["roles"] = serde_json::json!(["j", "j", "j", "l", "l"]);
        assert!(matches!(
            load_value(value),
            Err(GameError::CorruptPersistedState(_))
        ));
    }

    #[test]
    fn deck_count_mismatch_is_corrupt() {
        let mut value = base_json();
        value["state"]["len_pol"] = serde_json::json!(1);
        assert!(matches!(
            load_value(value),
            Err(GameError::CorruptPersistedState(reason)) if reason.contains("deck accounts")
        ));
    }

    #[test]
    fn out_of_range_seats_are_corrupt() {
        for (field, raw) in [("governor", 5), ("main_sq", 7), ("main_sq", -2), ("candidate", 9)] {
            let mut value = base_json();
            value["state"][field] = serde_json::json!(raw);
            let result = if field == "governor" {
                // usize field: rejected either by serde or by the range check.
                serde_json::from_value::<GameRecord>(value)
                    .map_err(|err| GameError::corrupt(err.to_string()))
                    .and_then(|record| Game::from_record(record, &RulesConfig::default()))
            } else {
                load_value(value)
            };
            assert!(
                matches!(result, Err(GameError::CorruptPersistedState(_))),
                "{field} = {raw}"
            );
        }
    }

    #[test]
    fn elected_round_needs_a_stored_majority() {
        let game = fresh();
        let candidate = *game.eligible_candidates().iter().next().unwrap();
        let mut value = base_json();
        value["state"]["candidate"] = serde_json::json!(candidate);
        value["state"]["main_sq"] = serde_json::json!(candidate);
        value["state"]["outcome"] = serde_json::json!("elected");

        value["state"]["votes"] = serde_json::json!([false, false, false, false, false]);
        assert!(matches!(
            load_value(value.clone()),
            Err(GameError::CorruptPersistedState(reason)) if reason.contains("0 of 5 approvals")
        ));

        value["state"]["votes"] = serde_json::json!([true, true, null, false, null]);
        assert!(matches!(
            load_value(value.clone()),
            Err(GameError::CorruptPersistedState(_))
        ));

        value["state"]["votes"] = serde_json::json!([true, true, true, false, null]);
        let loaded = load_value(value).unwrap();
        assert_eq!(loaded.main_squeeze(), Some(candidate));
        assert_eq!(loaded.phase().outcome(), Some(Outcome::Elected));
    }

    #[test]
    fn hand_requires_an_elected_round() {
        let mut value = base_json();
        value["state"]["hand"] = serde_json::json!(["l", "h", "l"]);
        assert!(matches!(
            load_value(value),
            Err(GameError::CorruptPersistedState(_))
        ));
    }

    #[test]
    fn malformed_json_is_corrupt() {
        assert!(matches!(
            GameRecord::from_json("{\"host_id\": 3}"),
            Err(GameError::CorruptPersistedState(_))
        ));
    }
}
