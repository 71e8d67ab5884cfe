use lenry_game::{
    Game, GameError, Legislation, Outcome, Policy, Role, RoundPhase, RulesConfig, Team,
    VictoryReason, role_counts,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn seat_ids(count: usize) -> Vec<String> {
    (0..count).map(|idx| format!("player-{idx}")).collect()
}

fn assert_invariants(game: &Game, previous: Option<&Game>) {
    assert_eq!(game.card_total(), 17, "cards leaked: {game:?}");
    assert!(
        role_counts(game.player_count())
            .unwrap()
            .matches(game.roles())
    );
    assert!(!game.eligible_candidates().contains(&game.governor()));
    if let Some(previous) = previous {
        assert!(game.enacted().liberal >= previous.enacted().liberal);
        assert!(game.enacted().fascist >= previous.enacted().fascist);
        assert_eq!(game.roles(), previous.roles());
        assert_eq!(game.players(), previous.players());
    }
}

/// Everybody approves, the governor keeps the first two cards and the main
/// squeeze enacts whatever is left. Runs until a side wins.
fn play_to_completion(player_count: usize, seed: u64) -> (Game, usize) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut game = Game::new_seeded("host", seat_ids(player_count), RulesConfig::default(), seed)
        .expect("valid table");
    assert_invariants(&game, None);

    let mut rounds = 0;
    while !game.is_over() {
        rounds += 1;
        assert!(rounds <= 20, "game did not finish: {game:?}");

        let eligible: Vec<usize> = game.eligible_candidates().into_iter().collect();
        let candidate = eligible[rng.gen_range(0..eligible.len())];
        let mut next = game.nominate(candidate).unwrap();
        for seat in 0..player_count {
            next = next.cast_vote(seat, true).unwrap();
        }
        let (next, outcome) = next.resolve().unwrap();
        assert_eq!(outcome, Outcome::Elected);
        assert_invariants(&next, Some(&game));
        if next.is_over() {
            game = next;
            break;
        }

        let drawn = next.draw_policies(&mut rng).unwrap();
        assert!(matches!(drawn.legislation(), Legislation::Governor(hand) if hand.len() == 3));
        assert_invariants(&drawn, Some(&next));

        let passed = drawn.choose_discard(rng.gen_range(0..3)).unwrap();
        assert_invariants(&passed, Some(&drawn));
        let enacted = passed.choose_discard(rng.gen_range(0..2)).unwrap();
        assert_invariants(&enacted, Some(&passed));
        assert_eq!(enacted.enacted().total(), game.enacted().total() + 1);
        game = enacted;
    }
    (game, rounds)
}

#[test]
fn full_games_finish_with_consistent_state() {
    for player_count in 5..=10 {
        for seed in 0..40 {
            let (game, rounds) = play_to_completion(player_count, seed);
            let victory = game.winner().expect("game over");
            assert!(rounds >= 1);
            match victory.reason {
                VictoryReason::LiberalPolicies => {
                    assert_eq!(victory.team, Team::Janitors);
                    assert_eq!(game.enacted().liberal, 5);
                }
                VictoryReason::FascistPolicies => {
                    assert_eq!(victory.team, Team::Henries);
                    assert_eq!(game.enacted().fascist, 6);
                }
                VictoryReason::LenryElected => {
                    assert_eq!(victory.team, Team::Henries);
                    assert_eq!(game.main_squeeze(), game.lenry_seat());
                    assert!(game.enacted().fascist >= 3);
                }
            }
        }
    }
}

#[test]
fn finished_games_refuse_further_actions() {
    let (game, _) = play_to_completion(6, 99);
    let mut rng = ChaCha20Rng::seed_from_u64(0);
    let err = GameError::InvalidState {
        operation: "nominate",
        phase: "after the game ended",
    };
    let candidate = *game.eligible_candidates().iter().next().unwrap();
    assert_eq!(game.nominate(candidate), Err(err));
    assert!(game.draw_policies(&mut rng).is_err());
}

#[test]
fn rejections_rotate_the_governor_around_the_table() {
    let mut game = Game::new_seeded("host", seat_ids(7), RulesConfig::default(), 5).unwrap();
    let start = game.governor();
    for step in 1..=7 {
        let candidate = (game.governor() + 1) % 7;
        let voting = game.nominate(candidate).unwrap();
        let (next, outcome) = voting.resolve().unwrap();
        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(next.governor(), (start + step) % 7);
        assert_eq!(next.main_squeeze(), None);
        assert_eq!(next.phase(), &RoundPhase::Nominating);
        game = next;
    }
    assert_eq!(game.governor(), start);
    assert_eq!(game.card_total(), 17);
}

#[test]
fn disabled_reshuffle_eventually_runs_dry() {
    let rules = RulesConfig {
        reshuffle: false,
        ..RulesConfig::default()
    };
    let mut rng = ChaCha20Rng::seed_from_u64(12);
    let mut game = Game::new_seeded("host", seat_ids(5), rules, 12).unwrap();
    // Never elect Lenry so only the deck decides when this ends.
    let lenry = game.lenry_seat().unwrap();
    loop {
        let candidate = game
            .eligible_candidates()
            .into_iter()
            .find(|seat| *seat != lenry)
            .unwrap();
        let mut next = game.nominate(candidate).unwrap();
        for seat in 0..5 {
            next = next.cast_vote(seat, true).unwrap();
        }
        let (next, _) = next.resolve().unwrap();
        match next.draw_policies(&mut rng) {
            Ok(drawn) => {
                let enacted = drawn.choose_discard(0).unwrap().choose_discard(0).unwrap();
                if enacted.is_over() {
                    // Five liberal enactments can win before the sixth draw.
                    assert_eq!(enacted.enacted().liberal, 5);
                    return;
                }
                game = enacted;
            }
            Err(err) => {
                assert_eq!(
                    err,
                    GameError::InsufficientCards {
                        requested: 3,
                        available: next.draw_pile().len(),
                    }
                );
                assert!(next.draw_pile().len() < 3);
                assert_eq!(next.card_total(), 17);
                return;
            }
        }
    }
}

#[test]
fn every_table_deals_one_lenry() {
    for player_count in 5..=10 {
        for seed in 0..20 {
            let game =
                Game::new_seeded("host", seat_ids(player_count), RulesConfig::default(), seed)
                    .unwrap();
            let lenries = game.roles().iter().filter(|r| **r == Role::Lenry).count();
            assert_eq!(lenries, 1);
            assert_eq!(
                game.draw_pile()
                    .iter()
                    .filter(|p| **p == Policy::Fascist)
                    .count(),
                6
            );
        }
    }
}
