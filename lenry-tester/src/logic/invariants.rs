use lenry_game::{Game, Role, role_counts};

/// Properties every reachable game state holds.
#[must_use]
pub fn check_game(game: &Game) -> Vec<String> {
    let mut violations = Vec::new();

    let expected_cards = usize::from(game.rules().composition().total());
    if game.card_total() != expected_cards {
        violations.push(format!(
            "card total {} != {expected_cards}",
            game.card_total()
        ));
    }

    let lenries = game.roles().iter().filter(|r| **r == Role::Lenry).count();
    if lenries != 1 {
        violations.push(format!("{lenries} Lenry roles dealt"));
    }
    match role_counts(game.player_count()) {
        Some(counts) if counts.matches(game.roles()) => {}
        Some(_) => violations.push("role mix does not match the table size".to_string()),
        None => violations.push(format!("unsupported table of {}", game.player_count())),
    }

    let eligible = game.eligible_candidates();
    if eligible.contains(&game.governor()) {
        violations.push(format!("governor {} is eligible", game.governor()));
    }
    if eligible.len() + 1 != game.player_count() {
        violations.push(format!(
            "{} eligible seats at a table of {}",
            eligible.len(),
            game.player_count()
        ));
    }
    if game.governor() >= game.player_count() {
        violations.push(format!("governor seat {} is off the table", game.governor()));
    }
    violations
}

/// Properties linking a state to the one it was derived from.
#[must_use]
pub fn check_transition(previous: &Game, next: &Game) -> Vec<String> {
    let mut violations = check_game(next);

    let (before, after) = (previous.enacted(), next.enacted());
    if after.liberal < before.liberal || after.fascist < before.fascist {
        violations.push(format!("enacted counters went backwards: {before:?} -> {after:?}"));
    }
    if after.total() > before.total() + 1 {
        violations.push(format!("more than one enactment: {before:?} -> {after:?}"));
    }
    if next.roles() != previous.roles() {
        violations.push("roles changed mid-game".to_string());
    }
    if next.players() != previous.players() {
        violations.push("seating changed mid-game".to_string());
    }
    violations
}
