use anyhow::{Result, bail};
use lenry_game::constants::{MAX_PLAYERS, MIN_PLAYERS};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse table sizes, keeping the first occurrence of each.
pub fn parse_player_counts(tokens: &[String]) -> Result<Vec<usize>> {
    let mut counts = Vec::with_capacity(tokens.len());
    for token in tokens {
        let Ok(count) = token.parse::<usize>() else {
            bail!("Unrecognized player count: {token}");
        };
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            bail!("Player count {count} is outside {MIN_PLAYERS}..={MAX_PLAYERS}");
        }
        if !counts.contains(&count) {
            counts.push(count);
        }
    }
    if counts.is_empty() {
        bail!("No player counts given");
    }
    Ok(counts)
}
