use anyhow::{Result, bail};

/// Seed used when none is given on the command line.
pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed arguments into a deduplicated list of numeric seeds.
///
/// Negative numbers are accepted and folded onto their magnitude.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(hex, 16)
        {
            value
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_decimal_negative_and_hex() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xff"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 255]);
    }

    #[test]
    fn duplicates_collapse_and_empty_falls_back() {
        assert_eq!(resolve_seed_inputs(&tokens(&["9", "9"])).unwrap(), vec![9]);
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn words_are_rejected() {
        assert!(resolve_seed_inputs(&tokens(&["CL-ORANGE42"])).is_err());
    }
}
