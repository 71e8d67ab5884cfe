//! Which seats may be nominated as main squeeze.
//!
//! Kept as free functions over plain seat numbers so that term limits (last
//! main squeeze, recent governors) can be added here without touching the
//! voting round or the game aggregate.
use std::collections::BTreeSet;

/// Seats the governor may nominate: everybody except the governor.
#[must_use]
pub fn eligible_main_squeeze_candidates(player_count: usize, governor: usize) -> BTreeSet<usize> {
    (0..player_count).filter(|seat| *seat != governor).collect()
}

#[must_use]
pub fn is_eligible(player_count: usize, governor: usize, candidate: usize) -> bool {
    eligible_main_squeeze_candidates(player_count, governor).contains(&candidate)
}
