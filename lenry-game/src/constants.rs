//! Centralized table sizes and tuning constants for Lenry game logic.
//!
//! Everything here is fixed by the rules of the game. Thresholds that a host
//! may tweak live in [`crate::config::RulesConfig`] instead.

// Seating ------------------------------------------------------------------
/// Fewest players a game can be created with.
pub const MIN_PLAYERS: usize = 5;
/// Most players a game can be created with.
pub const MAX_PLAYERS: usize = 10;

// Policy deck ---------------------------------------------------------------
pub const LIBERAL_POLICY_COUNT: u8 = 11;
pub const FASCIST_POLICY_COUNT: u8 = 6;
/// Cards the governor draws after a successful election.
pub const HAND_SIZE: usize = 3;

// Win thresholds --------------------------------------------------------------
pub const LIBERAL_POLICIES_TO_WIN: u8 = 5;
pub const FASCIST_POLICIES_TO_WIN: u8 = 6;
/// Fascist-type enactments after which electing Lenry as main squeeze ends the game.
pub const LENRY_ELECTED_AFTER: u8 = 3;

// Persistence -----------------------------------------------------------------
/// Wire value for "nobody has been elected main squeeze yet".
pub const NO_MAIN_SQUEEZE: i32 = -1;

// RNG stream tags ---------------------------------------------------------------
pub(crate) const STREAM_ROLES: &[u8] = b"roles";
pub(crate) const STREAM_DECK: &[u8] = b"deck";
pub(crate) const STREAM_GOVERNOR: &[u8] = b"governor";
