//! Lenry Game Engine
//!
//! Platform-agnostic core game logic for the Lenry hidden-role party game.
//! This crate provides role dealing, the policy deck, nominations, voting and
//! the legislative session without any transport, UI or backend dependencies.

pub mod config;
pub mod constants;
pub mod deck;
pub mod eligibility;
pub mod error;
pub mod game;
pub mod record;
pub mod roles;
pub mod round;
pub mod seed;
pub mod storage;

// Re-export commonly used types
pub use config::{RulesConfig, RulesConfigError};
pub use deck::{DeckComposition, Policy, PolicyDeck, create_deck, create_deck_with};
pub use eligibility::{eligible_main_squeeze_candidates, is_eligible};
pub use error::{EngineError, GameError};
pub use game::{Enacted, Game, Hand, Legislation, Victory, VictoryReason};
pub use record::{GameRecord, PersistedState};
pub use roles::{Role, RoleCounts, Team, assign_roles, role_counts};
pub use round::{Outcome, RoundPhase};
pub use seed::{GameRng, derive_stream_seed, stream_rng};
pub use storage::{GameStore, MemoryStore};

use rand::Rng;

/// Main game engine running load, apply, save cycles against a store.
pub struct GameEngine<S>
where
    S: GameStore,
{
    storage: S,
    rules: RulesConfig,
}

impl<S> GameEngine<S>
where
    S: GameStore,
{
    /// Create an engine playing the standard rules.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            rules: RulesConfig::default(),
        }
    }

    /// Create an engine playing custom rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules fail validation.
    pub fn with_rules(storage: S, rules: RulesConfig) -> Result<Self, RulesConfigError> {
        rules.validate()?;
        Ok(Self { storage, rules })
    }

    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Create and store a new game for `host_id`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the game cannot be created or saved.
    pub fn create_game<R: Rng + ?Sized>(
        &self,
        host_id: &str,
        players: Vec<String>,
        rng: &mut R,
    ) -> Result<Game, EngineError<S::Error>> {
        let game = Game::with_rules(host_id, players, self.rules.clone(), rng)?;
        self.save_game(&game)?;
        Ok(game)
    }

    /// Save a game.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be saved.
    pub fn save_game(&self, game: &Game) -> Result<(), EngineError<S::Error>> {
        self.storage
            .save_record(&game.to_record())
            .map_err(EngineError::Storage)
    }

    /// Load a game.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read or fails validation.
    pub fn load_game(&self, host_id: &str) -> Result<Option<Game>, EngineError<S::Error>> {
        let Some(record) = self
            .storage
            .load_record(host_id)
            .map_err(EngineError::Storage)?
        else {
            return Ok(None);
        };
        Ok(Some(Game::from_record(record, &self.rules)?))
    }

    /// Load the game, apply one action and store the result.
    ///
    /// A failing action is reported without writing anything back.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no game is stored, otherwise any load, action
    /// or save failure.
    pub fn apply<F>(&self, host_id: &str, action: F) -> Result<Game, EngineError<S::Error>>
    where
        F: FnOnce(&Game) -> Result<Game, GameError>,
    {
        let game = self
            .load_game(host_id)?
            .ok_or_else(|| EngineError::NotFound(host_id.to_string()))?;
        let next = action(&game)?;
        self.save_game(&next)?;
        Ok(next)
    }

    /// Delete a stored game.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be deleted.
    pub fn delete_game(&self, host_id: &str) -> Result<(), EngineError<S::Error>> {
        self.storage
            .delete_record(host_id)
            .map_err(EngineError::Storage)
    }
}
