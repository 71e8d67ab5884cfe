use std::sync::Arc;

use anyhow::Result;
use lenry_game::RulesConfig;

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{DEFAULT_MAX_ROUNDS, SimulationConfig, SimulationSummary};

/// How a scenario drives its bot games and what it expects of them.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_rounds: usize,
    pub persist: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_rounds: DEFAULT_MAX_ROUNDS,
            persist: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    #[must_use]
    pub const fn with_persistence(mut self) -> Self {
        self.persist = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }

    /// Concrete run settings for one table size.
    #[must_use]
    pub fn config(&self, player_count: usize, rules: &RulesConfig) -> SimulationConfig {
        SimulationConfig {
            player_count,
            strategy: self.strategy,
            rules: rules.clone(),
            max_rounds: self.max_rounds,
            persist: self.persist,
        }
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    /// # Errors
    ///
    /// Whatever the wrapped check reports.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}
