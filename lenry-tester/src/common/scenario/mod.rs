pub mod catalog;

use crate::logic::plan::SimulationPlan;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Look a scenario up by its CLI key or one of its aliases.
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = match name.to_lowercase().as_str() {
        "full-game" | "full-game-partisan" | "partisan" => "full-game",
        "full-game-random" | "random" => "full-game-random",
        "full-game-obstructive" | "obstructive" => "full-game-obstructive",
        "vote-scenarios" | "votes" => "vote-scenarios",
        "persistence-roundtrip" | "persistence" => "persistence-roundtrip",
        "determinism" | "deterministic" => "determinism",
        _ => return None,
    };
    catalog::catalog_scenario(key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog::CATALOG
        .iter()
        .map(|entry| (entry.key, entry.name))
        .collect()
}

/// Every scenario key, in catalog order.
pub fn all_scenario_keys() -> Vec<String> {
    catalog::CATALOG
        .iter()
        .map(|entry| entry.key.to_string())
        .collect()
}
