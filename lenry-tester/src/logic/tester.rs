use colored::Colorize;
use lenry_game::{RulesConfig, Victory, VictoryReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::plan::SimulationPlan;
use crate::logic::simulation::{SimulationSummary, simulate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub player_count: usize,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Finished games per winning side and reason.
    pub victories: BTreeMap<String, usize>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
    rules: RulesConfig,
}

impl LogicTester {
    pub const fn new(rules: RulesConfig, verbose: bool) -> Self {
        Self { verbose, rules }
    }

    /// Run `scenario` once per seed and table size.
    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        player_counts: &[usize],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            for &player_count in player_counts {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (players: {} strategy: {} seed: {})",
                        scenario.name.bright_white(),
                        player_count,
                        scenario.plan.strategy,
                        seed
                    );
                }
                results.push(self.run_single_scenario(scenario, seed, player_count, iterations));
            }
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        player_count: usize,
        iterations: usize,
    ) -> ScenarioResult {
        let outcome = self.run_simulation_iterations(&scenario.plan, seed, player_count, iterations);

        let average_duration = if outcome.performance_data.is_empty() {
            Duration::ZERO
        } else {
            outcome.performance_data.iter().sum::<Duration>()
                / u32::try_from(outcome.performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            player_count,
            passed: outcome.failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: outcome.successes,
            failures: outcome.failures,
            victories: outcome.victories,
            average_duration,
            performance_data: outcome.performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        player_count: usize,
        iterations: usize,
    ) -> IterationOutcome {
        let config = plan.config(player_count, &self.rules);
        let mut outcome = IterationOutcome::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match simulate(&config, iteration_seed) {
                Ok(summary) => summary,
                Err(err) => {
                    outcome.failures.push(format!(
                        "Iteration {} (players {player_count}, seed {iteration_seed}): setup failed: {err:#}",
                        i + 1
                    ));
                    continue;
                }
            };

            if let Some(victory) = summary.victory {
                *outcome.victories.entry(victory_label(victory)).or_default() += 1;
            }

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let status = summary.halted.as_deref().unwrap_or("finished");
                outcome.failures.push(format!(
                    "Iteration {} (players {}, strategy {}, seed {}, rounds {}, status '{}'): {} | {}",
                    i + 1,
                    player_count,
                    plan.strategy,
                    summary.seed,
                    summary.rounds,
                    status,
                    err,
                    summary.recent_transitions(3)
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.as_str().red()
                    );
                    println!(
                        "     ↳ Seed {} | Rounds {} | Elections {} | Rejections {} | Enacted {:?}",
                        summary.seed,
                        summary.rounds,
                        summary.elections,
                        summary.rejections,
                        summary.final_game.enacted()
                    );
                }
            } else {
                outcome.successes += 1;
                let duration = start_time.elapsed();
                outcome.performance_data.push(duration);

                if self.verbose {
                    let ending = summary
                        .victory
                        .map_or_else(|| "no winner".to_string(), victory_label);
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) rounds:{} ending:{}",
                        i + 1,
                        iterations,
                        summary.rounds,
                        ending
                    );
                }
            }
        }

        outcome
    }
}

#[derive(Debug, Default)]
struct IterationOutcome {
    successes: usize,
    failures: Vec<String>,
    victories: BTreeMap<String, usize>,
    performance_data: Vec<Duration>,
}

#[must_use]
pub fn victory_label(victory: Victory) -> String {
    let reason = match victory.reason {
        VictoryReason::LiberalPolicies => "liberal policies",
        VictoryReason::FascistPolicies => "fascist policies",
        VictoryReason::LenryElected => "lenry elected",
    };
    format!("{} ({reason})", victory.team)
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(format!("{err:#}"));
        }
    }
    None
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let micros: Vec<u128> = durations.iter().map(Duration::as_micros).collect();
        micros.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = Vec::<u128>::deserialize(deserializer)?;
        Ok(micros
            .into_iter()
            .map(|m| Duration::from_micros(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::scenario::get_scenario;
    use lenry_game::Team;

    #[test]
    fn full_game_scenario_passes_on_every_table() {
        let tester = LogicTester::new(RulesConfig::default(), false);
        let scenario = get_scenario("full-game").unwrap();
        let results = tester.run_scenario(&scenario, &[1337], &[5, 8, 10], 3);
        assert_eq!(results.len(), 3);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.successful_iterations, 3);
            assert_eq!(result.victories.values().sum::<usize>(), 3);
        }
    }

    #[test]
    fn setup_failures_are_reported_per_iteration() {
        let tester = LogicTester::new(RulesConfig::default(), false);
        let scenario = get_scenario("full-game").unwrap();
        let results = tester.run_scenario(&scenario, &[1], &[4], 2);
        assert!(!results[0].passed);
        assert_eq!(results[0].failures.len(), 2);
        assert!(results[0].failures[0].contains("setup failed"));
    }

    #[test]
    fn victory_labels_name_team_and_reason() {
        let label = victory_label(Victory {
            team: Team::Henries,
            reason: VictoryReason::LenryElected,
        });
        assert_eq!(label, "henries (lenry elected)");
    }

    #[test]
    fn results_serialize_durations_as_integers() {
        let result = ScenarioResult {
            scenario_name: "x".to_string(),
            seed: 1,
            player_count: 5,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            victories: BTreeMap::new(),
            average_duration: Duration::from_micros(1500),
            performance_data: vec![Duration::from_micros(1500)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 1500);
        assert_eq!(json["performance_data"][0], 1500);
    }
}
