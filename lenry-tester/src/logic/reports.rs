use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;

fn success_rate(results: &[ScenarioResult]) -> f64 {
    let passed = results.iter().filter(|r| r.passed).count();
    #[allow(clippy::cast_precision_loss)]
    let rate = (passed as f64 / results.len().max(1) as f64) * 100.0;
    rate
}

fn victory_totals(results: &[ScenarioResult]) -> BTreeMap<&str, usize> {
    let mut totals = BTreeMap::new();
    for result in results {
        for (label, count) in &result.victories {
            *totals.entry(label.as_str()).or_default() += count;
        }
    }
    totals
}

fn result_heading(result: &ScenarioResult) -> String {
    format!(
        "{} [{} players, seed {}]",
        result.scenario_name, result.player_count, result.seed
    )
}

pub fn generate_console_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(out, "{} {}", status, result_heading(result).bold())?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.as_str().red())?;
            }
        }
        writeln!(out)?;
    }

    let totals = victory_totals(results);
    if !totals.is_empty() {
        writeln!(out, "{}", "🏆 Outcomes".bright_magenta().bold())?;
        writeln!(out, "{}", "===========".magenta())?;
        for (label, count) in totals {
            writeln!(out, "{label}: {count}")?;
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            result_heading(fastest).green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            result_heading(slowest).yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Lenry Logic Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    let totals = victory_totals(results);
    if !totals.is_empty() {
        writeln!(out, "## Outcomes\n")?;
        writeln!(out, "| Winner | Games |")?;
        writeln!(out, "|---|---|")?;
        for (label, count) in totals {
            writeln!(out, "| {label} | {count} |")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(out, "### {} {}\n", status, result_heading(result))?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(passed: bool) -> ScenarioResult {
        let mut victories = BTreeMap::new();
        victories.insert("janitors (liberal policies)".to_string(), 2);
        ScenarioResult {
            scenario_name: "Full Game - Partisan Bots".to_string(),
            seed: 1337,
            player_count: 5,
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 2: no winner".to_string()]
            },
            victories,
            average_duration: Duration::from_millis(3),
            performance_data: vec![Duration::from_millis(3)],
        }
    }

    #[test]
    fn markdown_lists_outcomes_and_failures() {
        let mut out = Vec::new();
        generate_markdown_report(&mut out, &[sample(true), sample(false)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("# Lenry Logic Test Results"));
        assert!(text.contains("| janitors (liberal policies) | 4 |"));
        assert!(text.contains("- **Success rate**: 50.0%"));
        assert!(text.contains("Iteration 2: no winner"));
    }

    #[test]
    fn json_report_is_an_array() {
        let mut out = Vec::new();
        generate_json_report(&mut out, &[sample(true)]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["player_count"], 5);
    }

    #[test]
    fn console_report_mentions_every_result() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        generate_console_report(&mut out, &[sample(true), sample(false)], Duration::ZERO).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total scenarios: 2"));
        assert!(text.contains("[5 players, seed 1337]"));
        assert!(text.contains("Fastest:"));
    }
}
