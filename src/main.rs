use std::process::ExitCode;

use clap::Parser;

use currency_contract::suite::filter_cases;
use currency_contract::{currency_suite, init_tracing, run_suite, Harness, HarnessConfig, Outcome, SuiteReport};

#[derive(Parser, Debug)]
#[command(name = "currency_contract")]
#[command(about = "Runs the currency rates API contract suite", long_about = None)]
struct Opts {
	/// Overrides CURRENCY_API_BASE_URL.
	#[arg(long)]
	base: Option<String>,
	/// Overrides CURRENCY_API_KEY.
	#[arg(long)]
	api_key: Option<String>,
	/// Overrides CURRENCY_API_INVALID_KEY.
	#[arg(long)]
	invalid_api_key: Option<String>,
	/// Overrides CURRENCY_API_TIMEOUT_SECS.
	#[arg(long)]
	timeout_secs: Option<String>,
	/// Only run cases whose name contains this.
	#[arg(long)]
	only: Option<String>,
	/// Print the case list and exit without sending anything.
	#[arg(long)]
	list: bool,
	/// Print the report as JSON instead of a summary.
	#[arg(long)]
	json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	init_tracing();
	let opts = Opts::parse();
	let config = build_config(&opts)?;
	let cases = filter_cases(currency_suite(&config), opts.only.as_deref());

	if opts.list {
		println!("{}", serde_json::to_string_pretty(&cases)?);
		return Ok(ExitCode::SUCCESS);
	}
	anyhow::ensure!(!cases.is_empty(), "no case matches {:?}", opts.only.unwrap_or_default());

	let harness = Harness::new(config)?;
	let report = run_suite(&harness, &cases).await;
	if opts.json {
		println!("{}", serde_json::to_string_pretty(&report)?);
	} else {
		print_summary(&report);
	}
	Ok(if report.all_passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn build_config(opts: &Opts) -> anyhow::Result<HarnessConfig> {
	Ok(HarnessConfig::from_env_with(|key| cli_override(opts, key))?)
}

/// Command line values, keyed like the environment variables they replace.
fn cli_override(opts: &Opts, key: &str) -> Option<String> {
	match key {
		"CURRENCY_API_BASE_URL" => opts.base.clone(),
		"CURRENCY_API_KEY" => opts.api_key.clone(),
		"CURRENCY_API_INVALID_KEY" => opts.invalid_api_key.clone(),
		"CURRENCY_API_TIMEOUT_SECS" => opts.timeout_secs.clone(),
		_ => None,
	}
}

fn print_summary(report: &SuiteReport) {
	println!("run {}", report.run_id);
	for (i, case) in report.cases.iter().enumerate() {
		let status = case.status.map(|s| s.to_string()).unwrap_or_else(|| "---".into());
		let tag = match &case.outcome {
			Outcome::Passed => "ok",
			Outcome::Failed(_) => "FAIL",
			Outcome::MalformedBody { .. } | Outcome::NotExecuted(_) => "ERROR",
		};
		println!("[{}/{}] {:<5} {} ({} ms, status {})", i + 1, report.total, tag, case.name, case.elapsed_ms, status);
		match &case.outcome {
			Outcome::Passed => {}
			Outcome::Failed(failures) => {
				for f in failures {
					println!("        - {}", f);
				}
			}
			Outcome::MalformedBody { reason, failures } => {
				println!("        unreadable body: {}", reason);
				for f in failures {
					println!("        - {}", f);
				}
			}
			Outcome::NotExecuted(reason) => println!("        could not execute request: {}", reason),
		}
	}
	println!(
		"{} passed, {} failed, {} malformed, {} not executed, {} total",
		report.passed, report.failed, report.malformed, report.not_executed, report.total
	);
}

#[cfg(test)]
mod tests {
	use super::*;
	use currency_contract::config::layered;

	#[test]
	fn flags_map_to_config_keys() {
		let opts = Opts::parse_from(["currency_contract", "--base", "http://127.0.0.1:9000", "--api-key", "k1", "--timeout-secs", "4"]);
		assert_eq!(cli_override(&opts, "CURRENCY_API_BASE_URL").as_deref(), Some("http://127.0.0.1:9000"));
		assert_eq!(cli_override(&opts, "CURRENCY_API_KEY").as_deref(), Some("k1"));
		assert_eq!(cli_override(&opts, "CURRENCY_API_INVALID_KEY"), None);
		assert_eq!(cli_override(&opts, "RUST_LOG"), None);

		let env = |key: &str| match key {
			"CURRENCY_API_KEY" => Some("env-key".to_string()),
			"CURRENCY_API_INVALID_KEY" => Some("env-bad".to_string()),
			_ => None,
		};
		let config = HarnessConfig::from_lookup(layered(|key: &str| cli_override(&opts, key), env)).unwrap();
		assert_eq!(config.base_url, "http://127.0.0.1:9000");
		assert_eq!(config.api_key, "k1");
		assert_eq!(config.invalid_api_key, "env-bad");
		assert_eq!(config.timeout, std::time::Duration::from_secs(4));
	}
}
