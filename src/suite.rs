//! The currency rates API contract, written down as data.

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::HarnessConfig;
use crate::harness::{CaseReport, Harness, Outcome, TestCase};
use crate::matcher::Matcher;
use crate::models::{
	quote_keys, BASE_CURRENCY, ERR_INVALID_CURRENCIES, ERR_INVALID_DATE, ERR_MISSING_DATE, HISTORICAL_PATH,
	INFO_CURRENCIES_FORMAT, INFO_INVALID_DATE, INFO_MISSING_DATE, LIVE_PATH, MSG_INVALID_API_KEY, MSG_NO_API_KEY,
};

pub const HISTORICAL_DATE: &str = "2018-01-01";
pub const SELECTED_CURRENCIES: &str = "EUR,GBP,JPY";

/// Every case of the contract, keyed with the api keys from `config`.
pub fn currency_suite(config: &HarnessConfig) -> Vec<TestCase> {
	let key = config.api_key.as_str();
	let selected = quote_keys(BASE_CURRENCY, SELECTED_CURRENCIES);

	let mut live_rates = TestCase::get("live_rates", LIVE_PATH)
		.param("apikey", key)
		.expect_status(200)
		.expect("success", Matcher::equal_to(true))
		.expect("timestamp", Matcher::NotNull);
	for quote in quote_keys(BASE_CURRENCY, "AED,CAD,INR,EUR") {
		live_rates = live_rates.expect(format!("quotes.{}", quote), Matcher::NotNull);
	}

	let mut historical_rates = TestCase::get("historical_rates", HISTORICAL_PATH)
		.param("date", HISTORICAL_DATE)
		.param("apikey", key)
		.expect_status(200)
		.expect("success", Matcher::equal_to(true))
		.expect("source", Matcher::equal_to(BASE_CURRENCY));
	for quote in quote_keys(BASE_CURRENCY, "CAD,EUR,RUB") {
		historical_rates = historical_rates.expect("quotes", Matcher::has_key(quote));
	}

	let selected_checks = |case: TestCase| {
		let case = selected.iter().fold(case.expect_status(200), |c, q| c.expect("quotes", Matcher::has_key(q.as_str())));
		case.expect("quotes", Matcher::only_keys(selected.iter().cloned()))
	};

	vec![
		live_rates,
		historical_rates,
		TestCase::get("missing_api_key", LIVE_PATH)
			.param("apikey", "")
			.expect_status(401)
			.expect("message", Matcher::equal_to(MSG_NO_API_KEY)),
		TestCase::get("invalid_api_key", LIVE_PATH)
			.param("apikey", config.invalid_api_key.as_str())
			.expect_status(401)
			.expect("message", Matcher::equal_to(MSG_INVALID_API_KEY)),
		TestCase::get("invalid_currency_code", LIVE_PATH)
			.param("apikey", key)
			.param("currencies", "NILNIL")
			.expect_status(200)
			.expect("success", Matcher::equal_to(false))
			.expect("error.code", Matcher::equal_to(ERR_INVALID_CURRENCIES))
			.expect("error.info", Matcher::contains(INFO_CURRENCIES_FORMAT)),
		selected_checks(
			TestCase::get("live_rates_selected_currencies", LIVE_PATH)
				.param("apikey", key)
				.param("currencies", SELECTED_CURRENCIES),
		),
		selected_checks(
			TestCase::get("historical_rates_selected_currencies", HISTORICAL_PATH)
				.param("date", HISTORICAL_DATE)
				.param("apikey", key)
				.param("currencies", SELECTED_CURRENCIES),
		),
		TestCase::get("missing_date", HISTORICAL_PATH)
			.param("apikey", key)
			.expect_status(200)
			.expect("success", Matcher::equal_to(false))
			.expect("error.code", Matcher::equal_to(ERR_MISSING_DATE))
			.expect("error.info", Matcher::contains(INFO_MISSING_DATE)),
		TestCase::get("invalid_date", HISTORICAL_PATH)
			.param("date", "INVALID")
			.param("apikey", key)
			.expect_status(200)
			.expect("success", Matcher::equal_to(false))
			.expect("error.code", Matcher::equal_to(ERR_INVALID_DATE))
			.expect("error.info", Matcher::contains(INFO_INVALID_DATE)),
		TestCase::get("historical_date_round_trip", HISTORICAL_PATH)
			.param("date", HISTORICAL_DATE)
			.param("apikey", key)
			.expect_status(200)
			.expect("timestamp", Matcher::utc_date(HISTORICAL_DATE)),
	]
}

/// Keeps the cases whose name contains `needle`; `None` keeps everything.
pub fn filter_cases(cases: Vec<TestCase>, needle: Option<&str>) -> Vec<TestCase> {
	match needle {
		Some(n) if !n.is_empty() => cases.into_iter().filter(|c| c.name.contains(n)).collect(),
		_ => cases,
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
	pub run_id: Uuid,
	pub started_at: i64,
	pub total: usize,
	pub passed: usize,
	pub failed: usize,
	/// Responses whose body could not be read as JSON.
	pub malformed: usize,
	pub not_executed: usize,
	pub cases: Vec<CaseReport>,
}

impl SuiteReport {
	pub fn from_cases(run_id: Uuid, started_at: i64, cases: Vec<CaseReport>) -> Self {
		let passed = cases.iter().filter(|c| c.passed()).count();
		let malformed = cases.iter().filter(|c| matches!(c.outcome, Outcome::MalformedBody { .. })).count();
		let not_executed = cases.iter().filter(|c| matches!(c.outcome, Outcome::NotExecuted(_))).count();
		Self {
			run_id,
			started_at,
			total: cases.len(),
			passed,
			failed: cases.len() - passed - malformed - not_executed,
			malformed,
			not_executed,
			cases,
		}
	}

	pub fn all_passed(&self) -> bool {
		self.passed == self.total
	}
}

/// Runs `cases` one after another. A failing case never stops the rest.
pub async fn run_suite(harness: &Harness, cases: &[TestCase]) -> SuiteReport {
	let run_id = Uuid::new_v4();
	let started_at = OffsetDateTime::now_utc().unix_timestamp();
	let span = info_span!("suite", %run_id, base_url = %harness.config().base_url);
	async move {
		let mut reports = Vec::with_capacity(cases.len());
		for case in cases {
			reports.push(harness.run_case(case).await);
		}
		let report = SuiteReport::from_cases(run_id, started_at, reports);
		info!(
			total = report.total,
			passed = report.passed,
			failed = report.failed,
			malformed = report.malformed,
			not_executed = report.not_executed,
			"suite finished"
		);
		report
	}
	.instrument(span)
	.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::harness::Check;

	fn config() -> HarnessConfig {
		HarnessConfig::new("http://stub", "good-key").with_invalid_api_key("bad-key")
	}

	fn case<'a>(cases: &'a [TestCase], name: &str) -> &'a TestCase {
		cases.iter().find(|c| c.name == name).unwrap()
	}

	#[test]
	fn suite_covers_the_contract() {
		let cases = currency_suite(&config());
		let names: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();
		assert_eq!(
			names,
			vec![
				"live_rates",
				"historical_rates",
				"missing_api_key",
				"invalid_api_key",
				"invalid_currency_code",
				"live_rates_selected_currencies",
				"historical_rates_selected_currencies",
				"missing_date",
				"invalid_date",
				"historical_date_round_trip",
			]
		);
	}

	#[test]
	fn keys_come_from_config() {
		let cases = currency_suite(&config());
		let apikey = |name: &str| case(&cases, name).params.iter().find(|(k, _)| k == "apikey").map(|(_, v)| v.clone());
		assert_eq!(apikey("live_rates").as_deref(), Some("good-key"));
		assert_eq!(apikey("missing_api_key").as_deref(), Some(""));
		assert_eq!(apikey("invalid_api_key").as_deref(), Some("bad-key"));
	}

	#[test]
	fn selected_currencies_forbid_extra_quotes() {
		let cases = currency_suite(&config());
		let checks = &case(&cases, "historical_rates_selected_currencies").checks;
		assert!(checks.contains(&Check::JsonPath {
			path: "quotes".into(),
			matcher: Matcher::only_keys(["USDEUR", "USDGBP", "USDJPY"]),
		}));
	}

	#[test]
	fn filter_by_substring() {
		let cases = currency_suite(&config());
		assert_eq!(filter_cases(cases.clone(), None).len(), cases.len());
		assert_eq!(filter_cases(cases.clone(), Some("")).len(), cases.len());
		let dates: Vec<String> = filter_cases(cases.clone(), Some("date")).into_iter().map(|c| c.name).collect();
		assert_eq!(dates, vec!["missing_date", "invalid_date", "historical_date_round_trip"]);
		assert!(filter_cases(cases, Some("no_such_case")).is_empty());
	}

	#[test]
	fn report_counts_each_outcome_once() {
		let case = |name: &str, outcome: Outcome| CaseReport {
			name: name.into(),
			url: "http://stub/live".into(),
			status: Some(200),
			checks_run: 1,
			elapsed_ms: 3,
			outcome,
		};
		let report = SuiteReport::from_cases(
			Uuid::new_v4(),
			0,
			vec![
				case("a", Outcome::Passed),
				case("b", Outcome::Failed(Vec::new())),
				case("c", Outcome::MalformedBody { reason: "eof".into(), failures: Vec::new() }),
				case("d", Outcome::NotExecuted("refused".into())),
			],
		);
		assert_eq!((report.total, report.passed, report.failed, report.malformed, report.not_executed), (4, 1, 1, 1, 1));
		assert!(!report.all_passed());
	}
}
