use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::errors::{AssertionFailure, FailureKind, HarnessError, HarnessResult};
use crate::matcher::{resolve, Matcher};

/// Status, body and timing of one GET.
#[derive(Debug, Clone)]
pub struct ApiResponse {
	pub url: String,
	pub status: u16,
	pub body: String,
	pub elapsed: Duration,
}

impl ApiResponse {
	pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
		Self { url: url.into(), status, body: body.into(), elapsed: Duration::ZERO }
	}

	/// Parses the body. Fails with `MalformedResponse` if it is not JSON.
	pub fn json(&self) -> HarnessResult<Value> {
		serde_json::from_str(&self.body)
			.map_err(|e| HarnessError::MalformedResponse { url: self.url.clone(), reason: e.to_string() })
	}

	pub fn json_path(&self, path: &str) -> HarnessResult<Option<Value>> {
		let doc = self.json()?;
		Ok(resolve(&doc, path).cloned())
	}
}

pub fn assert_status(response: &ApiResponse, expected: u16) -> HarnessResult<()> {
	if response.status == expected {
		return Ok(());
	}
	Err(AssertionFailure::new(
		format!("status is {}", expected),
		Some(response.status.to_string()),
		"unexpected status code",
	)
	.into())
}

pub fn assert_json_path(response: &ApiResponse, path: &str, matcher: &Matcher) -> HarnessResult<()> {
	let doc = response.json()?;
	matcher.evaluate(path, resolve(&doc, path))?;
	Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
	Status { expected: u16 },
	JsonPath { path: String, matcher: Matcher },
}

impl Check {
	pub fn description(&self) -> String {
		match self {
			Check::Status { expected } => format!("status is {}", expected),
			Check::JsonPath { path, matcher } => matcher.description(path),
		}
	}

	pub fn evaluate(&self, response: &ApiResponse) -> HarnessResult<()> {
		match self {
			Check::Status { expected } => assert_status(response, *expected),
			Check::JsonPath { path, matcher } => assert_json_path(response, path, matcher),
		}
	}

	fn reads_body(&self) -> bool {
		matches!(self, Check::JsonPath { .. })
	}
}

/// One request plus the checks to run on its response.
#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
	pub name: String,
	pub path: String,
	#[serde(skip)]
	pub params: Vec<(String, String)>,
	pub checks: Vec<Check>,
}

impl TestCase {
	pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
		Self { name: name.into(), path: path.into(), params: Vec::new(), checks: Vec::new() }
	}

	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.push((key.into(), value.into()));
		self
	}

	pub fn expect_status(mut self, expected: u16) -> Self {
		self.checks.push(Check::Status { expected });
		self
	}

	pub fn expect(mut self, path: impl Into<String>, matcher: Matcher) -> Self {
		self.checks.push(Check::JsonPath { path: path.into(), matcher });
		self
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
	Passed,
	Failed(Vec<AssertionFailure>),
	/// A response arrived but its body is not JSON. JSON checks were skipped;
	/// `failures` holds what the remaining checks found.
	MalformedBody { reason: String, failures: Vec<AssertionFailure> },
	/// The request never produced a response that checks could run against.
	NotExecuted(String),
}

impl Outcome {
	pub fn kind(&self) -> Option<FailureKind> {
		match self {
			Outcome::Passed => None,
			Outcome::Failed(_) => Some(FailureKind::Assertion),
			Outcome::MalformedBody { .. } | Outcome::NotExecuted(_) => Some(FailureKind::Execution),
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
	pub name: String,
	pub url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<u16>,
	pub checks_run: usize,
	pub elapsed_ms: u64,
	pub outcome: Outcome,
}

impl CaseReport {
	pub fn passed(&self) -> bool {
		self.outcome == Outcome::Passed
	}
}

pub struct Harness {
	client: reqwest::Client,
	config: HarnessConfig,
}

impl Harness {
	pub fn new(config: HarnessConfig) -> HarnessResult<Self> {
		let client = reqwest::Client::builder()
			.user_agent(concat!("currency-contract/", env!("CARGO_PKG_VERSION")))
			.timeout(config.timeout)
			.build()
			.map_err(|e| HarnessError::Config(format!("failed to build http client: {}", e)))?;
		Ok(Self { client, config })
	}

	pub fn config(&self) -> &HarnessConfig {
		&self.config
	}

	/// Issues one GET to `base_url + path`. Never retried.
	pub async fn get(&self, path: &str, params: &[(String, String)]) -> HarnessResult<ApiResponse> {
		let url = self.config.url(path);
		let timeout_ms = self.config.timeout_ms();
		let names: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
		debug!(%url, params = ?names, "GET");

		let started = Instant::now();
		let resp = self
			.client
			.get(&url)
			.query(params)
			.send()
			.await
			.map_err(|e| HarnessError::from_reqwest(&url, timeout_ms, e))?;
		let status = resp.status().as_u16();
		let body = resp.text().await.map_err(|e| HarnessError::from_reqwest(&url, timeout_ms, e))?;
		let elapsed = started.elapsed();
		debug!(%url, status, elapsed_ms = elapsed.as_millis() as u64, "response");

		Ok(ApiResponse { url, status, body, elapsed })
	}

	/// Sends the request and evaluates every check, independently of each other.
	pub async fn run_case(&self, case: &TestCase) -> CaseReport {
		let url = self.config.url(&case.path);
		let response = match self.get(&case.path, &case.params).await {
			Ok(r) => r,
			Err(e) => {
				warn!(case = %case.name, error = %e, "request not executed");
				return CaseReport {
					name: case.name.clone(),
					url,
					status: None,
					checks_run: 0,
					elapsed_ms: 0,
					outcome: Outcome::NotExecuted(e.to_string()),
				};
			}
		};
		let report = evaluate_case(case, &response);
		match &report.outcome {
			Outcome::Passed => info!(case = %case.name, status = response.status, "passed"),
			Outcome::Failed(failures) => {
				for f in failures {
					warn!(case = %case.name, failure = %f, "check failed");
				}
			}
			Outcome::MalformedBody { reason, failures } => {
				warn!(case = %case.name, %reason, other_failures = failures.len(), "body is not JSON")
			}
			Outcome::NotExecuted(reason) => warn!(case = %case.name, %reason, "not executed"),
		}
		report
	}
}

/// Runs all checks of `case` against an already received response. The body
/// is parsed at most once, and only if some check reads it.
pub fn evaluate_case(case: &TestCase, response: &ApiResponse) -> CaseReport {
	let doc = case.checks.iter().any(Check::reads_body).then(|| response.json());
	let mut failures = Vec::new();
	let mut checks_run = 0;
	for check in &case.checks {
		let result = match (check, &doc) {
			(Check::Status { expected }, _) => assert_status(response, *expected),
			(Check::JsonPath { path, matcher }, Some(Ok(doc))) => {
				matcher.evaluate(path, resolve(doc, path)).map_err(HarnessError::from)
			}
			// Unreadable body: reported once for the whole case below.
			(Check::JsonPath { .. }, _) => continue,
		};
		checks_run += 1;
		match result {
			Ok(()) => {}
			Err(HarnessError::Assertion(f)) => failures.push(f),
			Err(e) => failures.push(AssertionFailure::new(check.description(), None, e.to_string())),
		}
	}
	let outcome = match doc {
		Some(Err(e)) => Outcome::MalformedBody { reason: e.to_string(), failures },
		_ if failures.is_empty() => Outcome::Passed,
		_ => Outcome::Failed(failures),
	};
	CaseReport {
		name: case.name.clone(),
		url: response.url.clone(),
		status: Some(response.status),
		checks_run,
		elapsed_ms: response.elapsed.as_millis() as u64,
		outcome,
	}
}
