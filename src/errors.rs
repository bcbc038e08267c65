use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One expectation that a received response did not meet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionFailure {
	/// Human readable form of the check, e.g. `quotes has key USDEUR`.
	pub check: String,
	/// What was actually found, `None` when the path did not resolve.
	pub actual: Option<String>,
	pub message: String,
}

impl AssertionFailure {
	pub fn new(check: impl Into<String>, actual: Option<String>, message: impl Into<String>) -> Self {
		Self { check: check.into(), actual, message: message.into() }
	}
}

impl fmt::Display for AssertionFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.actual {
			Some(actual) => write!(f, "{}: {} (actual: {})", self.check, self.message, actual),
			None => write!(f, "{}: {}", self.check, self.message),
		}
	}
}

#[derive(Debug, Error)]
pub enum HarnessError {
	#[error("request to {url} failed: {source}")]
	Network {
		url: String,
		#[source]
		source: reqwest::Error,
	},
	#[error("request to {url} timed out after {timeout_ms}ms")]
	Timeout { url: String, timeout_ms: u64 },
	#[error("malformed response from {url}: {reason}")]
	MalformedResponse { url: String, reason: String },
	#[error("assertion failed: {0}")]
	Assertion(AssertionFailure),
	#[error("configuration error: {0}")]
	Config(String),
}

/// Coarse category used by reports: a request that never produced a usable
/// response is not the same failure as a response with the wrong content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
	Execution,
	Assertion,
	Config,
}

impl HarnessError {
	pub fn kind(&self) -> FailureKind {
		match self {
			HarnessError::Network { .. } => FailureKind::Execution,
			HarnessError::Timeout { .. } => FailureKind::Execution,
			HarnessError::MalformedResponse { .. } => FailureKind::Execution,
			HarnessError::Assertion(_) => FailureKind::Assertion,
			HarnessError::Config(_) => FailureKind::Config,
		}
	}

	pub(crate) fn from_reqwest(url: &str, timeout_ms: u64, err: reqwest::Error) -> Self {
		if err.is_timeout() {
			HarnessError::Timeout { url: url.to_string(), timeout_ms }
		} else {
			HarnessError::Network { url: url.to_string(), source: err }
		}
	}
}

impl From<AssertionFailure> for HarnessError {
	fn from(failure: AssertionFailure) -> Self {
		HarnessError::Assertion(failure)
	}
}

pub type HarnessResult<T> = Result<T, HarnessError>;
