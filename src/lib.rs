//! Contract checks for a currency exchange rates HTTP API.
//!
//! [`Harness`] issues single GET requests and evaluates declarative
//! [`Check`]s against the response; [`suite::currency_suite`] lists the cases
//! that make up the `/live` and `/historical` contract.

pub mod config;
pub mod errors;
pub mod harness;
pub mod matcher;
pub mod models;
pub mod suite;

pub use config::HarnessConfig;
pub use errors::{AssertionFailure, FailureKind, HarnessError, HarnessResult};
pub use harness::{assert_json_path, assert_status, ApiResponse, CaseReport, Check, Harness, Outcome, TestCase};
pub use matcher::{resolve, Matcher};
pub use suite::{currency_suite, run_suite, SuiteReport};

/// Installs the fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
	use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

	let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::new(env_filter))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.try_init()
		.ok();
}
