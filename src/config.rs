use std::fmt;
use std::time::Duration;

use crate::errors::{HarnessError, HarnessResult};

pub const DEFAULT_BASE_URL: &str = "https://api.apilayer.com/currency_data";
pub const DEFAULT_INVALID_API_KEY: &str = "invalid-0000000000000000000000000000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Static settings for one harness. Built once, never mutated afterwards.
#[derive(Clone)]
pub struct HarnessConfig {
	pub base_url: String,
	pub api_key: String,
	pub invalid_api_key: String,
	pub timeout: Duration,
}

impl HarnessConfig {
	pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into().trim_end_matches('/').to_string(),
			api_key: api_key.into(),
			invalid_api_key: DEFAULT_INVALID_API_KEY.into(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	pub fn with_invalid_api_key(mut self, key: impl Into<String>) -> Self {
		self.invalid_api_key = key.into();
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Reads `CURRENCY_API_*` variables, after loading a local `.env` if one exists.
	pub fn from_env() -> HarnessResult<Self> {
		Self::from_env_with(|_| None)
	}

	/// Like [`HarnessConfig::from_env`], but values returned by `overrides`
	/// win over the environment. The environment itself is never written.
	pub fn from_env_with<F>(overrides: F) -> HarnessResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		dotenvy::dotenv().ok();
		Self::from_lookup(layered(overrides, |key| std::env::var(key).ok()))
	}

	/// Builds a config from any key lookup. Empty values count as unset.
	pub fn from_lookup<F>(lookup: F) -> HarnessResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
		let base_url = lookup("CURRENCY_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
		let api_key = lookup("CURRENCY_API_KEY")
			.ok_or_else(|| HarnessError::Config("CURRENCY_API_KEY is not set".into()))?;
		let mut config = Self::new(base_url, api_key);
		if let Some(invalid) = lookup("CURRENCY_API_INVALID_KEY") {
			config = config.with_invalid_api_key(invalid);
		}
		if let Some(raw) = lookup("CURRENCY_API_TIMEOUT_SECS") {
			config = config.with_timeout(parse_timeout_secs(&raw)?);
		}
		Ok(config)
	}

	/// Joins the base url and an endpoint path with exactly one slash.
	pub fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path.trim_start_matches('/'))
	}

	pub fn timeout_ms(&self) -> u64 {
		self.timeout.as_millis() as u64
	}
}

/// First lookup that has a value for the key wins.
pub fn layered<A, B>(first: A, second: B) -> impl Fn(&str) -> Option<String>
where
	A: Fn(&str) -> Option<String>,
	B: Fn(&str) -> Option<String>,
{
	move |key: &str| first(key).or_else(|| second(key))
}

pub fn parse_timeout_secs(raw: &str) -> HarnessResult<Duration> {
	match raw.trim().parse::<u64>() {
		Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
		_ => Err(HarnessError::Config(format!("timeout must be a positive number of seconds, got {:?}", raw))),
	}
}

impl fmt::Debug for HarnessConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HarnessConfig")
			.field("base_url", &self.base_url)
			.field("api_key", &"<redacted>")
			.field("invalid_api_key", &"<redacted>")
			.field("timeout", &self.timeout)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |key: &str| map.get(key).cloned()
	}

	#[test]
	fn url_joins_with_single_slash() {
		let config = HarnessConfig::new("http://localhost:9000/", "k");
		assert_eq!(config.url("/live"), "http://localhost:9000/live");
		assert_eq!(config.url("historical"), "http://localhost:9000/historical");
	}

	#[test]
	fn env_requires_api_key() {
		let err = HarnessConfig::from_lookup(lookup_from(&[])).unwrap_err();
		assert!(matches!(err, HarnessError::Config(_)));
		let err = HarnessConfig::from_lookup(lookup_from(&[("CURRENCY_API_KEY", "  ")])).unwrap_err();
		assert!(matches!(err, HarnessError::Config(_)));
	}

	#[test]
	fn env_defaults_and_overrides() {
		let config = HarnessConfig::from_lookup(lookup_from(&[("CURRENCY_API_KEY", "abc")])).unwrap();
		assert_eq!(config.base_url, DEFAULT_BASE_URL);
		assert_eq!(config.invalid_api_key, DEFAULT_INVALID_API_KEY);
		assert_eq!(config.timeout, DEFAULT_TIMEOUT);

		let config = HarnessConfig::from_lookup(lookup_from(&[
			("CURRENCY_API_KEY", "abc"),
			("CURRENCY_API_BASE_URL", "http://127.0.0.1:8080"),
			("CURRENCY_API_INVALID_KEY", "nope"),
			("CURRENCY_API_TIMEOUT_SECS", "5"),
		]))
		.unwrap();
		assert_eq!(config.base_url, "http://127.0.0.1:8080");
		assert_eq!(config.invalid_api_key, "nope");
		assert_eq!(config.timeout, Duration::from_secs(5));
	}

	#[test]
	fn bad_timeout_is_rejected() {
		for raw in ["0", "-1", "soon"] {
			let err = HarnessConfig::from_lookup(lookup_from(&[("CURRENCY_API_KEY", "abc"), ("CURRENCY_API_TIMEOUT_SECS", raw)])).unwrap_err();
			assert!(matches!(err, HarnessError::Config(_)), "{raw:?} should be rejected");
		}
	}

	#[test]
	fn empty_values_count_as_unset() {
		let config = HarnessConfig::from_lookup(lookup_from(&[
			("CURRENCY_API_KEY", "abc"),
			("CURRENCY_API_BASE_URL", ""),
			("CURRENCY_API_INVALID_KEY", " "),
			("CURRENCY_API_TIMEOUT_SECS", ""),
		]))
		.unwrap();
		assert_eq!(config.base_url, DEFAULT_BASE_URL);
		assert_eq!(config.invalid_api_key, DEFAULT_INVALID_API_KEY);
		assert_eq!(config.timeout, DEFAULT_TIMEOUT);
	}

	#[test]
	fn overrides_win_over_environment() {
		let env = lookup_from(&[
			("CURRENCY_API_KEY", "from-env"),
			("CURRENCY_API_BASE_URL", "http://env.example"),
			("CURRENCY_API_TIMEOUT_SECS", "9"),
		]);
		let cli = lookup_from(&[("CURRENCY_API_KEY", "from-cli"), ("CURRENCY_API_TIMEOUT_SECS", "2")]);
		let config = HarnessConfig::from_lookup(layered(cli, env)).unwrap();
		assert_eq!(config.api_key, "from-cli");
		assert_eq!(config.base_url, "http://env.example");
		assert_eq!(config.timeout, Duration::from_secs(2));
	}

	#[test]
	fn debug_hides_keys() {
		let config = HarnessConfig::new("http://x", "super-secret");
		let out = format!("{:?}", config);
		assert!(!out.contains("super-secret"));
		assert!(out.contains("<redacted>"));
	}
}
