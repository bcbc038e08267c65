use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

pub const LIVE_PATH: &str = "/live";
pub const HISTORICAL_PATH: &str = "/historical";
pub const BASE_CURRENCY: &str = "USD";

pub const ERR_INVALID_CURRENCIES: i64 = 202;
pub const ERR_MISSING_DATE: i64 = 301;
pub const ERR_INVALID_DATE: i64 = 302;

pub const MSG_NO_API_KEY: &str = "No API key found in request";
pub const MSG_INVALID_API_KEY: &str = "Invalid authentication credentials";
pub const INFO_CURRENCIES_FORMAT: &str = "[Required format: currencies=EUR,USD,GBP,...]";
pub const INFO_MISSING_DATE: &str = "You have not specified a date. [Required format: date=YYYY-MM-DD]";
pub const INFO_INVALID_DATE: &str = "You have entered an invalid date. [Required format: date=YYYY-MM-DD]";

/// Successful `/live` or `/historical` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesPayload {
	pub success: bool,
	pub timestamp: i64,
	pub source: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub date: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub historical: Option<bool>,
	pub quotes: BTreeMap<String, f64>,
}

/// Application level error, delivered with HTTP 200.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorPayload {
	pub success: bool,
	pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
	pub code: i64,
	pub info: String,
}

/// Gateway level rejection, delivered with HTTP 401.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthErrorPayload {
	pub message: String,
}

/// `USD` + `EUR` -> `USDEUR`.
pub fn quote_key(base: &str, quote: &str) -> String {
	format!("{}{}", base.to_ascii_uppercase(), quote.to_ascii_uppercase())
}

/// Quote keys expected for a `currencies=EUR,GBP` style parameter.
pub fn quote_keys(base: &str, currencies: &str) -> Vec<String> {
	currencies
		.split(',')
		.map(str::trim)
		.filter(|c| !c.is_empty())
		.map(|c| quote_key(base, c))
		.collect()
}

/// Calendar date (`YYYY-MM-DD`, UTC) of a unix timestamp in seconds.
pub fn utc_date(timestamp: i64) -> Option<String> {
	let at = OffsetDateTime::from_unix_timestamp(timestamp).ok()?;
	at.date().format(format_description!("[year]-[month]-[day]")).ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quote_keys_follow_requested_list() {
		assert_eq!(quote_key("usd", "eur"), "USDEUR");
		assert_eq!(quote_keys(BASE_CURRENCY, "EUR, GBP,,JPY"), vec!["USDEUR", "USDGBP", "USDJPY"]);
		assert!(quote_keys(BASE_CURRENCY, "").is_empty());
	}

	#[test]
	fn utc_date_of_timestamps() {
		assert_eq!(utc_date(1514764799).as_deref(), Some("2017-12-31"));
		assert_eq!(utc_date(1514764800).as_deref(), Some("2018-01-01"));
		assert_eq!(utc_date(1514851199).as_deref(), Some("2018-01-01"));
		assert_eq!(utc_date(i64::MAX), None);
	}

	#[test]
	fn payloads_deserialize() {
		let ok: RatesPayload = serde_json::from_str(
			r#"{"success":true,"timestamp":1514851199,"source":"USD","historical":true,"date":"2018-01-01","quotes":{"USDEUR":0.83}}"#,
		)
		.unwrap();
		assert_eq!(ok.quotes.get("USDEUR"), Some(&0.83));

		let err: ApiErrorPayload =
			serde_json::from_str(r#"{"success":false,"error":{"code":302,"info":"You have entered an invalid date."}}"#).unwrap();
		assert_eq!(err.error.code, ERR_INVALID_DATE);

		let auth: AuthErrorPayload = serde_json::from_str(r#"{"message":"No API key found in request"}"#).unwrap();
		assert_eq!(auth.message, MSG_NO_API_KEY);
	}
}
