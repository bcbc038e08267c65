//! Declarative checks on a single value inside a JSON document.
//!
//! A [`Matcher`] is paired with a dotted path (`quotes.USDEUR`, `error.code`)
//! and evaluated by [`Matcher::evaluate`] against whatever [`resolve`] found at
//! that path.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::errors::AssertionFailure;
use crate::models::utc_date;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Matcher {
	/// Value equals the given JSON value; numbers compare numerically.
	Equals(Value),
	/// Path resolves to something other than `null`.
	NotNull,
	/// Value is a string containing the substring.
	Contains(String),
	/// Value is a mapping with the given key, whatever its value.
	HasKey(String),
	/// Value is a mapping whose key set is exactly the given one.
	OnlyKeys(Vec<String>),
	/// Value is a unix timestamp (seconds) that falls on this `YYYY-MM-DD` in UTC.
	UtcDate(String),
}

impl Matcher {
	pub fn equal_to(value: impl Into<Value>) -> Self {
		Matcher::Equals(value.into())
	}

	pub fn contains(substring: impl Into<String>) -> Self {
		Matcher::Contains(substring.into())
	}

	pub fn has_key(key: impl Into<String>) -> Self {
		Matcher::HasKey(key.into())
	}

	pub fn only_keys<I, S>(keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Matcher::OnlyKeys(keys.into_iter().map(Into::into).collect())
	}

	pub fn utc_date(date: impl Into<String>) -> Self {
		Matcher::UtcDate(date.into())
	}

	pub fn description(&self, path: &str) -> String {
		let path = if path.is_empty() { "<root>" } else { path };
		match self {
			Matcher::Equals(v) => format!("{} equals {}", path, v),
			Matcher::NotNull => format!("{} is not null", path),
			Matcher::Contains(s) => format!("{} contains {:?}", path, s),
			Matcher::HasKey(k) => format!("{} has key {}", path, k),
			Matcher::OnlyKeys(keys) => format!("{} has exactly keys [{}]", path, keys.join(", ")),
			Matcher::UtcDate(d) => format!("{} falls on {} (UTC)", path, d),
		}
	}

	/// Checks `actual`, the result of resolving `path`. `None` means the path
	/// did not resolve.
	pub fn evaluate(&self, path: &str, actual: Option<&Value>) -> Result<(), AssertionFailure> {
		let fail = |actual: Option<&Value>, message: String| {
			Err(AssertionFailure::new(self.description(path), actual.map(Value::to_string), message))
		};
		let Some(value) = actual else {
			return fail(None, format!("path '{}' not found", path));
		};
		match self {
			Matcher::Equals(expected) => {
				if json_eq(value, expected) {
					Ok(())
				} else {
					fail(Some(value), format!("expected {}", expected))
				}
			}
			Matcher::NotNull => {
				if value.is_null() {
					fail(Some(value), "value is null".into())
				} else {
					Ok(())
				}
			}
			Matcher::Contains(needle) => match value.as_str() {
				Some(s) if s.contains(needle.as_str()) => Ok(()),
				Some(_) => fail(Some(value), "substring not found".into()),
				None => fail(Some(value), "value is not a string".into()),
			},
			Matcher::HasKey(key) => match value.as_object() {
				Some(map) if map.contains_key(key) => Ok(()),
				Some(_) => fail(Some(value), format!("key '{}' absent", key)),
				None => fail(Some(value), "value is not an object".into()),
			},
			Matcher::OnlyKeys(keys) => {
				let Some(map) = value.as_object() else {
					return fail(Some(value), "value is not an object".into());
				};
				let expected: BTreeSet<&str> = keys.iter().map(String::as_str).collect();
				let found: BTreeSet<&str> = map.keys().map(String::as_str).collect();
				if expected == found {
					return Ok(());
				}
				let missing: Vec<&str> = expected.difference(&found).copied().collect();
				let unexpected: Vec<&str> = found.difference(&expected).copied().collect();
				fail(Some(value), format!("missing [{}], unexpected [{}]", missing.join(", "), unexpected.join(", ")))
			}
			Matcher::UtcDate(date) => {
				let Some(ts) = value.as_i64() else {
					return fail(Some(value), "value is not an integer timestamp".into());
				};
				match utc_date(ts) {
					Some(actual_date) if &actual_date == date => Ok(()),
					Some(actual_date) => fail(Some(value), format!("timestamp is on {}", actual_date)),
					None => fail(Some(value), "timestamp out of range".into()),
				}
			}
		}
	}
}

/// Walks a dotted path through `doc`. Mapping keys descend into objects and
/// numeric segments index arrays; the empty path is the document itself.
pub fn resolve<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
	if path.is_empty() {
		return Some(doc);
	}
	let mut cur = doc;
	for segment in path.split('.') {
		cur = match cur {
			Value::Object(map) => map.get(segment)?,
			Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
			_ => return None,
		};
	}
	Some(cur)
}

fn json_eq(actual: &Value, expected: &Value) -> bool {
	match (actual, expected) {
		(Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
			(Some(x), Some(y)) => x == y,
			_ => a.as_f64() == b.as_f64(),
		},
		_ => actual == expected,
	}
}
