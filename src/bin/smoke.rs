use clap::Parser;

use currency_contract::models::{ApiErrorPayload, AuthErrorPayload, RatesPayload};
use currency_contract::{assert_status, init_tracing, Harness, HarnessConfig};

#[derive(Parser, Debug)]
#[command(name = "smoke")]
#[command(about = "Sends one GET to the currency rates API and prints what came back", long_about = None)]
struct Opts {
	#[arg(long, default_value = "/live")]
	path: String,
	/// Extra query parameter as key=value, repeatable.
	#[arg(long = "param", value_parser = parse_param)]
	params: Vec<(String, String)>,
	/// Leave the configured api key out of the request.
	#[arg(long)]
	no_key: bool,
	#[arg(long)]
	expect_status: Option<u16>,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
	match raw.split_once('=') {
		Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
		_ => Err(format!("expected key=value, got {:?}", raw)),
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	init_tracing();
	let opts = Opts::parse();
	let config = HarnessConfig::from_env()?;
	let mut params = opts.params.clone();
	if !opts.no_key {
		params.push(("apikey".into(), config.api_key.clone()));
	}
	let harness = Harness::new(config)?;

	println!("GET {}", harness.config().url(&opts.path));
	let r = harness.get(&opts.path, &params).await?;
	println!("  status: {} ({} ms)", r.status, r.elapsed.as_millis());

	if let Ok(rates) = serde_json::from_str::<RatesPayload>(&r.body) {
		println!("  source {} at {}, {} quotes", rates.source, rates.timestamp, rates.quotes.len());
	} else if let Ok(err) = serde_json::from_str::<ApiErrorPayload>(&r.body) {
		println!("  api error {}: {}", err.error.code, err.error.info);
	} else if let Ok(auth) = serde_json::from_str::<AuthErrorPayload>(&r.body) {
		println!("  rejected: {}", auth.message);
	} else {
		println!("  body: {}", r.body);
	}

	if let Some(expected) = opts.expect_status {
		assert_status(&r, expected)?;
	}
	println!("OK");
	Ok(())
}
