//! Runtime configuration, read from the environment (and `.env`, if present).

use std::{env, net::IpAddr};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} is not valid: {value:?}")]
	Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	/// When absent, the service runs against an in-memory store.
	pub database_url: Option<String>,
	pub max_connections: u32,
	/// When present, traces and metrics are exported over OTLP.
	pub otlp_endpoint: Option<String>,
	/// A JSON file of categories and locations to upsert at startup.
	pub seed_file: Option<String>,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		Ok(Self {
			host: parse(&lookup, "HOST")?.unwrap_or(IpAddr::from([127, 0, 0, 1])),
			port: parse(&lookup, "PORT")?.unwrap_or(3000),
			database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
			max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(10),
			otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|url| !url.is_empty()),
			seed_file: lookup("SEED_FILE").filter(|path| !path.is_empty()),
		})
	}
}

fn parse<T: std::str::FromStr>(
	lookup: impl Fn(&str) -> Option<String>,
	name: &'static str,
) -> Result<Option<T>, Error> {
	lookup(name)
		.map(|value| value.parse().map_err(|_| Error::Invalid { name, value }))
		.transpose()
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::*;

	fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
		let vars = vars
			.iter()
			.map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
			.collect::<HashMap<_, _>>();

		Config::from_lookup(|name| vars.get(name).cloned())
	}

	#[test]
	fn test_defaults() {
		let config = config(&[]).unwrap();

		assert_eq!(config.port, 3000);
		assert_eq!(config.host, IpAddr::from([127, 0, 0, 1]));
		assert_eq!(config.max_connections, 10);
		assert!(config.database_url.is_none());
		assert!(config.otlp_endpoint.is_none());
		assert!(config.seed_file.is_none());
	}

	#[test]
	fn test_overrides() {
		let config = config(&[
			("PORT", "8080"),
			("HOST", "0.0.0.0"),
			("DATABASE_URL", "postgres://localhost/blog"),
			("SEED_FILE", "seed.json"),
		])
		.unwrap();

		assert_eq!(config.port, 8080);
		assert_eq!(config.host, IpAddr::from([0, 0, 0, 0]));
		assert_eq!(
			config.database_url.as_deref(),
			Some("postgres://localhost/blog")
		);
		assert_eq!(config.seed_file.as_deref(), Some("seed.json"));
	}

	#[test]
	fn test_invalid_port() {
		assert!(matches!(
			config(&[("PORT", "http")]),
			Err(Error::Invalid { name: "PORT", .. })
		));
	}
}
