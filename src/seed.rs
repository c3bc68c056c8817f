//! Categories and locations, loaded from a JSON file at startup.
//!
//! Entries are upserted, so loading the same file again only applies the
//! changes made to it since.
//!
//! ```json
//! {
//!   "categories": [{ "title": "Travel", "slug": "travel", "description": "..." }],
//!   "locations": [{ "name": "Moscow", "is_published": false }]
//! }
//! ```

use serde::Deserialize;
use validator::Validate;

use crate::{
	route::category::model::{NewCategory, NewLocation},
	store::{self, Store},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to read seed file {path}: {source}")]
	Read {
		path: String,
		source: std::io::Error,
	},
	#[error("invalid seed file: {0}")]
	Parse(#[from] serde_json::Error),
	#[error("invalid seed entry: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("failed to store seed: {0}")]
	Store(#[from] store::Error),
}

#[derive(Debug, Default, Deserialize)]
pub struct Seed {
	#[serde(default)]
	pub categories: Vec<NewCategory>,
	#[serde(default)]
	pub locations: Vec<NewLocation>,
}

impl Seed {
	/// Parses and validates a seed.
	pub fn parse(json: &str) -> Result<Self, Error> {
		let seed: Self = serde_json::from_str(json)?;

		for category in &seed.categories {
			category.validate()?;
		}

		for location in &seed.locations {
			location.validate()?;
		}

		Ok(seed)
	}

	pub async fn load(path: &str) -> Result<Self, Error> {
		let json = tokio::fs::read_to_string(path)
			.await
			.map_err(|source| Error::Read {
				path: path.to_owned(),
				source,
			})?;

		Self::parse(&json)
	}

	pub async fn apply(&self, store: &dyn Store) -> Result<(), Error> {
		for category in &self.categories {
			store.upsert_category(category).await?;
		}

		for location in &self.locations {
			store.upsert_location(location).await?;
		}

		tracing::info!(
			categories = self.categories.len(),
			locations = self.locations.len(),
			"applied seed"
		);

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test::*;

	const SEED: &str = r#"{
		"categories": [
			{ "title": "Travel", "slug": "travel", "description": "Trips" },
			{ "title": "Drafts", "slug": "drafts", "is_published": false }
		],
		"locations": [{ "name": "Moscow" }]
	}"#;

	#[test]
	fn test_parse_seed() {
		let seed = Seed::parse(SEED).unwrap();

		assert_eq!(seed.categories.len(), 2);
		assert!(seed.categories[0].is_published);
		assert!(!seed.categories[1].is_published);
		assert!(seed.locations[0].is_published);
	}

	#[test]
	fn test_invalid_slug_is_rejected() {
		let seed = r#"{ "categories": [{ "title": "Travel", "slug": "travel notes" }] }"#;

		assert!(matches!(Seed::parse(seed), Err(Error::Validation(..))));
	}

	#[tokio::test]
	async fn test_seeded_categories_are_served() {
		let app = app();
		let seed = Seed::parse(SEED).unwrap();

		seed.apply(app.store.as_ref()).await.unwrap();
		seed.apply(app.store.as_ref()).await.unwrap();

		let response = app.server.get("/category/travel").await;

		assert_eq!(response.status_code(), 200);

		let category_id = response.json::<Value>()["category"]["id"].as_i64().unwrap();

		assert_eq!(app.server.get("/category/drafts").await.status_code(), 404);

		let author = app.register("author").await;
		let response = app
			.server
			.post("/posts")
			.add_cookie(author.cookie)
			.json(&json!({
				"title": "Hello",
				"text": "World",
				"pub_date": "2024-01-31 18:30",
				"category_id": category_id,
				"is_published": true,
			}))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(
			titles(&app.server.get("/category/travel").await.json::<Value>()["posts"]),
			["Hello"]
		);
	}
}
