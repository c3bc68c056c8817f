use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub use crate::route::model::{Page, Paginate};
use crate::route::post::model::PostView;

/// A group of posts, addressed by its slug.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Category {
	pub id: i64,
	pub title: String,
	pub description: String,
	/// Unique; letters, digits, hyphens and underscores.
	pub slug: String,
	/// Unpublished categories hide every post filed under them.
	pub is_published: bool,
	pub created_at: DateTime<Utc>,
}

/// Where a post was written.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Location {
	pub id: i64,
	pub name: String,
	pub is_published: bool,
	pub created_at: DateTime<Utc>,
}

#[inline]
fn published() -> bool {
	true
}

/// Letters, digits, hyphens and underscores.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
	if slug
		.chars()
		.any(|c| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
	{
		return Err(ValidationError::new("slug_characters"));
	}

	Ok(())
}

/// The fields a category is created with. Categories are keyed by slug.
#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct NewCategory {
	#[validate(length(min = 1, max = 256))]
	pub title: String,
	#[serde(default)]
	pub description: String,
	#[validate(length(min = 1, max = 256), custom(function = "validate_slug"))]
	pub slug: String,
	#[serde(default = "published")]
	pub is_published: bool,
}

/// The fields a location is created with. Locations are keyed by name.
#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct NewLocation {
	#[validate(length(min = 1, max = 256))]
	pub name: String,
	#[serde(default = "published")]
	pub is_published: bool,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CategoryPath {
	#[validate(length(min = 1, max = 256))]
	pub category_slug: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CategoryPage {
	pub category: Category,
	pub posts: Page<PostView>,
}
