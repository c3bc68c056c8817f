pub use crate::route::model::{Page, Paginate};

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::{de, Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::{
	auth::model::User,
	comment::model::{CommentView, CreateComment},
};

/// A single post, as stored.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Post {
	pub id: i64,
	pub author_id: Uuid,
	pub title: String,
	pub text: String,
	/// Posts dated in the future stay hidden until then.
	pub pub_date: DateTime<Utc>,
	pub is_published: bool,
	pub image: Option<String>,
	pub location_id: Option<i64>,
	pub category_id: Option<i64>,
	pub created_at: DateTime<Utc>,
}

/// The public face of a user, embedded in posts and comments.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Author {
	pub id: Uuid,
	pub username: String,
	pub first_name: String,
	pub last_name: String,
}

impl From<&User> for Author {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			username: user.username.clone(),
			first_name: user.first_name.clone(),
			last_name: user.last_name.clone(),
		}
	}
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CategorySummary {
	pub id: i64,
	pub title: String,
	pub slug: String,
	pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LocationSummary {
	pub id: i64,
	pub name: String,
	pub is_published: bool,
}

/// A post together with its author, category, location and comment count.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PostView {
	pub id: i64,
	pub title: String,
	pub text: String,
	pub pub_date: DateTime<Utc>,
	pub is_published: bool,
	pub image: Option<String>,
	pub created_at: DateTime<Utc>,
	pub author: Author,
	pub category: Option<CategorySummary>,
	pub location: Option<LocationSummary>,
	pub comment_count: i64,
}

/// A publication date as typed into a form.
///
/// Accepts `YYYY-MM-DD HH:MM`, the `T`-separated form browsers send for
/// `datetime-local` inputs (both optionally with seconds) and RFC 3339.
/// Dates without an offset are taken to be UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PubDate(pub DateTime<Utc>);

pub const PUB_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

const NAIVE_FORMATS: [&str; 4] = [
	PUB_DATE_FORMAT,
	"%Y-%m-%dT%H:%M",
	"%Y-%m-%d %H:%M:%S",
	"%Y-%m-%dT%H:%M:%S",
];

#[derive(Debug, thiserror::Error)]
#[error("expected a date like 2024-01-31 18:30, got {0:?}")]
pub struct PubDateError(String);

impl FromStr for PubDate {
	type Err = PubDateError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();

		if let Ok(date) = DateTime::parse_from_rfc3339(s) {
			return Ok(Self(date.with_timezone(&Utc)));
		}

		NAIVE_FORMATS
			.iter()
			.find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
			.map(|date| Self(date.and_utc()))
			.ok_or_else(|| PubDateError(s.to_owned()))
	}
}

impl fmt::Display for PubDate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.format(PUB_DATE_FORMAT))
	}
}

impl<'de> Deserialize<'de> for PubDate {
	fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;

		s.parse().map_err(de::Error::custom)
	}
}

impl Serialize for PubDate {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl JsonSchema for PubDate {
	fn schema_name() -> String {
		"PubDate".to_owned()
	}

	fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
		String::json_schema(gen)
	}
}

/// The post submission form, used both to create and to edit a post.
///
/// Every field is submitted every time: an absent category or location
/// clears it, and an absent `is_published` reads as an unchecked box.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct PostInput {
	#[validate(length(min = 1, max = 256))]
	pub title: String,
	#[validate(length(min = 1))]
	pub text: String,
	pub pub_date: PubDate,
	#[serde(default)]
	pub location_id: Option<i64>,
	#[serde(default)]
	pub category_id: Option<i64>,
	/// A path or URL of an already uploaded image.
	#[serde(default)]
	#[validate(length(min = 1, max = 256))]
	pub image: Option<String>,
	#[serde(default)]
	pub is_published: bool,
}

impl From<&PostView> for PostInput {
	fn from(post: &PostView) -> Self {
		Self {
			title: post.title.clone(),
			text: post.text.clone(),
			pub_date: PubDate(post.pub_date),
			location_id: post.location.as_ref().map(|location| location.id),
			category_id: post.category.as_ref().map(|category| category.id),
			image: post.image.clone(),
			is_published: post.is_published,
		}
	}
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct PostPath {
	pub post_id: i64,
}

/// Everything the post page shows.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDetail {
	pub post: PostView,
	/// Oldest first.
	pub comments: Vec<CommentView>,
	/// An empty comment form.
	pub form: CreateComment,
}
