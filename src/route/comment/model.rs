use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::post::model::Author;

/// A comment left under a post.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Comment {
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The post the comment belongs to.
	#[serde(skip_deserializing)]
	pub post_id: i64,
	#[serde(skip_deserializing)]
	pub author_id: Uuid,
	/// The comment itself.
	#[validate(length(min = 1, max = 10000))]
	pub text: String,
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
}

/// A comment with its author, as shown under a post.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CommentView {
	pub id: i64,
	pub post_id: i64,
	pub text: String,
	pub created_at: DateTime<Utc>,
	pub author: Author,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CommentPath {
	pub post_id: i64,
	pub comment_id: i64,
}
