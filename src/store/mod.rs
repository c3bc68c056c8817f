//! Persistence behind the routes.
//!
//! [`PgStore`] is used whenever a database is configured, [`MemoryStore`]
//! otherwise and in tests. Both must agree on ordering, visibility and
//! cascading rules.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::route::{
	auth::model::{NewUser, Session, UpdateUser, User},
	category::model::{Category, Location, NewCategory, NewLocation},
	comment::model::{Comment, CommentView, CreateComment, UpdateComment},
	model::{Page, Paginate},
	post::model::{Post, PostInput, PostView},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
	/// A submitted id that points at nothing, named after its field.
	#[error("unknown {0}")]
	UnknownReference(&'static str),
}

/// Narrows a post listing. Every `None` means "don't filter on this".
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
	pub author_id: Option<Uuid>,
	pub category_id: Option<i64>,
	/// Keep only the posts the public can see at this instant.
	pub visible_at: Option<DateTime<Utc>>,
}

impl PostFilter {
	pub fn visible(now: DateTime<Utc>) -> Self {
		Self {
			visible_at: Some(now),
			..Self::default()
		}
	}
}

#[axum::async_trait]
pub trait Store: Send + Sync {
	async fn create_user(&self, user: NewUser) -> Result<User, Error>;

	async fn user_by_email(&self, email: &str) -> Result<Option<User>, Error>;

	async fn user_by_username(&self, username: &str) -> Result<Option<User>, Error>;

	/// Applies the fields present in `input`, leaving the rest unchanged.
	async fn update_user(&self, id: Uuid, input: &UpdateUser) -> Result<User, Error>;

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error>;

	async fn session_user(&self, session_id: Uuid) -> Result<Option<User>, Error>;

	async fn delete_session(&self, session_id: Uuid) -> Result<(), Error>;

	async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, Error>;

	/// Creates a category, or updates the one with the same slug.
	async fn upsert_category(&self, input: &NewCategory) -> Result<Category, Error>;

	/// Creates a location, or updates the one with the same name.
	async fn upsert_location(&self, input: &NewLocation) -> Result<Location, Error>;

	/// Lists posts newest first (by publication date) with their comment counts.
	async fn list_posts(&self, filter: PostFilter, paginate: Paginate)
		-> Result<Page<PostView>, Error>;

	/// Fetches a post regardless of its visibility.
	async fn post(&self, id: i64) -> Result<Option<PostView>, Error>;

	async fn create_post(&self, author_id: Uuid, input: &PostInput) -> Result<Post, Error>;

	/// Replaces every editable field. Returns `None` if the post is gone.
	async fn update_post(&self, id: i64, input: &PostInput) -> Result<Option<Post>, Error>;

	/// Deletes a post and its comments. Returns false if there was nothing to delete.
	async fn delete_post(&self, id: i64) -> Result<bool, Error>;

	/// Lists the comments of a post, oldest first.
	async fn comments(&self, post_id: i64) -> Result<Vec<CommentView>, Error>;

	/// Fetches a comment, provided it belongs to `post_id`.
	async fn comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>, Error>;

	/// Returns `None` if the post is gone.
	async fn create_comment(
		&self,
		post_id: i64,
		author_id: Uuid,
		input: &CreateComment,
	) -> Result<Option<Comment>, Error>;

	async fn update_comment(&self, id: i64, input: &UpdateComment)
		-> Result<Option<Comment>, Error>;

	async fn delete_comment(&self, id: i64) -> Result<bool, Error>;
}
