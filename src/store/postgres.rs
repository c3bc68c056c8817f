use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{Error, PostFilter, Store};
use crate::route::{
	auth::model::{NewUser, Session, UpdateUser, User},
	category::model::{Category, Location, NewCategory, NewLocation},
	comment::model::{Comment, CommentView, CreateComment, UpdateComment},
	model::{Page, Paginate},
	post::model::{Author, CategorySummary, LocationSummary, Post, PostInput, PostView},
};

const POST_VIEW: &str = r#"
	SELECT
		p.id, p.title, p.text, p.pub_date, p.is_published, p.image, p.created_at,
		u.id AS author_id,
		u.username AS author_username,
		u.first_name AS author_first_name,
		u.last_name AS author_last_name,
		c.id AS category_id,
		c.title AS category_title,
		c.slug AS category_slug,
		c.is_published AS category_is_published,
		l.id AS location_id,
		l.name AS location_name,
		l.is_published AS location_is_published,
		(SELECT COUNT(*) FROM comment WHERE comment.post_id = p.id) AS comment_count
	FROM post p
	JOIN "user" u ON u.id = p.author_id
	LEFT JOIN category c ON c.id = p.category_id
	LEFT JOIN location l ON l.id = p.location_id
"#;

/// `$1` author, `$2` category, `$3` the instant posts must be visible at.
const POST_FILTER: &str = r#"
	WHERE ($1::uuid IS NULL OR p.author_id = $1)
		AND ($2::bigint IS NULL OR p.category_id = $2)
		AND (
			$3::timestamptz IS NULL
			OR (p.is_published AND p.pub_date <= $3 AND (c.id IS NULL OR c.is_published))
		)
"#;

const COMMENT_VIEW: &str = r#"
	SELECT
		c.id, c.post_id, c.text, c.created_at,
		u.id AS author_id,
		u.username AS author_username,
		u.first_name AS author_first_name,
		u.last_name AS author_last_name
	FROM comment c
	JOIN "user" u ON u.id = c.author_id
"#;

/// A Postgres-backed store.
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	/// Connects to the database and brings its schema up to date.
	pub async fn connect(url: &str, max_connections: u32) -> Result<Self, Error> {
		let pool = PgPoolOptions::new()
			.max_connections(max_connections)
			.connect(url)
			.await?;

		sqlx::migrate!().run(&pool).await?;

		Ok(Self { pool })
	}
}

/// Translates constraint violations into errors the client can act on.
fn constraint_error(error: sqlx::Error) -> Error {
	let constraint = match &error {
		sqlx::Error::Database(e) => e.constraint().map(str::to_owned),
		_ => None,
	};

	match constraint.as_deref() {
		Some("user_email_key") => Error::EmailTaken,
		Some("user_username_key") => Error::UsernameTaken,
		Some("post_category_id_fkey") => Error::UnknownReference("category_id"),
		Some("post_location_id_fkey") => Error::UnknownReference("location_id"),
		_ => Error::Database(error),
	}
}

#[derive(sqlx::FromRow)]
struct PostRow {
	id: i64,
	title: String,
	text: String,
	pub_date: DateTime<Utc>,
	is_published: bool,
	image: Option<String>,
	created_at: DateTime<Utc>,
	author_id: Uuid,
	author_username: String,
	author_first_name: String,
	author_last_name: String,
	category_id: Option<i64>,
	category_title: Option<String>,
	category_slug: Option<String>,
	category_is_published: Option<bool>,
	location_id: Option<i64>,
	location_name: Option<String>,
	location_is_published: Option<bool>,
	comment_count: i64,
}

impl From<PostRow> for PostView {
	fn from(row: PostRow) -> Self {
		let category = match (
			row.category_id,
			row.category_title,
			row.category_slug,
			row.category_is_published,
		) {
			(Some(id), Some(title), Some(slug), Some(is_published)) => Some(CategorySummary {
				id,
				title,
				slug,
				is_published,
			}),
			_ => None,
		};

		let location = match (row.location_id, row.location_name, row.location_is_published) {
			(Some(id), Some(name), Some(is_published)) => Some(LocationSummary {
				id,
				name,
				is_published,
			}),
			_ => None,
		};

		Self {
			id: row.id,
			title: row.title,
			text: row.text,
			pub_date: row.pub_date,
			is_published: row.is_published,
			image: row.image,
			created_at: row.created_at,
			author: Author {
				id: row.author_id,
				username: row.author_username,
				first_name: row.author_first_name,
				last_name: row.author_last_name,
			},
			category,
			location,
			comment_count: row.comment_count,
		}
	}
}

#[derive(sqlx::FromRow)]
struct CommentRow {
	id: i64,
	post_id: i64,
	text: String,
	created_at: DateTime<Utc>,
	author_id: Uuid,
	author_username: String,
	author_first_name: String,
	author_last_name: String,
}

impl From<CommentRow> for CommentView {
	fn from(row: CommentRow) -> Self {
		Self {
			id: row.id,
			post_id: row.post_id,
			text: row.text,
			created_at: row.created_at,
			author: Author {
				id: row.author_id,
				username: row.author_username,
				first_name: row.author_first_name,
				last_name: row.author_last_name,
			},
		}
	}
}

#[axum::async_trait]
impl Store for PgStore {
	async fn create_user(&self, user: NewUser) -> Result<User, Error> {
		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, email, username, first_name, last_name, password)
				VALUES ($1, $2, $3, $4, $5, $6)
				RETURNING *
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.username)
		.bind(&user.first_name)
		.bind(&user.last_name)
		.bind(&user.password)
		.fetch_one(&self.pool)
		.await
		.map_err(constraint_error)
	}

	async fn user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
				.bind(email)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = $1"#)
				.bind(username)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn update_user(&self, id: Uuid, input: &UpdateUser) -> Result<User, Error> {
		sqlx::query_as::<_, User>(
			r#"
				UPDATE "user"
				SET
					email = COALESCE($1, email),
					username = COALESCE($2, username),
					first_name = COALESCE($3, first_name),
					last_name = COALESCE($4, last_name)
				WHERE id = $5
				RETURNING *
			"#,
		)
		.bind(&input.email)
		.bind(&input.username)
		.bind(&input.first_name)
		.bind(&input.last_name)
		.bind(id)
		.fetch_one(&self.pool)
		.await
		.map_err(constraint_error)
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error> {
		Ok(
			sqlx::query_as::<_, Session>("INSERT INTO session (user_id) VALUES ($1) RETURNING *")
				.bind(user_id)
				.fetch_one(&self.pool)
				.await?,
		)
	}

	async fn session_user(&self, session_id: Uuid) -> Result<Option<User>, Error> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&self.pool)
		.await?)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<(), Error> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session_id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, Error> {
		Ok(
			sqlx::query_as::<_, Category>("SELECT * FROM category WHERE slug = $1")
				.bind(slug)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn upsert_category(&self, input: &NewCategory) -> Result<Category, Error> {
		Ok(sqlx::query_as::<_, Category>(
			r#"
				INSERT INTO category (title, description, slug, is_published)
				VALUES ($1, $2, $3, $4)
				ON CONFLICT (slug) DO UPDATE
				SET
					title = EXCLUDED.title,
					description = EXCLUDED.description,
					is_published = EXCLUDED.is_published
				RETURNING *
			"#,
		)
		.bind(&input.title)
		.bind(&input.description)
		.bind(&input.slug)
		.bind(input.is_published)
		.fetch_one(&self.pool)
		.await?)
	}

	async fn upsert_location(&self, input: &NewLocation) -> Result<Location, Error> {
		Ok(sqlx::query_as::<_, Location>(
			r#"
				INSERT INTO location (name, is_published)
				VALUES ($1, $2)
				ON CONFLICT (name) DO UPDATE
				SET is_published = EXCLUDED.is_published
				RETURNING *
			"#,
		)
		.bind(&input.name)
		.bind(input.is_published)
		.fetch_one(&self.pool)
		.await?)
	}

	async fn list_posts(
		&self,
		filter: PostFilter,
		paginate: Paginate,
	) -> Result<Page<PostView>, Error> {
		let total = sqlx::query_scalar::<_, i64>(&format!(
			"SELECT COUNT(*) FROM post p LEFT JOIN category c ON c.id = p.category_id {POST_FILTER}"
		))
		.bind(filter.author_id)
		.bind(filter.category_id)
		.bind(filter.visible_at)
		.fetch_one(&self.pool)
		.await?;

		let posts = sqlx::query_as::<_, PostRow>(&format!(
			"{POST_VIEW} {POST_FILTER} ORDER BY p.pub_date DESC, p.id DESC LIMIT $4 OFFSET $5"
		))
		.bind(filter.author_id)
		.bind(filter.category_id)
		.bind(filter.visible_at)
		.bind(paginate.limit())
		.bind(paginate.offset())
		.fetch_all(&self.pool)
		.await?;

		Ok(Page::new(
			posts.into_iter().map(PostView::from).collect(),
			paginate,
			total,
		))
	}

	async fn post(&self, id: i64) -> Result<Option<PostView>, Error> {
		let post = sqlx::query_as::<_, PostRow>(&format!("{POST_VIEW} WHERE p.id = $1"))
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post.map(PostView::from))
	}

	async fn create_post(&self, author_id: Uuid, input: &PostInput) -> Result<Post, Error> {
		sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (
					author_id, title, text, pub_date, is_published, image, location_id, category_id
				)
				VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
				RETURNING *
			"#,
		)
		.bind(author_id)
		.bind(&input.title)
		.bind(&input.text)
		.bind(input.pub_date.0)
		.bind(input.is_published)
		.bind(&input.image)
		.bind(input.location_id)
		.bind(input.category_id)
		.fetch_one(&self.pool)
		.await
		.map_err(constraint_error)
	}

	async fn update_post(&self, id: i64, input: &PostInput) -> Result<Option<Post>, Error> {
		sqlx::query_as::<_, Post>(
			r#"
				UPDATE post
				SET
					title = $1,
					text = $2,
					pub_date = $3,
					is_published = $4,
					image = $5,
					location_id = $6,
					category_id = $7
				WHERE id = $8
				RETURNING *
			"#,
		)
		.bind(&input.title)
		.bind(&input.text)
		.bind(input.pub_date.0)
		.bind(input.is_published)
		.bind(&input.image)
		.bind(input.location_id)
		.bind(input.category_id)
		.bind(id)
		.fetch_optional(&self.pool)
		.await
		.map_err(constraint_error)
	}

	async fn delete_post(&self, id: i64) -> Result<bool, Error> {
		// Comments go with it through ON DELETE CASCADE
		let status = sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn comments(&self, post_id: i64) -> Result<Vec<CommentView>, Error> {
		let comments = sqlx::query_as::<_, CommentRow>(&format!(
			"{COMMENT_VIEW} WHERE c.post_id = $1 ORDER BY c.created_at, c.id"
		))
		.bind(post_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(comments.into_iter().map(CommentView::from).collect())
	}

	async fn comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>, Error> {
		Ok(
			sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE id = $1 AND post_id = $2")
				.bind(comment_id)
				.bind(post_id)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn create_comment(
		&self,
		post_id: i64,
		author_id: Uuid,
		input: &CreateComment,
	) -> Result<Option<Comment>, Error> {
		let comment = sqlx::query_as::<_, Comment>(
			r#"
				INSERT INTO comment (post_id, author_id, text)
				VALUES ($1, $2, $3)
				RETURNING *
			"#,
		)
		.bind(post_id)
		.bind(author_id)
		.bind(&input.text)
		.fetch_one(&self.pool)
		.await;

		match comment {
			Ok(comment) => Ok(Some(comment)),
			Err(sqlx::Error::Database(e)) if e.constraint() == Some("comment_post_id_fkey") => {
				Ok(None)
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn update_comment(
		&self,
		id: i64,
		input: &UpdateComment,
	) -> Result<Option<Comment>, Error> {
		Ok(sqlx::query_as::<_, Comment>(
			r#"
				UPDATE comment
				SET text = COALESCE($1, text)
				WHERE id = $2
				RETURNING *
			"#,
		)
		.bind(&input.text)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?)
	}

	async fn delete_comment(&self, id: i64) -> Result<bool, Error> {
		let status = sqlx::query("DELETE FROM comment WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}
}
