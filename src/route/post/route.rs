use axum::extract::State;
use chrono::Utc;
use macros::route;
use validator::Validate;

use crate::{
	extract::{Json, MaybeSession, Path, Payload, Query, Session},
	openapi::tag,
	policy,
	redirect::{OrRedirect, Redirect},
	route::comment::model::CreateComment,
	store::PostFilter,
	Database,
};

use super::{model, readable_post, Error, RouteError};

/// Get all posts
/// Returns a paginated response of every publicly visible post, newest first.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(database): State<Database>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<model::Page<model::PostView>>, RouteError> {
	let posts = database
		.list_posts(PostFilter::visible(Utc::now()), paginate)
		.await?;

	Ok(Json(posts))
}

/// Get single post
/// Returns a post with its comments, oldest first. Posts that are not publicly
/// visible yet are only returned to their author.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<model::PostPath>,
) -> Result<Json<model::PostDetail>, RouteError> {
	let post = readable_post(&database, session.user(), path.post_id)
		.await?
		.ok_or(Error::UnknownPost(path.post_id))?;

	let comments = database.comments(post.id).await?;

	Ok(Json(model::PostDetail {
		post,
		comments,
		form: CreateComment {
			text: String::new(),
		},
	}))
}

/// Create post
/// Creates a new post authored by the logged in user.
#[route(tag = tag::POST, response(status = 303, description = "Created, redirects to the author's profile."))]
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::PostInput>,
) -> Result<Redirect, RouteError> {
	let post = database.create_post(session.user.id, &input).await?;

	tracing::info!(post = post.id, author = %session.user.id, "created post");

	Ok(Redirect::profile(&session.user.username))
}

/// Get post form
/// Returns the current values of a post, for its author to edit.
#[route(tag = tag::POST, response(status = 303, description = "Not the author, redirects to the post."))]
pub async fn edit_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::PostPath>,
) -> Result<OrRedirect<Json<model::PostInput>>, RouteError> {
	let post = database
		.post(path.post_id)
		.await?
		.ok_or(Error::UnknownPost(path.post_id))?;

	policy::authorize_then(&session.user, post, |post| async move {
		Ok::<_, RouteError>(OrRedirect::Value(Json(model::PostInput::from(&post))))
	})
	.await
}

/// Update post
/// Replaces every editable field of a post. Only its author may do this.
#[route(tag = tag::POST, response(status = 303, description = "Redirects to the post."))]
pub async fn update_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::PostPath>,
	payload: Payload<model::PostInput>,
) -> Result<Redirect, RouteError> {
	let post = database
		.post(path.post_id)
		.await?
		.ok_or(Error::UnknownPost(path.post_id))?;

	policy::authorize_then(&session.user, post, |post| async move {
		let input = payload.parse()?;
		input.validate()?;

		database
			.update_post(post.id, &input)
			.await?
			.ok_or(Error::UnknownPost(post.id))?;

		tracing::info!(post = post.id, "updated post");

		Ok::<_, RouteError>(Redirect::post(post.id))
	})
	.await
}

/// Delete post
/// Deletes a post together with its comments. Only its author may do this.
#[route(tag = tag::POST, response(status = 303, description = "Deleted, redirects to the author's profile."))]
pub async fn delete_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::PostPath>,
) -> Result<Redirect, RouteError> {
	let post = database
		.post(path.post_id)
		.await?
		.ok_or(Error::UnknownPost(path.post_id))?;

	let profile = Redirect::profile(&session.user.username);

	policy::authorize_then(&session.user, post, |post| async move {
		if !database.delete_post(post.id).await? {
			return Err(Error::UnknownPost(post.id).into());
		}

		tracing::info!(post = post.id, "deleted post");

		Ok::<_, RouteError>(profile)
	})
	.await
}
