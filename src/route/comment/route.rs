use axum::extract::State;
use macros::route;
use validator::Validate;

use crate::{
	extract::{Json, Path, Payload, Session},
	openapi::tag,
	policy,
	redirect::{OrRedirect, Redirect},
	route::post::{model::PostPath, readable_post},
	Database,
};

use super::{model, Error, RouteError};

/// Fetches a comment, provided it sits under the post in the path.
async fn find_comment(
	database: &Database,
	path: &model::CommentPath,
) -> Result<model::Comment, RouteError> {
	Ok(database
		.comment(path.post_id, path.comment_id)
		.await?
		.ok_or(Error::UnknownComment(path.comment_id))?)
}

/// Create comment
/// Leaves a comment under a post the logged in user can read.
#[route(tag = tag::COMMENT, response(status = 303, description = "Created, redirects to the post."))]
pub async fn create_comment(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<PostPath>,
	payload: Payload<model::CreateComment>,
) -> Result<Redirect, RouteError> {
	let post = readable_post(&database, Some(&session.user), path.post_id)
		.await?
		.ok_or(Error::UnknownPost(path.post_id))?;

	let input = payload.parse()?;
	input.validate()?;

	// The post may have been deleted since it was read
	let comment = database
		.create_comment(post.id, session.user.id, &input)
		.await?
		.ok_or(Error::UnknownPost(post.id))?;

	tracing::info!(post = post.id, comment = comment.id, "created comment");

	Ok(Redirect::post(post.id))
}

/// Get comment form
/// Returns the current text of a comment, for its author to edit.
#[route(tag = tag::COMMENT, response(status = 303, description = "Not the author, redirects to the post."))]
pub async fn edit_comment(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::CommentPath>,
) -> Result<OrRedirect<Json<model::CreateComment>>, RouteError> {
	let comment = find_comment(&database, &path).await?;

	policy::authorize_then(&session.user, comment, |comment| async move {
		Ok::<_, RouteError>(OrRedirect::Value(Json(model::CreateComment {
			text: comment.text,
		})))
	})
	.await
}

/// Update comment
/// Changes the text of a comment. Only its author may do this.
#[route(tag = tag::COMMENT, response(status = 303, description = "Redirects to the post."))]
pub async fn update_comment(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::CommentPath>,
	payload: Payload<model::UpdateComment>,
) -> Result<Redirect, RouteError> {
	let comment = find_comment(&database, &path).await?;

	policy::authorize_then(&session.user, comment, |comment| async move {
		let input = payload.parse()?;
		input.validate()?;

		database
			.update_comment(comment.id, &input)
			.await?
			.ok_or(Error::UnknownComment(comment.id))?;

		tracing::info!(comment = comment.id, "updated comment");

		Ok::<_, RouteError>(Redirect::post(comment.post_id))
	})
	.await
}

/// Delete comment
/// Deletes a comment. Only its author may do this.
#[route(tag = tag::COMMENT, response(status = 303, description = "Deleted, redirects to the post."))]
pub async fn delete_comment(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::CommentPath>,
) -> Result<Redirect, RouteError> {
	let comment = find_comment(&database, &path).await?;

	policy::authorize_then(&session.user, comment, |comment| async move {
		if !database.delete_comment(comment.id).await? {
			return Err(Error::UnknownComment(comment.id).into());
		}

		tracing::info!(comment = comment.id, "deleted comment");

		Ok::<_, RouteError>(Redirect::post(comment.post_id))
	})
	.await
}
