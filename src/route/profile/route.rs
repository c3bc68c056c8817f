use axum::extract::State;
use chrono::Utc;
use macros::route;
use validator::Validate;

use crate::{
	extract::{Json, MaybeSession, Path, Payload, Query, Session},
	openapi::tag,
	policy,
	redirect::Redirect,
	store::PostFilter,
	Database,
};

use super::{model, Error, RouteError};

/// Get profile
/// Returns a user and a paginated response of their posts, newest first.
/// Owners see all of their posts, everyone else only the publicly visible ones.
#[route(tag = tag::PROFILE)]
pub async fn get_profile(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<model::ProfilePath>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<model::ProfilePage>, RouteError> {
	let profile = database
		.user_by_username(&path.username)
		.await?
		.ok_or(Error::UnknownUser(path.username))?;

	let is_owner = session
		.user()
		.is_some_and(|user| policy::can_modify(user, &profile));

	let filter = PostFilter {
		author_id: Some(profile.id),
		visible_at: (!is_owner).then(Utc::now),
		..PostFilter::default()
	};

	let posts = database.list_posts(filter, paginate).await?;

	Ok(Json(model::ProfilePage { profile, posts }))
}

/// Update profile
/// Changes the fields present in the body, keeping the rest. Only the owner of
/// the profile may do this.
#[route(tag = tag::PROFILE, response(status = 303, description = "Redirects to the profile."))]
pub async fn update_profile(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::ProfilePath>,
	payload: Payload<model::UpdateUser>,
) -> Result<Redirect, RouteError> {
	let profile = database
		.user_by_username(&path.username)
		.await?
		.ok_or(Error::UnknownUser(path.username))?;

	policy::authorize_then(&session.user, profile, |profile| async move {
		let input = payload.parse()?;
		input.validate()?;

		let profile = database.update_user(profile.id, &input).await?;

		tracing::info!(user = %profile.id, "updated profile");

		Ok::<_, RouteError>(Redirect::profile(&profile.username))
	})
	.await
}
