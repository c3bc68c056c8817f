use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{error::RouteError, openapi::SECURITY_SCHEME_SESSION, route::auth, session, Database};

/// Extracts the session and related user from the request.
///
/// If it does not exist, a [`auth::Error::NoSessionCookie`] is returned.
/// If the session is invalid, a [`auth::Error::InvalidSessionCookie`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: auth::model::User,
}

/// Like [`Session`], for routes that anonymous visitors may use too.
///
/// A missing or stale session cookie yields `None` rather than an error.
#[derive(Debug)]
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
	pub fn user(&self) -> Option<&auth::model::User> {
		self.0.as_ref().map(|session| &session.user)
	}
}

/// Looks up the user behind the session cookie, if any.
async fn lookup<S>(
	parts: &request::Parts,
	state: &S,
) -> Result<Option<Session>, RouteError<auth::Error>>
where
	Database: FromRef<S>,
{
	let cookies = parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok());

	let Some(session_id) = session::find_session_id(cookies) else {
		return Ok(None);
	};

	let database = Database::from_ref(state);
	let user = database.session_user(session_id).await?;

	Ok(user.map(|user| Session {
		id: session_id,
		user,
	}))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	/// Extracts the session from the request using the session cookie.
	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let has_cookie = parts
			.headers
			.get_all(header::COOKIE)
			.into_iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(cookie::Cookie::split_parse)
			.filter_map(Result::ok)
			.any(|cookie| cookie.name() == session::COOKIE_NAME);

		if !has_cookie {
			return Err(auth::Error::NoSessionCookie.into());
		}

		lookup(parts, state)
			.await?
			.ok_or_else(|| auth::Error::InvalidSessionCookie.into())
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		Ok(Self(lookup(parts, state).await?))
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session cookie requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}

impl OperationInput for MaybeSession {}
