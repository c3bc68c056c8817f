use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidUsernameOrPassword,
	#[error("password hashing error: {0}")]
	Argon(#[from] argon2::Error),
	#[error("no session cookie")]
	NoSessionCookie,
	#[error("invalid session cookie")]
	InvalidSessionCookie,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidUsernameOrPassword | Self::NoSessionCookie | Self::InvalidSessionCookie => {
				StatusCode::UNAUTHORIZED
			}
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::InvalidUsernameOrPassword => error::Message::new("invalid_credentials")
				.content(self.to_string())
				.into_vec(),
			Self::Argon(error) => {
				tracing::error!(%error, "failed to hash password");

				error::Message::new("internal_error").into_vec()
			}
			Self::NoSessionCookie | Self::InvalidSessionCookie => {
				error::Message::new("login_required")
					.content(self.to_string())
					.into_vec()
			}
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_signup_flow() {
		let app = app();

		let response = app
			.server
			.post("/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let response = app
			.server
			.post("/auth/login")
			.json(&json!({
				"email": "john@smith.com",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let cookie = response.cookie("session");
		let response = app.server.get("/auth/me").add_cookie(cookie).await;

		assert_eq!(response.status_code(), 200);

		assert_eq!(response.json::<serde_json::Value>()["username"], "john");
	}

	#[tokio::test]
	async fn test_wrong_password() {
		let app = app();

		app.register("john").await;

		let response = app
			.server
			.post("/auth/login")
			.json(&json!({
				"email": "john@example.com",
				"password": "not the password",
			}))
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_taken_username() {
		let app = app();

		app.register("john").await;

		let response = app
			.server
			.post("/auth/register")
			.json(&json!({
				"email": "other@example.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(
			response.json::<serde_json::Value>()["errors"][0]["field"],
			"username"
		);
	}

	#[tokio::test]
	async fn test_logout_ends_the_session() {
		let app = app();
		let user = app.register("john").await;

		let response = app
			.server
			.get("/auth/logout")
			.add_cookie(user.cookie.clone())
			.await;

		assert_eq!(response.status_code(), 204);

		let response = app.server.get("/auth/me").add_cookie(user.cookie).await;

		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_me_requires_login() {
		let app = app();

		assert_eq!(app.server.get("/auth/me").await.status_code(), 401);
	}
}
