use aide::axum::{
	routing::{get_with, post_with, put_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
	#[error("unknown comment {0}")]
	UnknownComment(i64),
}

pub type RouteError = error::RouteError<Error>;

/// Comment routes, relative to the post router.
pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/:post_id/comments",
			post_with(create_comment, create_comment_docs),
		)
		.api_route(
			"/:post_id/comments/:comment_id",
			put_with(update_comment, update_comment_docs)
				.delete_with(delete_comment, delete_comment_docs),
		)
		.api_route(
			"/:post_id/comments/:comment_id/edit",
			get_with(edit_comment, edit_comment_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownComment(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post")
				.detail("post", post)
				.into_vec(),
			Self::UnknownComment(comment) => error::Message::new("unknown_comment")
				.detail("comment", comment)
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_comments_are_oldest_first() {
		let app = app();
		let author = app.register("author").await;
		let reader = app.register("reader").await;
		let post_id = app.post(&author, published("post")).await;

		for text in ["first", "second", "third"] {
			let response = app
				.server
				.post(&format!("/posts/{post_id}/comments"))
				.add_cookie(reader.cookie.clone())
				.json(&json!({ "text": text }))
				.await;

			assert_eq!(response.status_code(), 303);
			assert_eq!(response.header("location"), format!("/posts/{post_id}").as_str());
		}

		let body = app
			.server
			.get(&format!("/posts/{post_id}"))
			.await
			.json::<Value>();

		let texts = body["comments"]
			.as_array()
			.unwrap()
			.iter()
			.map(|comment| comment["text"].as_str().unwrap())
			.collect::<Vec<_>>();

		assert_eq!(texts, ["first", "second", "third"]);
		assert_eq!(body["post"]["comment_count"], 3);
		assert_eq!(body["comments"][0]["author"]["username"], "reader");
	}

	#[tokio::test]
	async fn test_cannot_comment_on_hidden_post() {
		let app = app();
		let author = app.register("author").await;
		let reader = app.register("reader").await;
		let post_id = app
			.post(&author, PostInput {
				is_published: false,
				..published("draft")
			})
			.await;

		let response = app
			.server
			.post(&format!("/posts/{post_id}/comments"))
			.add_cookie(reader.cookie)
			.json(&json!({ "text": "hello" }))
			.await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(app.store.comment_count().await, 0);

		let response = app
			.server
			.post(&format!("/posts/{post_id}/comments"))
			.add_cookie(author.cookie)
			.json(&json!({ "text": "note to self" }))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(app.store.comment_count().await, 1);
	}

	#[tokio::test]
	async fn test_empty_comment_is_rejected() {
		let app = app();
		let author = app.register("author").await;
		let post_id = app.post(&author, published("post")).await;

		let response = app
			.server
			.post(&format!("/posts/{post_id}/comments"))
			.add_cookie(author.cookie)
			.json(&json!({ "text": "" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "text");
		assert_eq!(app.store.comment_count().await, 0);
	}

	#[tokio::test]
	async fn test_only_the_author_can_change_a_comment() {
		let app = app();
		let author = app.register("author").await;
		let stranger = app.register("stranger").await;
		let post_id = app.post(&author, published("post")).await;
		let comment_id = app.comment(&author, post_id, "original").await;
		let path = format!("/posts/{post_id}/comments/{comment_id}");

		let response = app
			.server
			.put(&path)
			.add_cookie(stranger.cookie.clone())
			.json(&json!({ "text": "hijacked" }))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), format!("/posts/{post_id}").as_str());

		for body in [json!({ "text": "" }), json!(42)] {
			let response = app
				.server
				.put(&path)
				.add_cookie(stranger.cookie.clone())
				.json(&body)
				.await;

			assert_eq!(response.status_code(), 303, "{body}");
		}

		let response = app
			.server
			.delete(&path)
			.add_cookie(stranger.cookie.clone())
			.await;

		assert_eq!(response.status_code(), 303);

		let response = app
			.server
			.get(&format!("{path}/edit"))
			.add_cookie(stranger.cookie)
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(app.store.comment_count().await, 1);

		let response = app
			.server
			.get(&format!("{path}/edit"))
			.add_cookie(author.cookie.clone())
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["text"], "original");

		let response = app
			.server
			.put(&path)
			.add_cookie(author.cookie.clone())
			.json(&json!({ "text": "edited" }))
			.await;

		assert_eq!(response.status_code(), 303);

		let body = app
			.server
			.get(&format!("/posts/{post_id}"))
			.await
			.json::<Value>();

		assert_eq!(body["comments"][0]["text"], "edited");

		let response = app.server.delete(&path).add_cookie(author.cookie).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(app.store.comment_count().await, 0);
	}

	#[tokio::test]
	async fn test_comment_under_another_post_is_not_found() {
		let app = app();
		let author = app.register("author").await;
		let first = app.post(&author, published("first")).await;
		let second = app.post(&author, published("second")).await;
		let comment_id = app.comment(&author, first, "hello").await;

		let response = app
			.server
			.get(&format!("/posts/{second}/comments/{comment_id}/edit"))
			.add_cookie(author.cookie)
			.await;

		assert_eq!(response.status_code(), 404);
	}
}
