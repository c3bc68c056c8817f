use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use chrono::Utc;

use crate::{error, policy, route::auth::model::User, store, AppState, Database};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", post_with(create_post, create_post_docs))
		.api_route(
			"/:post_id",
			get_with(get_post, get_post_docs)
				.put_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.api_route("/:post_id/edit", get_with(edit_post, edit_post_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post")
				.detail("post", post)
				.into_vec(),
		}
	}
}

/// Fetches a post if `viewer` may read it.
///
/// Authors always can; everyone else only once the post is publicly visible.
pub async fn readable_post(
	database: &Database,
	viewer: Option<&User>,
	post_id: i64,
) -> Result<Option<model::PostView>, store::Error> {
	let post = database.post(post_id).await?;

	Ok(post.filter(|post| {
		viewer.is_some_and(|user| policy::can_modify(user, post))
			|| policy::is_visible(post, Utc::now())
	}))
}

#[cfg(test)]
mod test {
	use chrono::Duration;

	use crate::test::*;

	#[tokio::test]
	async fn test_home_shows_only_visible_posts() {
		let app = app();
		let author = app.register("author").await;
		let hidden = app.category("hidden", false).await;
		let shown = app.category("shown", true).await;

		app.post(&author, published("visible")).await;
		app.post(&author, PostInput {
			category_id: Some(shown.id),
			..published("in a published category")
		})
		.await;
		app.post(&author, PostInput {
			pub_date: PubDate(Utc::now() + Duration::days(1)),
			..published("scheduled")
		})
		.await;
		app.post(&author, PostInput {
			is_published: false,
			..published("draft")
		})
		.await;
		app.post(&author, PostInput {
			category_id: Some(hidden.id),
			..published("in a hidden category")
		})
		.await;

		let response = app.server.get("/").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			titles(&response.json::<Value>()),
			["in a published category", "visible"]
		);
	}

	#[tokio::test]
	async fn test_home_is_newest_first() {
		let app = app();
		let author = app.register("author").await;

		for hours_ago in [3, 1, 2] {
			app.post(&author, PostInput {
				pub_date: PubDate(Utc::now() - Duration::hours(hours_ago)),
				..published(&format!("{hours_ago}"))
			})
			.await;
		}

		let response = app.server.get("/").add_query_param("size", 2).await;
		let body = response.json::<Value>();

		assert_eq!(titles(&body), ["1", "2"]);
		assert_eq!(body["total"], 3);
		assert_eq!(body["pages"], 2);

		let response = app
			.server
			.get("/")
			.add_query_param("size", 2)
			.add_query_param("page", 2)
			.await;

		assert_eq!(titles(&response.json::<Value>()), ["3"]);

		let response = app.server.get("/").add_query_param("page", 0).await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_hidden_post_is_only_readable_by_its_author() {
		let app = app();
		let author = app.register("author").await;
		let reader = app.register("reader").await;

		let post_id = app
			.post(&author, PostInput {
				is_published: false,
				..published("draft")
			})
			.await;

		let path = format!("/posts/{post_id}");

		assert_eq!(app.server.get(&path).await.status_code(), 404);
		assert_eq!(
			app.server
				.get(&path)
				.add_cookie(reader.cookie)
				.await
				.status_code(),
			404
		);

		let response = app.server.get(&path).add_cookie(author.cookie).await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["post"]["title"], "draft");
		assert_eq!(body["comments"], json!([]));
		assert_eq!(body["form"]["text"], "");
	}

	#[tokio::test]
	async fn test_create_post_redirects_to_profile() {
		let app = app();
		let author = app.register("author").await;

		let response = app
			.server
			.post("/posts")
			.add_cookie(author.cookie)
			.json(&json!({
				"title": "Hello",
				"text": "World",
				"pub_date": "2024-01-31 18:30",
				"is_published": true,
			}))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/profile/author");
		assert_eq!(app.store.post_count().await, 1);
	}

	#[tokio::test]
	async fn test_create_post_requires_login() {
		let app = app();

		let response = app
			.server
			.post("/posts")
			.json(&json!({
				"title": "Hello",
				"text": "World",
				"pub_date": "2024-01-31 18:30",
			}))
			.await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(app.store.post_count().await, 0);
	}

	#[tokio::test]
	async fn test_invalid_post_is_rejected_per_field() {
		let app = app();
		let author = app.register("author").await;

		let response = app
			.server
			.post("/posts")
			.add_cookie(author.cookie)
			.json(&json!({
				"title": "",
				"text": "",
				"pub_date": "2024-01-31 18:30",
			}))
			.await;

		assert_eq!(response.status_code(), 400);

		let body = response.json::<Value>();
		let fields = body["errors"]
			.as_array()
			.unwrap()
			.iter()
			.map(|error| error["field"].as_str().unwrap())
			.collect::<Vec<_>>();

		assert_eq!(fields, ["text", "title"]);
		assert_eq!(app.store.post_count().await, 0);
	}

	#[tokio::test]
	async fn test_author_gets_field_errors_on_update() {
		let app = app();
		let author = app.register("author").await;
		let post_id = app.post(&author, published("before")).await;

		let response = app
			.server
			.put(&format!("/posts/{post_id}"))
			.add_cookie(author.cookie.clone())
			.json(&json!({ "title": "", "text": "after", "pub_date": "2024-01-31 18:30" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "title");

		let response = app
			.server
			.put(&format!("/posts/{post_id}"))
			.add_cookie(author.cookie)
			.json(&json!({ "text": "after" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["code"], "invalid_body");
	}

	#[tokio::test]
	async fn test_malformed_body_is_rejected() {
		let app = app();
		let author = app.register("author").await;

		let response = app
			.server
			.post("/posts")
			.add_cookie(author.cookie)
			.text("{")
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["code"], "invalid_body");
	}

	#[tokio::test]
	async fn test_profile_redirect_is_percent_encoded() {
		let app = app();

		let response = app
			.server
			.post("/auth/register")
			.json(&json!({
				"email": "jose@example.com",
				"username": "josé",
				"password": PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = app
			.server
			.post("/posts")
			.add_cookie(response.cookie("session"))
			.json(&json!({
				"title": "Hello",
				"text": "World",
				"pub_date": "2024-01-31 18:30",
			}))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/profile/jos%C3%A9");
	}

	#[tokio::test]
	async fn test_unknown_category_is_a_field_error() {
		let app = app();
		let author = app.register("author").await;

		let response = app
			.server
			.post("/posts")
			.add_cookie(author.cookie)
			.json(&json!({
				"title": "Hello",
				"text": "World",
				"pub_date": "2024-01-31 18:30",
				"category_id": 404,
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["field"],
			"category_id"
		);
	}

	#[tokio::test]
	async fn test_author_can_edit_post() {
		let app = app();
		let author = app.register("author").await;
		let post_id = app.post(&author, published("before")).await;

		let response = app
			.server
			.put(&format!("/posts/{post_id}"))
			.add_cookie(author.cookie.clone())
			.json(&PostInput {
				text: "after".into(),
				..published("after")
			})
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), format!("/posts/{post_id}").as_str());

		let response = app
			.server
			.get(&format!("/posts/{post_id}"))
			.add_cookie(author.cookie)
			.await;

		assert_eq!(response.json::<Value>()["post"]["text"], "after");
	}

	#[tokio::test]
	async fn test_stranger_edit_is_redirected() {
		let app = app();
		let author = app.register("author").await;
		let stranger = app.register("stranger").await;
		let post_id = app.post(&author, published("before")).await;

		let response = app
			.server
			.put(&format!("/posts/{post_id}"))
			.add_cookie(stranger.cookie.clone())
			.json(&json!({ "title": "", "text": "hijacked", "pub_date": "2024-01-31 18:30" }))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), format!("/posts/{post_id}").as_str());

		// Partial and malformed bodies get the same answer
		for body in [json!({ "text": "hijacked" }), json!("hijacked")] {
			let response = app
				.server
				.put(&format!("/posts/{post_id}"))
				.add_cookie(stranger.cookie.clone())
				.json(&body)
				.await;

			assert_eq!(response.status_code(), 303);
		}

		let response = app
			.server
			.delete(&format!("/posts/{post_id}"))
			.add_cookie(stranger.cookie.clone())
			.await;

		assert_eq!(response.status_code(), 303);

		let response = app
			.server
			.get(&format!("/posts/{post_id}/edit"))
			.add_cookie(stranger.cookie)
			.await;

		assert_eq!(response.status_code(), 303);

		let response = app.server.get(&format!("/posts/{post_id}")).await;

		assert_eq!(response.json::<Value>()["post"]["text"], "text");
		assert_eq!(app.store.post_count().await, 1);
	}

	#[tokio::test]
	async fn test_edit_form_holds_current_values() {
		let app = app();
		let author = app.register("author").await;
		let post_id = app.post(&author, published("current")).await;

		let response = app
			.server
			.get(&format!("/posts/{post_id}/edit"))
			.add_cookie(author.cookie)
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["title"], "current");
	}

	#[tokio::test]
	async fn test_author_can_delete_post() {
		let app = app();
		let author = app.register("author").await;
		let post_id = app.post(&author, published("doomed")).await;

		let response = app
			.server
			.delete(&format!("/posts/{post_id}"))
			.add_cookie(author.cookie)
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/profile/author");
		assert_eq!(app.store.post_count().await, 0);
	}

	#[tokio::test]
	async fn test_unknown_post_is_not_found() {
		let app = app();

		assert_eq!(app.server.get("/posts/1").await.status_code(), 404);
		assert_eq!(app.server.get("/posts/abc").await.status_code(), 404);
	}
}
