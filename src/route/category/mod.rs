use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Unpublished categories are reported the same way as missing ones.
	#[error("unknown category {0:?}")]
	UnknownCategory(String),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route(
		"/:category_slug",
		get_with(get_category_posts, get_category_posts_docs),
	)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownCategory(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::UnknownCategory(slug) => error::Message::new("unknown_category")
				.detail("category", slug)
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_category_lists_its_visible_posts() {
		let app = app();
		let author = app.register("author").await;
		let travel = app.category("travel", true).await;
		let food = app.category("food", true).await;

		app.post(&author, PostInput {
			category_id: Some(travel.id),
			..published("in travel")
		})
		.await;
		app.post(&author, PostInput {
			category_id: Some(travel.id),
			is_published: false,
			..published("draft in travel")
		})
		.await;
		app.post(&author, PostInput {
			category_id: Some(food.id),
			..published("in food")
		})
		.await;
		app.post(&author, published("uncategorized")).await;

		let response = app.server.get("/category/travel").await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["category"]["slug"], "travel");
		assert_eq!(titles(&body["posts"]), ["in travel"]);
	}

	#[tokio::test]
	async fn test_unpublished_category_is_not_found() {
		let app = app();
		let author = app.register("author").await;
		let category = app.category("secret", true).await;

		app.post(&author, PostInput {
			category_id: Some(category.id),
			..published("filed")
		})
		.await;

		assert_eq!(app.server.get("/category/secret").await.status_code(), 200);

		app.category("secret", false).await;

		assert_eq!(app.server.get("/category/secret").await.status_code(), 404);
		assert!(titles(&app.server.get("/").await.json::<Value>()).is_empty());
	}

	#[tokio::test]
	async fn test_unknown_category_is_not_found() {
		let app = app();

		assert_eq!(app.server.get("/category/nowhere").await.status_code(), 404);
	}
}
