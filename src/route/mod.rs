use aide::axum::{routing::get_with, ApiRouter};

use crate::AppState;

pub mod auth;
pub mod category;
pub mod comment;
pub mod docs;
pub mod model;
pub mod post;
pub mod profile;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.api_route(
			"/",
			get_with(post::route::get_posts, post::route::get_posts_docs),
		)
		.nest("/auth", auth::routes())
		.nest("/posts", post::routes().merge(comment::routes()))
		.nest("/category", category::routes())
		.nest("/profile", profile::routes())
		.nest("/docs", docs::routes())
}
