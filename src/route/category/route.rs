use axum::extract::State;
use chrono::Utc;
use macros::route;

use crate::{
	extract::{Json, Path, Query},
	openapi::tag,
	store::PostFilter,
	Database,
};

use super::{model, Error, RouteError};

/// Get category posts
/// Returns a published category and a paginated response of its publicly
/// visible posts, newest first.
#[route(tag = tag::CATEGORY)]
pub async fn get_category_posts(
	State(database): State<Database>,
	Path(path): Path<model::CategoryPath>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<model::CategoryPage>, RouteError> {
	let category = database
		.category_by_slug(&path.category_slug)
		.await?
		.filter(|category| category.is_published)
		.ok_or(Error::UnknownCategory(path.category_slug))?;

	let filter = PostFilter {
		category_id: Some(category.id),
		..PostFilter::visible(Utc::now())
	};

	let posts = database.list_posts(filter, paginate).await?;

	Ok(Json(model::CategoryPage { category, posts }))
}
