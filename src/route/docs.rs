use std::sync::Arc;

use aide::{
	axum::{routing::get_with, ApiRouter, IntoApiResponse},
	openapi::OpenApi,
};
use axum::{response::IntoResponse, Extension};

use crate::{extract::Json, AppState};

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new().api_route(
		"/api.json",
		get_with(serve_docs, |op| op.description("This OpenAPI document.")),
	)
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	Json(api.as_ref()).into_response()
}
