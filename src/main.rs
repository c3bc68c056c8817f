#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod openapi;
mod policy;
mod redirect;
mod route;
mod seed;
mod session;
mod store;
mod trace;


use std::sync::Arc;

use aide::openapi::OpenApi;
use argon2::Argon2;
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

pub type Database = Arc<dyn store::Store>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store and a hash configuration (if it's expensive to create).
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
}

/// Builds the application router around the given store.
pub fn app(database: Database) -> Router {
	let state = State {
		database,
		hasher: Argon2::default(),
	};

	let mut api = OpenApi::default();

	route::routes()
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(CompressionLayer::new())
				.layer(PropagateRequestIdLayer::x_request_id()),
		)
		.with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();

	let config = config::Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(config.otlp_endpoint.as_deref())?;

	let database: Database = match config.database_url.as_deref() {
		Some(url) => Arc::new(store::PgStore::connect(url, config.max_connections).await?),
		None => {
			tracing::warn!("DATABASE_URL not set, running with an in-memory store");

			Arc::new(store::MemoryStore::default())
		}
	};

	if let Some(path) = config.seed_file.as_deref() {
		seed::Seed::load(path).await?.apply(database.as_ref()).await?;
	}

	let listener = tokio::net::TcpListener::bind((config.host, config.port)).await?;

	tracing::info!("listening on {}:{}", config.host, config.port);

	axum::serve(listener, app(database)).await?;

	Ok(())
}
