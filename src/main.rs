#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod media;
mod model;
mod openapi;
mod polish;
mod route;
mod store;
mod trace;

use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{extract::DefaultBodyLimit, http::Method, Extension, Router};
use tower::ServiceBuilder;
use tower_http::{
	cors::{Any, CorsLayer},
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	services::ServeDir,
	trace::TraceLayer,
};

use crate::{
	config::{Config, DatabaseConfig},
	media::Media,
	polish::{ChatCompletions, CompletionProvider},
	store::{memory::MemoryStore, mongo::MongoStore, Store},
};

pub type Database = Arc<dyn Store>;
pub type Provider = Arc<dyn CompletionProvider>;
pub type AppState = State;

/// The shared application state.
///
/// Handlers extract the part they need, e.g. `State<Database>`.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub provider: Provider,
	pub media: Media,
}

/// Builds the whole application: API routes, their documentation and the uploaded files.
pub fn app(state: State, max_upload_bytes: usize) -> Router {
	let mut api = OpenApi::default();
	let media_root = state.media.root().to_path_buf();

	let router = ApiRouter::new()
		.merge(route::routes())
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.with_state(state);

	[media::RAW_IMAGE_DIR, media::OPTIMIZED_IMAGE_DIR, media::VIDEO_DIR]
		.into_iter()
		.fold(router, |router, directory| {
			router.nest_service(
				&format!("/{directory}"),
				ServeDir::new(media_root.join(directory)),
			)
		})
		.layer(DefaultBodyLimit::max(max_upload_bytes))
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods([Method::GET, Method::POST])
				.allow_headers(Any),
		)
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id()),
		)
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().expect("invalid configuration");
	let _guard =
		trace::init_tracing_subscriber(config.log_level, config.otlp_endpoint.as_deref())
			.expect("failed to initialize tracing");

	let database: Database = match &config.database {
		DatabaseConfig::Memory => {
			tracing::warn!("using the in-memory store, data is lost on exit");

			match &config.admin {
				Some(seed) => tracing::info!(username = %seed.username, "seeding moderator"),
				None => tracing::warn!("no moderator configured, admin login is unavailable"),
			}

			Arc::new(MemoryStore::with_admin(config.admin.as_ref()))
		}
		DatabaseConfig::Mongo { url, database } => Arc::new(
			MongoStore::connect(url, database)
				.await
				.expect("failed to connect to database"),
		),
	};

	if config.completion.api_key.is_none() {
		tracing::warn!("no completion api key set, text polishing is unavailable");
	}

	let state = State {
		database,
		provider: Arc::new(ChatCompletions::new(config.completion.clone())),
		media: Media::new(&config.media),
	};

	let listener = tokio::net::TcpListener::bind((config.host, config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on {}:{}", config.host, config.port);

	axum::serve(listener, app(state, config.media.max_upload_bytes))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.expect("server error");
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for ctrl-c");
	}

	tracing::info!("shutting down");
}
