use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, polish::PolishError, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Polish(#[from] PolishError),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route(
		"/polishText",
		post_with(polish_text, |op| polish_text_docs(op).with(event_stream)),
	)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::Polish(PolishError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
			Self::Polish(..) => StatusCode::BAD_GATEWAY,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::Polish(PolishError::NotConfigured) => {
				error::Message::new("polish_unavailable").into_vec()
			}
			Self::Polish(error) => error::Message::new("polish_failed")
				.detail("message", error.to_string())
				.into_vec(),
		}
	}
}
