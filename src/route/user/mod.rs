use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, model::Id, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(Id),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/toLogin", post_with(login, login_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/updateAvatar", post_with(update_avatar, update_avatar_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::UnknownUser(user) => error::Message::new("unknown_user")
				.detail("user", user.to_string())
				.into_vec(),
		}
	}
}
