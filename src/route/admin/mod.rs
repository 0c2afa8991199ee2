use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{
	error,
	model::{Id, ReviewError},
	AppState,
};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown note {0}")]
	UnknownNote(Id),
	#[error(transparent)]
	Review(#[from] ReviewError),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/admin/login", post_with(login, login_docs))
		.api_route(
			"/reviewTravelNote",
			post_with(review_travel_note, review_travel_note_docs),
		)
		.api_route(
			"/admin/getTravelNotes",
			post_with(get_travel_notes, get_travel_notes_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownNote(..) => StatusCode::NOT_FOUND,
			Self::Review(..) => StatusCode::BAD_REQUEST,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::UnknownNote(note) => error::Message::new("unknown_note")
				.detail("note", note.to_string())
				.into_vec(),
			Self::Review(ReviewError::UnknownState(state)) => error::Message::new("unknown_state")
				.field("state")
				.detail("state", state.0)
				.into_vec(),
			Self::Review(ReviewError::MissingRejectReason) => {
				error::Message::new("missing_reject_reason")
					.field("rejectReason")
					.into_vec()
			}
		}
	}
}
