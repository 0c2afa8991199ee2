use aide::axum::{routing::post_with, ApiRouter};
use axum::{extract::multipart::MultipartError, http::StatusCode};

use crate::{error, media::MediaError, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("too many images, at most {} per upload", route::MAX_IMAGES)]
	TooManyImages,
	#[error("no video in the request")]
	MissingVideo,
	#[error("invalid multipart body: {0}")]
	Multipart(#[from] MultipartError),
	#[error("failed to store upload: {0}")]
	Media(#[from] MediaError),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/uploadImg", post_with(upload_img, upload_img_docs))
		.api_route("/uploadVideo", post_with(upload_video, upload_video_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::TooManyImages | Self::MissingVideo => StatusCode::BAD_REQUEST,
			Self::Multipart(error) => error.status(),
			Self::Media(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::TooManyImages => error::Message::new("too_many_images")
				.field("file")
				.detail("max", route::MAX_IMAGES)
				.into_vec(),
			Self::MissingVideo => error::Message::new("missing_video")
				.field("video")
				.into_vec(),
			Self::Multipart(error) => error::Message::new("invalid_multipart")
				.detail("message", error.body_text())
				.into_vec(),
			Self::Media(error) => error::Message::new("media_error")
				.detail("message", error.to_string())
				.into_vec(),
		}
	}
}
