use axum::extract::{Multipart, State};
use futures::future;
use macros::route;

use crate::{extract::Json, media::Media, openapi::tag};

use super::{model, Error, RouteError};

/// The most images accepted by one upload.
pub const MAX_IMAGES: usize = 6;

const IMAGE_FIELD: &str = "file";
const VIDEO_FIELD: &str = "video";

/// Upload images
/// Stores up to six images sent in `file` fields, each resized and converted to WebP.
/// Returns the URLs of the converted images, in the order they were sent.
#[route(tag = tag::MEDIA)]
pub async fn upload_img(
	State(media): State<Media>,
	mut multipart: Multipart,
) -> Result<Json<Vec<String>>, RouteError> {
	let mut files = Vec::new();

	while let Some(field) = multipart.next_field().await.map_err(Error::from)? {
		if field.name() != Some(IMAGE_FIELD) {
			continue;
		}

		if files.len() == MAX_IMAGES {
			return Err(Error::TooManyImages.into());
		}

		let name = field.file_name().unwrap_or_default().to_owned();
		let bytes = field.bytes().await.map_err(Error::from)?;

		files.push((name, bytes));
	}

	let media = &media;
	let urls = future::try_join_all(
		files
			.into_iter()
			.map(|(name, bytes)| async move { media.store_image(&name, bytes).await }),
	)
	.await
	.map_err(Error::from)?;

	Ok(Json(urls))
}

/// Upload video
/// Stores the video sent in the `video` field as is.
#[route(tag = tag::MEDIA)]
pub async fn upload_video(
	State(media): State<Media>,
	mut multipart: Multipart,
) -> Result<Json<model::VideoUploaded>, RouteError> {
	while let Some(field) = multipart.next_field().await.map_err(Error::from)? {
		if field.name() != Some(VIDEO_FIELD) {
			continue;
		}

		let name = field.file_name().unwrap_or_default().to_owned();
		let bytes = field.bytes().await.map_err(Error::from)?;
		let path = media.store_video(&name, bytes).await.map_err(Error::from)?;

		return Ok(Json(model::VideoUploaded {
			message: "Video uploaded successfully",
			path,
		}));
	}

	Err(Error::MissingVideo.into())
}
