//! Storage of uploaded images and videos on local disk.
//!
//! Files land under the media root, which is also served as static assets:
//! - `file/` holds images as uploaded;
//! - `optimized/` holds their resized WebP versions;
//! - `videos/` holds videos as uploaded.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use image::{imageops::FilterType, DynamicImage};
use uuid::Uuid;

use crate::config::MediaConfig;

/// Directory of images as they were uploaded.
pub const RAW_IMAGE_DIR: &str = "file";
/// Directory of converted images.
pub const OPTIMIZED_IMAGE_DIR: &str = "optimized";
/// Directory of uploaded videos.
pub const VIDEO_DIR: &str = "videos";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("image error: {0}")]
	Image(#[from] image::ImageError),
	#[error("failed to encode webp: {0}")]
	Encode(String),
	#[error("conversion task failed: {0}")]
	Task(#[from] tokio::task::JoinError),
}

/// Builds a collision-resistant file name, keeping the original extension.
pub fn unique_name(original: &str) -> String {
	let id = Uuid::new_v4();
	let extension = Path::new(original)
		.extension()
		.and_then(|extension| extension.to_str())
		.filter(|extension| {
			!extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric())
		});

	match extension {
		Some(extension) => format!("{id}.{}", extension.to_ascii_lowercase()),
		None => id.to_string(),
	}
}

/// Decodes an image, shrinks it to at most `max_width` pixels wide
/// (keeping its aspect ratio) and re-encodes it as lossy WebP.
pub fn convert(buffer: &[u8], max_width: u32, quality: f32) -> Result<Vec<u8>, MediaError> {
	let image = image::load_from_memory(buffer)?;

	let image = if image.width() > max_width {
		image.resize(max_width, u32::MAX, FilterType::Lanczos3)
	} else {
		image
	};

	// The encoder only accepts 8-bit RGB(A).
	let image = DynamicImage::ImageRgba8(image.to_rgba8());
	let encoder = webp::Encoder::from_image(&image)
		.map_err(|error| MediaError::Encode(error.to_owned()))?;

	Ok(encoder.encode(quality).to_vec())
}

/// Writes uploads to disk and hands out their public URLs.
#[derive(Clone, Debug)]
pub struct Media {
	root: PathBuf,
	public_url: String,
	max_width: u32,
	quality: f32,
}

impl Media {
	pub fn new(config: &MediaConfig) -> Self {
		Self {
			root: config.root.clone(),
			public_url: config.public_url.clone(),
			max_width: config.image_max_width,
			quality: config.image_quality,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn url(&self, directory: &str, name: &str) -> String {
		format!("{}/{directory}/{name}", self.public_url)
	}

	async fn write(&self, directory: &str, name: &str, bytes: &[u8]) -> Result<(), MediaError> {
		let directory = self.root.join(directory);

		tokio::fs::create_dir_all(&directory).await?;
		tokio::fs::write(directory.join(name), bytes).await?;

		Ok(())
	}

	/// Stores an uploaded image and its converted version, returning the
	/// URL of the converted file.
	#[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
	pub async fn store_image(&self, original: &str, bytes: Bytes) -> Result<String, MediaError> {
		let name = unique_name(original);
		self.write(RAW_IMAGE_DIR, &name, &bytes).await?;

		let (max_width, quality) = (self.max_width, self.quality);
		let converted =
			tokio::task::spawn_blocking(move || convert(&bytes, max_width, quality)).await??;

		let name = format!("{name}.webp");
		self.write(OPTIMIZED_IMAGE_DIR, &name, &converted).await?;

		tracing::debug!(%name, "stored image");
		Ok(self.url(OPTIMIZED_IMAGE_DIR, &name))
	}

	/// Stores an uploaded video verbatim, returning its URL.
	#[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
	pub async fn store_video(&self, original: &str, bytes: Bytes) -> Result<String, MediaError> {
		let name = unique_name(original);
		self.write(VIDEO_DIR, &name, &bytes).await?;

		tracing::debug!(%name, "stored video");
		Ok(self.url(VIDEO_DIR, &name))
	}
}
