use schemars::JsonSchema;
use serde::Serialize;

#[derive(Serialize, JsonSchema)]
pub struct VideoUploaded {
	pub message: &'static str,
	/// The public URL of the stored video.
	pub path: String,
}
