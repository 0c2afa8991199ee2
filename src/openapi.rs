use std::borrow::Cow;

use aide::{openapi::Tag, transform::TransformOpenApi};

use crate::{error, extract::Json};

pub mod tag {
	pub const NOTE: &str = "Note";
	pub const USER: &str = "User";
	pub const ADMIN: &str = "Admin";
	pub const MEDIA: &str = "Media";
	pub const POLISH: &str = "Polish";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Travel Notes API")
		.summary("Travel notes with moderation, media uploads and text polishing")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::NOTE.into(),
			description: Some("Publishing and browsing travel notes".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::USER.into(),
			description: Some("User accounts".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::ADMIN.into(),
			description: Some("Moderation console".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::MEDIA.into(),
			description: Some("Image and video uploads".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POLISH.into(),
			description: Some("Streaming text polishing".into()),
			..Default::default()
		})
		.default_response_with::<Json<error::Message>, _>(|res| {
			res.example(error::Message {
				content: "error message".into(),
				field: Some("optional field".into()),
				details: Some(Cow::Owned({
					let mut map = error::Map::new();
					map.insert("key".into(), serde_json::json!("value"));
					map
				})),
			})
		})
}
