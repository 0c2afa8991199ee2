use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
	model::{empty_id_as_none, Id, ImageList, ModerationState, NoteDraft, TravelNote},
	route::user::model::UserProfile,
	store::JoinedNote,
};

/// A travel note as shown to clients. Images are always a flat list.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
	#[serde(rename = "_id")]
	pub id: String,
	pub title: String,
	pub content: String,
	pub img_list: Vec<String>,
	pub video: Option<String>,
	/// The owner's id.
	pub openid: String,
	/// `0` pending, `1` approved, `2` rejected.
	pub state: ModerationState,
	/// The reason of the last rejection, kept across later reviews.
	pub reject_reason: Option<String>,
	pub is_deleted: bool,
	pub publish_time: DateTime<Utc>,
}

impl From<TravelNote> for Note {
	fn from(note: TravelNote) -> Self {
		Self {
			id: note.id.to_hex(),
			img_list: note.img_list.flatten(),
			title: note.title,
			content: note.content,
			video: note.video,
			openid: note.openid.to_hex(),
			state: note.state,
			reject_reason: note.reject_reason,
			is_deleted: note.is_deleted,
			publish_time: note.publish_time.to_chrono(),
		}
	}
}

/// A note together with its owner's profile.
#[derive(Debug, Serialize, JsonSchema)]
pub struct NoteWithAuthor {
	#[serde(flatten)]
	pub note: Note,
	/// `null` when the owner no longer exists.
	#[serde(rename = "userInfo")]
	pub user_info: Option<UserProfile>,
}

impl From<JoinedNote> for NoteWithAuthor {
	fn from(joined: JoinedNote) -> Self {
		Self {
			note: joined.note.into(),
			user_info: joined.author.map(Into::into),
		}
	}
}

/// A note in its owner's own listing.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnNote {
	pub id: String,
	pub state: ModerationState,
	pub title: String,
	pub reject_reason: Option<String>,
	pub content: String,
	pub is_deleted: bool,
	pub publish_time: DateTime<Utc>,
	pub img_list: Vec<String>,
}

impl From<TravelNote> for OwnNote {
	fn from(note: TravelNote) -> Self {
		Self {
			id: note.id.to_hex(),
			state: note.state,
			img_list: note.img_list.flatten(),
			title: note.title,
			reject_reason: note.reject_reason,
			content: note.content,
			is_deleted: note.is_deleted,
			publish_time: note.publish_time.to_chrono(),
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishInput {
	/// The note to update. Absent or empty to create a new note.
	#[serde(default, deserialize_with = "empty_id_as_none")]
	pub id: Option<Id>,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub content: String,
	/// Image URLs. Nested lists are accepted and flattened when read.
	#[serde(default)]
	pub img_list: ImageList,
	/// The owner's id.
	pub openid: Id,
	#[serde(default)]
	pub video_url: Option<String>,
}

impl PublishInput {
	pub fn into_parts(self) -> (Option<Id>, NoteDraft) {
		let draft = NoteDraft {
			title: self.title,
			content: self.content,
			img_list: self.img_list,
			openid: self.openid.0,
			video: self.video_url.filter(|url| !url.is_empty()),
		};

		(self.id, draft)
	}
}

#[derive(Serialize, JsonSchema)]
pub struct Published {
	pub message: &'static str,
	pub data: Note,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct OwnerQuery {
	/// The owner's id.
	pub openid: Id,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct SearchQuery {
	/// Matched against titles and usernames, ignoring case.
	#[serde(default)]
	pub title: String,
}
