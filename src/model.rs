use std::{fmt, str::FromStr};

pub use mongodb::bson::{oid::ObjectId, DateTime};

use schemars::{gen::SchemaGenerator, schema::Schema, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize};

/// A registered user, as stored in the `users` collection.
///
/// The password is kept in plain text and compared by equality.
/// This is not a hardened login and should not be used as a model for one.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct User {
	#[serde(rename = "_id")]
	pub id: ObjectId,
	pub username: String,
	pub password: String,
	#[serde(default)]
	pub avatar: Option<String>,
	#[serde(default)]
	pub nickname: Option<String>,
	/// The registration date, as sent by the client.
	#[serde(default)]
	pub date: Option<String>,
}

/// A moderator account, as stored in the `admins` collection.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Admin {
	#[serde(rename = "_id")]
	pub id: ObjectId,
	pub username: String,
	#[serde(default)]
	pub password: String,
}

/// The moderation state of a travel note, persisted as `0`, `1` or `2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ModerationState {
	Pending,
	Approved,
	Rejected,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown moderation state {0}")]
pub struct UnknownState(pub i32);

impl From<ModerationState> for i32 {
	fn from(state: ModerationState) -> Self {
		match state {
			ModerationState::Pending => 0,
			ModerationState::Approved => 1,
			ModerationState::Rejected => 2,
		}
	}
}

impl TryFrom<i32> for ModerationState {
	type Error = UnknownState;

	fn try_from(value: i32) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(Self::Pending),
			1 => Ok(Self::Approved),
			2 => Ok(Self::Rejected),
			other => Err(UnknownState(other)),
		}
	}
}

impl JsonSchema for ModerationState {
	fn schema_name() -> String {
		"ModerationState".into()
	}

	fn json_schema(gen: &mut SchemaGenerator) -> Schema {
		i32::json_schema(gen)
	}
}

/// A moderator's verdict on a note.
///
/// A rejection always carries its reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Review {
	Requeue,
	Approve,
	Reject(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
	#[error(transparent)]
	UnknownState(#[from] UnknownState),
	#[error("a rejection needs a reason")]
	MissingRejectReason,
}

impl Review {
	/// Builds a verdict from the wire representation (`state` + optional `rejectReason`).
	pub fn from_parts(state: i32, reason: Option<String>) -> Result<Self, ReviewError> {
		Ok(match ModerationState::try_from(state)? {
			ModerationState::Pending => Self::Requeue,
			ModerationState::Approved => Self::Approve,
			ModerationState::Rejected => match reason {
				Some(reason) if !reason.trim().is_empty() => Self::Reject(reason),
				_ => return Err(ReviewError::MissingRejectReason),
			},
		})
	}

	pub fn state(&self) -> ModerationState {
		match self {
			Self::Requeue => ModerationState::Pending,
			Self::Approve => ModerationState::Approved,
			Self::Reject(..) => ModerationState::Rejected,
		}
	}
}

/// One entry of an image list. Clients sometimes send nested arrays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ImageEntry {
	Url(String),
	Nested(Vec<ImageEntry>),
}

/// The image list of a note, stored as it was received.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ImageList(pub Vec<ImageEntry>);

impl ImageList {
	/// Flattens arbitrarily nested entries into a flat list of URLs, in order.
	pub fn flatten(&self) -> Vec<String> {
		fn walk(entries: &[ImageEntry], out: &mut Vec<String>) {
			for entry in entries {
				match entry {
					ImageEntry::Url(url) => out.push(url.clone()),
					ImageEntry::Nested(nested) => walk(nested, out),
				}
			}
		}

		let mut out = Vec::new();
		walk(&self.0, &mut out);
		out
	}
}

/// The fields an owner submits when publishing a note.
#[derive(Clone, Debug)]
pub struct NoteDraft {
	pub title: String,
	pub content: String,
	pub img_list: ImageList,
	pub openid: ObjectId,
	pub video: Option<String>,
}

/// A travel note, as stored in the `travelnotes` collection.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelNote {
	#[serde(rename = "_id")]
	pub id: ObjectId,
	pub title: String,
	pub content: String,
	#[serde(default)]
	pub img_list: ImageList,
	#[serde(default)]
	pub video: Option<String>,
	/// The owning user's id.
	pub openid: ObjectId,
	pub state: ModerationState,
	#[serde(default)]
	pub reject_reason: Option<String>,
	#[serde(default)]
	pub is_deleted: bool,
	pub publish_time: DateTime,
}

impl TravelNote {
	/// Creates a new note waiting for review.
	pub fn submit(draft: NoteDraft) -> Self {
		Self {
			id: ObjectId::new(),
			title: draft.title,
			content: draft.content,
			img_list: draft.img_list,
			video: draft.video,
			openid: draft.openid,
			state: ModerationState::Pending,
			reject_reason: None,
			is_deleted: false,
			publish_time: DateTime::now(),
		}
	}

	/// Replaces the owner-editable fields and sends the note back to review.
	///
	/// The last rejection reason is kept.
	pub fn resubmit(&mut self, draft: NoteDraft) {
		self.title = draft.title;
		self.content = draft.content;
		self.img_list = draft.img_list;
		self.video = draft.video;
		self.openid = draft.openid;
		self.state = ModerationState::Pending;
	}

	/// Applies a verdict. Only a rejection touches the stored reason.
	pub fn review(&mut self, review: Review) {
		self.state = review.state();

		if let Review::Reject(reason) = review {
			self.reject_reason = Some(reason);
		}
	}

	/// Whether the note shows up in public listings and search.
	pub fn is_visible(&self) -> bool {
		self.state == ModerationState::Approved && !self.is_deleted
	}
}

/// A document id received from a client, as a 24 character hex string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Id(pub ObjectId);

impl TryFrom<String> for Id {
	type Error = mongodb::bson::oid::Error;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl FromStr for Id {
	type Err = mongodb::bson::oid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ObjectId::parse_str(s).map(Self)
	}
}

impl fmt::Display for Id {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl JsonSchema for Id {
	fn schema_name() -> String {
		"Id".into()
	}

	fn json_schema(gen: &mut SchemaGenerator) -> Schema {
		String::json_schema(gen)
	}
}

/// Deserializes an optional id, treating an empty string as absent.
pub fn empty_id_as_none<'de, D>(deserializer: D) -> Result<Option<Id>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<String>::deserialize(deserializer)? {
		Some(value) if !value.is_empty() => value.parse().map(Some).map_err(serde::de::Error::custom),
		_ => Ok(None),
	}
}
