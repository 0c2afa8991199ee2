use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
	model::{Admin, Id},
	route::{model::Paginate, note::model::NoteWithAuthor},
};

/// A moderator account as shown to clients.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AdminProfile {
	#[serde(rename = "_id")]
	pub id: String,
	pub username: String,
}

impl From<Admin> for AdminProfile {
	fn from(admin: Admin) -> Self {
		Self {
			id: admin.id.to_hex(),
			username: admin.username,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	pub username: String,
	pub password: String,
}

/// The moderator on success, otherwise `"pwdError"`.
#[derive(Serialize, JsonSchema)]
#[serde(untagged)]
pub enum LoginOutput {
	Admin(AdminProfile),
	Failure(&'static str),
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
	#[serde(rename = "_id")]
	pub id: Id,
	/// `0` back to pending, `1` approve, `2` reject.
	pub state: i32,
	/// Required when rejecting.
	#[serde(default)]
	pub reject_reason: Option<String>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ListInput {
	#[serde(flatten)]
	#[validate(nested)]
	pub paginate: Paginate,
	/// `待审核`, `已通过` or `已驳回` to filter by state, any other text to match
	/// titles and usernames. Empty matches every note.
	#[serde(default)]
	pub search: String,
}

#[derive(Serialize, JsonSchema)]
pub struct ListOutput {
	pub result: Vec<NoteWithAuthor>,
	/// The number of notes matching the search, across all pages.
	pub total: u64,
}
