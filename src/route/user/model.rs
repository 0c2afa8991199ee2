use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::{Id, User};

/// A user as shown to clients.
#[derive(Debug, Serialize, JsonSchema)]
pub struct UserProfile {
	/// The unique identifier of the user, also used as `openid`.
	#[serde(rename = "_id")]
	pub id: String,
	pub username: String,
	pub avatar: Option<String>,
	pub nickname: Option<String>,
	/// The registration date, as it was sent at registration.
	pub date: Option<String>,
}

impl From<User> for UserProfile {
	fn from(user: User) -> Self {
		Self {
			id: user.id.to_hex(),
			username: user.username,
			avatar: user.avatar,
			nickname: user.nickname,
			date: user.date,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	pub username: String,
	pub password: String,
}

/// The profile on success, otherwise `"pwdError"` or `"error"`.
#[derive(Serialize, JsonSchema)]
#[serde(untagged)]
pub enum LoginOutput {
	User(UserProfile),
	Failure(&'static str),
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
	#[validate(length(min = 1, max = 64))]
	pub username: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
	#[serde(default)]
	pub date: Option<String>,
	#[serde(default)]
	pub avatar_url: Option<String>,
	#[serde(default)]
	pub nickname: Option<String>,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvatarInput {
	/// The user's id.
	pub openid: Id,
	pub avatar_url: String,
}

#[derive(Serialize, JsonSchema)]
pub struct AvatarUpdated {
	pub message: &'static str,
	pub data: UserProfile,
}
