use axum::extract::State;
use macros::route;

use crate::{
	extract::Json,
	model::{ObjectId, User},
	openapi::tag,
	store::StoreError,
	Database,
};

use super::{model, Error, RouteError};

pub const LOGIN_WRONG_PASSWORD: &str = "pwdError";
pub const LOGIN_UNKNOWN_USER: &str = "error";
pub const REGISTERED: &str = "success";
pub const USERNAME_TAKEN: &str = "用户名不能重复";

/// Log in
/// Checks a username and password, returning the user's profile on success.
/// No session is created.
#[route(tag = tag::USER)]
pub async fn login(
	State(database): State<Database>,
	Json(input): Json<model::LoginInput>,
) -> Result<Json<model::LoginOutput>, RouteError> {
	let output = match database.find_user(&input.username).await? {
		Some(user) if user.password == input.password => model::LoginOutput::User(user.into()),
		Some(..) => model::LoginOutput::Failure(LOGIN_WRONG_PASSWORD),
		None => model::LoginOutput::Failure(LOGIN_UNKNOWN_USER),
	};

	Ok(Json(output))
}

/// Register account
/// Creates a user, answering with a message when the username is already taken.
#[route(tag = tag::USER)]
pub async fn register(
	State(database): State<Database>,
	Json(input): Json<model::RegisterInput>,
) -> Result<Json<&'static str>, RouteError> {
	if database.find_user(&input.username).await?.is_some() {
		return Ok(Json(USERNAME_TAKEN));
	}

	let user = User {
		id: ObjectId::new(),
		username: input.username,
		password: input.password,
		avatar: input.avatar_url,
		nickname: input.nickname,
		date: input.date,
	};

	match database.create_user(user).await {
		Ok(user) => {
			tracing::info!(user = %user.id, "registered user");
			Ok(Json(REGISTERED))
		}
		// Lost a race with a concurrent registration.
		Err(StoreError::UsernameTaken) => Ok(Json(USERNAME_TAKEN)),
		Err(error) => Err(error.into()),
	}
}

/// Update avatar
/// Replaces a user's avatar URL, returning the updated profile.
#[route(tag = tag::USER)]
pub async fn update_avatar(
	State(database): State<Database>,
	Json(input): Json<model::UpdateAvatarInput>,
) -> Result<Json<model::AvatarUpdated>, RouteError> {
	let user = database
		.update_avatar(input.openid.0, input.avatar_url)
		.await?
		.ok_or(Error::UnknownUser(input.openid))?;

	Ok(Json(model::AvatarUpdated {
		message: "Avatar updated successfully",
		data: user.into(),
	}))
}
