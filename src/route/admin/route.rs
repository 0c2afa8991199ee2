use axum::extract::State;
use macros::route;

use crate::{
	extract::Json,
	model::Review,
	openapi::tag,
	store::{NoteSearch, Page},
	Database,
};

use super::{model, Error, RouteError};

pub const LOGIN_FAILED: &str = "pwdError";

/// Moderator log in
/// Checks a moderator's username and password, returning the account on success.
#[route(tag = tag::ADMIN)]
pub async fn login(
	State(database): State<Database>,
	Json(input): Json<model::LoginInput>,
) -> Result<Json<model::LoginOutput>, RouteError> {
	let output = match database.find_admin(&input.username).await? {
		Some(admin) if !admin.password.is_empty() && admin.password == input.password => {
			model::LoginOutput::Admin(admin.into())
		}
		_ => model::LoginOutput::Failure(LOGIN_FAILED),
	};

	Ok(Json(output))
}

/// Review note
/// Approves, rejects or requeues a note. A rejection needs a reason, which is kept
/// until the next rejection.
#[route(tag = tag::ADMIN)]
pub async fn review_travel_note(
	State(database): State<Database>,
	Json(input): Json<model::ReviewInput>,
) -> Result<Json<&'static str>, RouteError> {
	let review = Review::from_parts(input.state, input.reject_reason).map_err(Error::from)?;
	let state = review.state();

	database
		.review_note(input.id.0, review)
		.await?
		.ok_or(Error::UnknownNote(input.id))?;

	tracing::info!(note = %input.id, ?state, "note reviewed");

	Ok(Json("success"))
}

/// List notes for moderation
/// Returns one page of every note, deleted or not, newest first, with the number of
/// notes matching the search.
#[route(tag = tag::ADMIN)]
pub async fn get_travel_notes(
	State(database): State<Database>,
	Json(input): Json<model::ListInput>,
) -> Result<Json<model::ListOutput>, RouteError> {
	let search = NoteSearch::parse(&input.search);
	let (notes, total) = database
		.moderation_page(&search, Page::from(&input.paginate))
		.await?;

	Ok(Json(model::ListOutput {
		result: notes.into_iter().map(Into::into).collect(),
		total,
	}))
}
