use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Query},
	openapi::tag,
	route::model::IdInput,
	Database,
};

use super::{model, Error, RouteError};

pub const SUCCESS: &str = "success";

/// List notes
/// Returns every approved note that is not deleted, with its author, newest first.
#[route(tag = tag::NOTE)]
pub async fn get_travel_notes(
	State(database): State<Database>,
) -> Result<Json<Vec<model::NoteWithAuthor>>, RouteError> {
	let notes = database.visible_notes().await?;

	Ok(Json(notes.into_iter().map(Into::into).collect()))
}

/// Get note
/// Returns a single note with its author, whatever its moderation state.
#[route(tag = tag::NOTE)]
pub async fn get_travel_note_detail(
	State(database): State<Database>,
	Query(input): Query<IdInput>,
) -> Result<Json<model::NoteWithAuthor>, RouteError> {
	let note = database
		.note(input.id.0)
		.await?
		.ok_or(Error::UnknownNote(input.id))?;

	Ok(Json(note.into()))
}

/// Publish note
/// Creates a note, or replaces an existing one when an id is given.
/// Either way the note waits for review.
#[route(tag = tag::NOTE)]
pub async fn publish_travel_note(
	State(database): State<Database>,
	Json(input): Json<model::PublishInput>,
) -> Result<Json<model::Published>, RouteError> {
	let note = match input.into_parts() {
		(Some(id), draft) => database
			.resubmit_note(id.0, draft)
			.await?
			.ok_or(Error::UnknownNote(id))?,
		(None, draft) => database.create_note(draft).await?,
	};

	tracing::info!(note = %note.id, "note submitted for review");

	Ok(Json(model::Published {
		message: "Success",
		data: note.into(),
	}))
}

/// List own notes
/// Returns the notes of a user in every moderation state, except deleted ones, newest first.
#[route(tag = tag::NOTE)]
pub async fn get_my_publish(
	State(database): State<Database>,
	Query(input): Query<model::OwnerQuery>,
) -> Result<Json<Vec<model::OwnNote>>, RouteError> {
	let notes = database.owner_notes(input.openid.0).await?;

	Ok(Json(notes.into_iter().map(Into::into).collect()))
}

/// Search notes
/// Returns the public notes whose title or author username contains the text, newest first.
#[route(tag = tag::NOTE)]
pub async fn search_travel_notes(
	State(database): State<Database>,
	Query(input): Query<model::SearchQuery>,
) -> Result<Json<Vec<model::NoteWithAuthor>>, RouteError> {
	let notes = database.search_visible_notes(input.title.trim()).await?;

	Ok(Json(notes.into_iter().map(Into::into).collect()))
}

/// Delete note
/// Hides a note from every listing. It can be restored later.
#[route(tag = tag::NOTE)]
pub async fn delete_travel_note(
	State(database): State<Database>,
	Json(input): Json<IdInput>,
) -> Result<Json<&'static str>, RouteError> {
	if !database.set_deleted(input.id.0, true).await? {
		return Err(Error::UnknownNote(input.id).into());
	}

	Ok(Json(SUCCESS))
}

/// Restore note
/// Undoes the deletion of a note.
#[route(tag = tag::NOTE)]
pub async fn restore_travel_note(
	State(database): State<Database>,
	Json(input): Json<IdInput>,
) -> Result<Json<&'static str>, RouteError> {
	if !database.set_deleted(input.id.0, false).await? {
		return Err(Error::UnknownNote(input.id).into());
	}

	Ok(Json(SUCCESS))
}
