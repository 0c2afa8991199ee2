use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, model::Id, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown note {0}")]
	UnknownNote(Id),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/getTravelNotes", get_with(get_travel_notes, get_travel_notes_docs))
		.api_route(
			"/getTravelNoteDetail",
			get_with(get_travel_note_detail, get_travel_note_detail_docs),
		)
		.api_route(
			"/publishTravelNote",
			post_with(publish_travel_note, publish_travel_note_docs),
		)
		.api_route("/getMyPublish", get_with(get_my_publish, get_my_publish_docs))
		.api_route(
			"/searchTravelNotes",
			get_with(search_travel_notes, search_travel_notes_docs),
		)
		.api_route(
			"/deleteTravelNote",
			post_with(delete_travel_note, delete_travel_note_docs),
		)
		.api_route(
			"/restoreTravelNote",
			post_with(restore_travel_note, restore_travel_note_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownNote(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::UnknownNote(note) => error::Message::new("unknown_note")
				.detail("note", note.to_string())
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_publish_creates_pending_note() {
		let app = app();
		let openid = register(&app, "mika", "pw").await;

		let response = app
			.post("/publishTravelNote")
			.json(&json!({
				"id": "",
				"title": "Kyoto in spring",
				"content": "Cherry blossoms everywhere.",
				"imgList": [["http://a/1.webp"], "http://a/2.webp"],
				"openid": openid,
				"videoUrl": "",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();
		assert_eq!(body["message"], "Success");
		assert_eq!(body["data"]["state"], 0);
		assert_eq!(body["data"]["isDeleted"], false);
		assert_eq!(body["data"]["imgList"], json!(["http://a/1.webp", "http://a/2.webp"]));
		assert!(body["data"]["video"].is_null());
	}

	#[tokio::test]
	async fn test_republish_resets_state() {
		let app = app();
		let openid = register(&app, "mika", "pw").await;
		let id = publish(&app, &openid, "Kyoto").await;

		review(&app, &id, json!({ "state": 2, "rejectReason": "blurry photos" })).await;

		let response = app
			.post("/publishTravelNote")
			.json(&json!({
				"id": id,
				"title": "Kyoto, take two",
				"content": "Sharper photos.",
				"imgList": [],
				"openid": openid,
			}))
			.await;

		let body = response.json::<Value>();
		assert_eq!(body["data"]["_id"], id.as_str());
		assert_eq!(body["data"]["state"], 0);
		assert_eq!(body["data"]["title"], "Kyoto, take two");
		assert_eq!(body["data"]["rejectReason"], "blurry photos");
	}

	#[tokio::test]
	async fn test_republish_unknown_note() {
		let app = app();
		let openid = register(&app, "mika", "pw").await;

		let response = app
			.post("/publishTravelNote")
			.json(&json!({
				"id": UNKNOWN_ID,
				"title": "Ghost",
				"content": "",
				"imgList": [],
				"openid": openid,
			}))
			.await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(response.json::<Value>()["errors"][0]["content"], "unknown_note");
	}

	#[tokio::test]
	async fn test_public_listing_only_shows_approved_notes() {
		let app = app();
		let openid = register(&app, "mika", "pw").await;

		let approved = publish(&app, &openid, "Approved").await;
		publish(&app, &openid, "Pending").await;
		review(&app, &approved, json!({ "state": 1 })).await;

		let notes = app.get("/getTravelNotes").await.json::<Value>();
		let notes = notes.as_array().unwrap();

		assert_eq!(notes.len(), 1);
		assert_eq!(notes[0]["_id"], approved.as_str());
		assert_eq!(notes[0]["userInfo"]["username"], "mika");
		assert!(notes[0]["userInfo"].get("password").is_none());
	}

	#[tokio::test]
	async fn test_deleted_notes_are_hidden_everywhere() {
		let app = app();
		let openid = register(&app, "mika", "pw").await;
		let id = publish(&app, &openid, "Lisbon").await;
		review(&app, &id, json!({ "state": 1 })).await;

		let response = app.post("/deleteTravelNote").json(&json!({ "_id": id })).await;
		assert_eq!(response.json::<Value>(), json!("success"));

		let listing = app.get("/getTravelNotes").await.json::<Value>();
		assert_eq!(listing, json!([]));

		let own = app
			.get("/getMyPublish")
			.add_query_param("openid", &openid)
			.await
			.json::<Value>();
		assert_eq!(own, json!([]));

		let search = app
			.get("/searchTravelNotes")
			.add_query_param("title", "lisbon")
			.await
			.json::<Value>();
		assert_eq!(search, json!([]));

		app.post("/restoreTravelNote").json(&json!({ "_id": id })).await;

		let listing = app.get("/getTravelNotes").await.json::<Value>();
		assert_eq!(listing.as_array().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_delete_unknown_note() {
		let app = app();

		let response = app
			.post("/deleteTravelNote")
			.json(&json!({ "_id": UNKNOWN_ID }))
			.await;

		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_own_listing_includes_every_state() {
		let app = app();
		let openid = register(&app, "mika", "pw").await;
		let other = register(&app, "noa", "pw").await;

		let rejected = publish(&app, &openid, "Rejected").await;
		publish(&app, &openid, "Pending").await;
		publish(&app, &other, "Not mine").await;
		review(&app, &rejected, json!({ "state": 2, "rejectReason": "off topic" })).await;

		let notes = app
			.get("/getMyPublish")
			.add_query_param("openid", &openid)
			.await
			.json::<Value>();
		let notes = notes.as_array().unwrap();

		assert_eq!(notes.len(), 2);

		let rejected = notes
			.iter()
			.find(|note| note["id"] == rejected.as_str())
			.unwrap();

		assert_eq!(rejected["state"], 2);
		assert_eq!(rejected["rejectReason"], "off topic");
		assert!(rejected.get("openid").is_none());
	}

	#[tokio::test]
	async fn test_detail_ignores_visibility() {
		let app = app();
		let openid = register(&app, "mika", "pw").await;
		let id = publish(&app, &openid, "Draft").await;

		let response = app
			.get("/getTravelNoteDetail")
			.add_query_param("_id", &id)
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["userInfo"]["username"], "mika");

		let response = app
			.get("/getTravelNoteDetail")
			.add_query_param("_id", UNKNOWN_ID)
			.await;

		assert_eq!(response.status_code(), 404);

		let response = app
			.get("/getTravelNoteDetail")
			.add_query_param("_id", "not-an-id")
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_search_matches_title_and_username() {
		let app = app();
		let mika = register(&app, "Mika", "pw").await;
		let noa = register(&app, "noa", "pw").await;

		let kyoto = publish(&app, &mika, "Kyoto temples").await;
		let porto = publish(&app, &noa, "Porto (again)").await;
		publish(&app, &noa, "Kyoto pending").await;
		review(&app, &kyoto, json!({ "state": 1 })).await;
		review(&app, &porto, json!({ "state": 1 })).await;

		let titles = |notes: Value| {
			notes
				.as_array()
				.unwrap()
				.iter()
				.map(|note| note["title"].as_str().unwrap().to_owned())
				.collect::<Vec<_>>()
		};

		let found = app
			.get("/searchTravelNotes")
			.add_query_param("title", "KYOTO")
			.await
			.json::<Value>();
		assert_eq!(titles(found), vec!["Kyoto temples"]);

		let found = app
			.get("/searchTravelNotes")
			.add_query_param("title", "mik")
			.await
			.json::<Value>();
		assert_eq!(titles(found), vec!["Kyoto temples"]);

		// Regex metacharacters are matched literally.
		let found = app
			.get("/searchTravelNotes")
			.add_query_param("title", "(again)")
			.await
			.json::<Value>();
		assert_eq!(titles(found), vec!["Porto (again)"]);
	}
}
