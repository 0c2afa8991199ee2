use std::sync::Arc;

use aide::{
	axum::{
		routing::{get, get_with},
		ApiRouter, IntoApiResponse,
	},
	openapi::OpenApi,
	scalar::Scalar,
};
use axum::{response::IntoResponse, Extension};

use crate::extract::Json;

pub fn routes() -> ApiRouter {
	ApiRouter::new()
		.api_route(
			"/",
			get_with(
				Scalar::new("/docs/private/api.json")
					.with_title("Travel Notes")
					.axum_handler(),
				|op| op.description("This documentation page."),
			),
		)
		.route("/private/api.json", get(serve_docs))
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	Json(api.as_ref()).into_response()
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_openapi_document() {
		let app = app();

		let response = app.get("/docs/private/api.json").await;
		assert_eq!(response.status_code(), 200);

		let api = response.json::<Value>();
		assert_eq!(api["info"]["title"], "Travel Notes API");
		assert!(api["paths"].get("/publishTravelNote").is_some());
		assert!(api["paths"].get("/admin/getTravelNotes").is_some());
		assert!(api["paths"].get("/uploadImg").is_some());

		let polish = &api["paths"]["/polishText"]["post"];
		assert!(polish["requestBody"]["content"]["application/json"].is_object());
		assert!(polish["responses"]["200"]["content"]["text/event-stream"]["schema"].is_object());

		let response = app.get("/docs").await;
		assert_eq!(response.status_code(), 200);
	}
}
