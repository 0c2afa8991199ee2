use aide::{
	openapi::{MediaType, ReferenceOr, Response, SchemaObject, StatusCode},
	transform::TransformOperation,
};
use axum::{
	extract::State,
	response::{
		sse::{Event, KeepAlive, Sse},
		IntoResponse,
	},
};
use futures::StreamExt;
use macros::route;

use crate::{
	extract::Json,
	openapi::tag,
	polish::{self, PolishEvent, PolishRequest},
	Provider,
};

use super::{model, Error, RouteError};

/// Polish text
/// Polishes text with the completion provider, streaming the result as
/// server-sent events: the original text, each chunk, then `done` or `error`.
#[route(tag = tag::POLISH)]
pub async fn polish_text(
	State(provider): State<Provider>,
	Json(input): Json<model::PolishInput>,
) -> Result<axum::response::Response, RouteError> {
	let request = PolishRequest::new(input.text, input.style.as_deref());
	let tokens = provider.stream(&request).await.map_err(Error::from)?;

	let events = polish::relay(request.text, tokens).map(|event| Event::default().json_data(event));

	Ok(Sse::new(events)
		.keep_alive(KeepAlive::default())
		.into_response())
}

/// Documents the `200` response as a stream of [`PolishEvent`]s.
pub fn event_stream(mut op: TransformOperation) -> TransformOperation {
	let mut response = Response {
		description: "A stream of events, each carrying one JSON payload.".into(),
		..Default::default()
	};

	response.content.insert(
		"text/event-stream".into(),
		MediaType {
			schema: Some(SchemaObject {
				json_schema: schemars::schema_for!(PolishEvent).schema.into(),
				external_docs: None,
				example: None,
			}),
			..Default::default()
		},
	);

	op.inner_mut()
		.responses
		.get_or_insert_with(Default::default)
		.responses
		.insert(StatusCode::Code(200), ReferenceOr::Item(response));

	op
}
