use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection::QueryRejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use axum_jsonschema::JsonSchemaRejection;
use schemars::JsonSchema;
use serde::Serialize;

use crate::store::StoreError;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A stable, machine-readable description of the error.
	pub content: Cow<'a, str>,
	/// The input field the error relates to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Extra values describing the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl Message<'static> {
	pub fn new(content: impl Into<Cow<'static, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<Cow<'static, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Default::default)
			.to_mut()
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<Message<'static>>,
}

/// Describes how a route's error is presented to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn into_errors(self) -> Vec<Message<'static>>;
}

/// Errors shared by every route.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("invalid json body")]
	Json(JsonSchemaRejection),
	#[error("query error: {0}")]
	Query(#[from] QueryRejection),
	#[error("store error: {0}")]
	Store(#[from] StoreError),
}

impl AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Query(..) => StatusCode::BAD_REQUEST,
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn into_errors(self) -> Vec<Message<'static>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| {
						Message::new(error.code.to_string()).field(field.to_string())
					})
				})
				.collect(),
			Self::Query(rejection) => Message::new("invalid_query")
				.detail("message", rejection.body_text())
				.into_vec(),
			Self::Json(..) => Message::new("invalid_body").into_vec(),
			Self::Store(error) => Message::new("internal_error")
				.detail("message", error.to_string())
				.into_vec(),
		}
	}
}

impl From<JsonSchemaRejection> for AppError {
	fn from(rejection: JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

/// The error type returned by route handlers: either a route-specific
/// error `T` or an [`AppError`] shared between all routes.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<T> {
	#[error(transparent)]
	App(AppError),
	#[error(transparent)]
	Route(T),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<StoreError> for RouteError<T> {
	fn from(error: StoreError) -> Self {
		Self::App(error.into())
	}
}

impl<T> From<validator::ValidationErrors> for RouteError<T> {
	fn from(errors: validator::ValidationErrors) -> Self {
		Self::App(errors.into())
	}
}

fn error_response(status: StatusCode, errors: Vec<Message<'static>>) -> Response<Body> {
	(
		status,
		Json(ErrorResponse {
			success: false,
			errors,
		}),
	)
		.into_response()
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}

		match self {
			// The schema rejection carries its own detailed report.
			Self::Json(rejection) => rejection.into_response(),
			error => error_response(status, error.into_errors()),
		}
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "request failed");
				}

				error_response(status, error.into_errors())
			}
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = Self;
}
