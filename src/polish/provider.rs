use eventsource_stream::Eventsource;
use futures::{future, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use super::{PolishError, PolishRequest, TokenStream};
use crate::config::CompletionConfig;

/// Sentinel data of the last event of an OpenAI-style stream.
const DONE: &str = "[DONE]";

/// Something that can stream a completion for a [`PolishRequest`].
#[axum::async_trait]
pub trait CompletionProvider: Send + Sync {
	/// Opens the stream. Failures to connect or a non-success status are
	/// reported here, before any token is produced.
	async fn stream(&self, request: &PolishRequest) -> Result<TokenStream, PolishError>;
}

/// An OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone, Debug)]
pub struct ChatCompletions {
	client: reqwest::Client,
	config: CompletionConfig,
}

impl ChatCompletions {
	pub fn new(config: CompletionConfig) -> Self {
		Self {
			client: reqwest::Client::new(),
			config,
		}
	}
}

#[derive(Serialize)]
struct ChatRequest<'a> {
	model: &'a str,
	stream: bool,
	messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
	role: &'static str,
	content: &'a str,
}

#[derive(Deserialize)]
struct ChatChunk {
	#[serde(default)]
	choices: Vec<Choice>,
	#[serde(default)]
	error: Option<Failure>,
}

#[derive(Deserialize)]
struct Choice {
	#[serde(default)]
	delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
	#[serde(default)]
	content: Option<String>,
}

#[derive(Deserialize)]
struct Failure {
	message: String,
}

/// Extracts the token of one streamed chunk. Chunks without content yield an empty token.
fn parse_chunk(data: &str) -> Result<String, PolishError> {
	let chunk: ChatChunk = serde_json::from_str(data)?;

	if let Some(error) = chunk.error {
		return Err(PolishError::Provider(error.message));
	}

	Ok(chunk
		.choices
		.into_iter()
		.next()
		.and_then(|choice| choice.delta.content)
		.unwrap_or_default())
}

#[axum::async_trait]
impl CompletionProvider for ChatCompletions {
	#[tracing::instrument(skip_all, fields(model = %self.config.model))]
	async fn stream(&self, request: &PolishRequest) -> Result<TokenStream, PolishError> {
		let Some(api_key) = &self.config.api_key else {
			return Err(PolishError::NotConfigured);
		};

		let body = ChatRequest {
			model: &self.config.model,
			stream: true,
			messages: [
				ChatMessage {
					role: "system",
					content: &request.instruction,
				},
				ChatMessage {
					role: "user",
					content: &request.text,
				},
			],
		};

		let response = self
			.client
			.post(format!("{}/chat/completions", self.config.base_url))
			.bearer_auth(api_key)
			.json(&body)
			.send()
			.await?
			.error_for_status()?;

		tracing::debug!(status = %response.status(), "provider stream opened");

		let tokens = response
			.bytes_stream()
			.eventsource()
			.map_err(PolishError::from)
			.try_take_while(|event| future::ready(Ok(event.data.trim() != DONE)))
			.and_then(|event| future::ready(parse_chunk(&event.data)))
			.boxed();

		Ok(tokens)
	}
}
