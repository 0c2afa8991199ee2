//! Rewriting of note text by an LLM, relayed to the client as it streams in.

mod provider;

use futures::{stream::BoxStream, Stream, StreamExt};
use schemars::JsonSchema;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use provider::{ChatCompletions, CompletionProvider};

/// The style used when the client does not ask for one.
pub const DEFAULT_STYLE: &str = "travel diary";

/// Events buffered between the relay task and the response.
const RELAY_BUFFER: usize = 16;

/// Tokens produced by a provider, in order.
pub type TokenStream = BoxStream<'static, Result<String, PolishError>>;

#[derive(Debug, thiserror::Error)]
pub enum PolishError {
	#[error("no completion provider is configured")]
	NotConfigured,
	#[error("request to the provider failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("provider stream failed: {0}")]
	Stream(#[from] eventsource_stream::EventStreamError<reqwest::Error>),
	#[error("malformed provider chunk: {0}")]
	Malformed(#[from] serde_json::Error),
	#[error("provider error: {0}")]
	Provider(String),
}

/// What is sent to the provider: an instruction and the text to rewrite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolishRequest {
	pub instruction: String,
	pub text: String,
}

impl PolishRequest {
	pub fn new(text: String, style: Option<&str>) -> Self {
		let style = style
			.map(str::trim)
			.filter(|style| !style.is_empty())
			.unwrap_or(DEFAULT_STYLE);

		Self {
			instruction: format!(
				"You are a professional editor. Polish the following text in a {style} style \
				 while keeping its original meaning. Reply with the polished text only, \
				 without any explanation or prefix."
			),
			text,
		}
	}
}

/// One server-sent event of the relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PolishEvent {
	/// The submitted text, always first.
	Original { content: String },
	Chunk { content: String },
	Done,
	/// A mid-stream failure. Nothing follows it.
	Error { message: String },
}

impl PolishEvent {
	fn is_last(&self) -> bool {
		matches!(self, Self::Done | Self::Error { .. })
	}
}

/// Relays `tokens` as [`PolishEvent`]s from a background task.
///
/// The returned stream owns the task's cancellation guard: dropping it
/// (the client went away) stops the task, which drops the upstream stream.
pub fn relay(original: String, tokens: TokenStream) -> impl Stream<Item = PolishEvent> + Send {
	let cancel = CancellationToken::new();
	let (sender, receiver) = mpsc::channel(RELAY_BUFFER);

	tokio::spawn(forward(original, tokens, sender, cancel.clone()));

	futures::stream::unfold(
		(receiver, cancel.drop_guard()),
		|(mut receiver, guard)| async move {
			let event = receiver.recv().await?;
			Some((event, (receiver, guard)))
		},
	)
}

async fn forward(
	original: String,
	mut tokens: TokenStream,
	sender: mpsc::Sender<PolishEvent>,
	cancel: CancellationToken,
) {
	if sender
		.send(PolishEvent::Original { content: original })
		.await
		.is_err()
	{
		return;
	}

	loop {
		let next = tokio::select! {
			() = cancel.cancelled() => {
				tracing::debug!("client disconnected, closing provider stream");
				return;
			}
			next = tokens.next() => next,
		};

		let event = match next {
			Some(Ok(content)) if content.is_empty() => continue,
			Some(Ok(content)) => PolishEvent::Chunk { content },
			Some(Err(error)) => {
				tracing::warn!(%error, "provider stream failed");
				PolishEvent::Error {
					message: error.to_string(),
				}
			}
			None => PolishEvent::Done,
		};

		let last = event.is_last();

		if sender.send(event).await.is_err() || last {
			return;
		}
	}
}

#[cfg(test)]
mod test {
	use std::time::Duration;

	use futures::stream;
	use tokio::sync::oneshot;

	use super::*;

	fn tokens(items: Vec<Result<&'static str, PolishError>>) -> TokenStream {
		stream::iter(items.into_iter().map(|item| item.map(str::to_owned))).boxed()
	}

	#[test]
	fn test_default_style() {
		let request = PolishRequest::new("hello".into(), None);
		assert!(request.instruction.contains("travel diary"));

		let request = PolishRequest::new("hello".into(), Some("  "));
		assert!(request.instruction.contains("travel diary"));

		let request = PolishRequest::new("hello".into(), Some("poem"));
		assert!(request.instruction.contains("poem style"));
		assert_eq!(request.text, "hello");
	}

	#[test]
	fn test_event_shape() {
		assert_eq!(
			serde_json::to_value(PolishEvent::Chunk {
				content: "hi".into()
			})
			.unwrap(),
			serde_json::json!({ "type": "chunk", "content": "hi" })
		);
		assert_eq!(
			serde_json::to_value(PolishEvent::Done).unwrap(),
			serde_json::json!({ "type": "done" })
		);
	}

	#[tokio::test]
	async fn test_relay_order() {
		let events = relay("raw".into(), tokens(vec![Ok("A"), Ok(""), Ok("B")]))
			.collect::<Vec<_>>()
			.await;

		assert_eq!(
			events,
			vec![
				PolishEvent::Original {
					content: "raw".into()
				},
				PolishEvent::Chunk {
					content: "A".into()
				},
				PolishEvent::Chunk {
					content: "B".into()
				},
				PolishEvent::Done,
			]
		);
	}

	#[tokio::test]
	async fn test_relay_stops_after_error() {
		let events = relay(
			"raw".into(),
			tokens(vec![
				Ok("A"),
				Err(PolishError::Provider("overloaded".into())),
				Ok("never"),
			]),
		)
		.collect::<Vec<_>>()
		.await;

		assert_eq!(events.len(), 3);
		assert_eq!(
			events[2],
			PolishEvent::Error {
				message: "provider error: overloaded".into()
			}
		);
	}

	#[tokio::test]
	async fn test_disconnect_drops_upstream() {
		struct OnDrop(Option<oneshot::Sender<()>>);

		impl Drop for OnDrop {
			fn drop(&mut self) {
				if let Some(sender) = self.0.take() {
					sender.send(()).ok();
				}
			}
		}

		let (sender, dropped) = oneshot::channel();
		let on_drop = OnDrop(Some(sender));

		let upstream = stream::once(async { Ok("A".to_owned()) })
			.chain(stream::pending())
			.map(move |item| {
				let _ = &on_drop;
				item
			})
			.boxed();

		let mut events = Box::pin(relay("raw".into(), upstream));

		assert!(matches!(events.next().await, Some(PolishEvent::Original { .. })));
		assert!(matches!(events.next().await, Some(PolishEvent::Chunk { .. })));

		drop(events);

		tokio::time::timeout(Duration::from_secs(1), dropped)
			.await
			.unwrap()
			.unwrap();
	}
}
