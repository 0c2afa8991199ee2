use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct PolishInput {
	/// The text to polish.
	#[validate(length(min = 1))]
	#[serde(default)]
	pub text: String,
	/// The style to polish in, `travel diary` by default.
	#[serde(default)]
	pub style: Option<String>,
}
