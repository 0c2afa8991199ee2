use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use crate::{model::Id, store::Page};

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn one() -> u64 {
	1
}

#[inline]
fn ten() -> u64 {
	10
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	#[validate(range(min = 1))]
	#[serde(default = "one")]
	pub page: u64,
	/// The number of items to return per page.
	#[validate(range(min = 1))]
	#[serde(default = "ten")]
	pub size: u64,
}

impl Paginate {
	pub fn offset(&self) -> u64 {
		self.page.saturating_sub(1).saturating_mul(self.size)
	}

	pub fn limit(&self) -> u64 {
		self.size
	}
}

impl From<&Paginate> for Page {
	fn from(paginate: &Paginate) -> Self {
		Self {
			offset: paginate.offset(),
			limit: paginate.limit(),
		}
	}
}

/// A note id, sent as `_id`.
#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	#[serde(rename = "_id")]
	pub id: Id,
}
