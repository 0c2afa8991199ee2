//! Persistence for users, moderators and travel notes.
//!
//! Handlers only see the [`Store`] trait. [`mongo::MongoStore`] backs production
//! deployments, [`memory::MemoryStore`] is used for local runs and tests.

pub mod memory;
pub mod mongo;

use crate::model::{Admin, ModerationState, NoteDraft, ObjectId, Review, TravelNote, User};

/// Labels the moderation console sends to filter by state.
const PENDING_LABEL: &str = "待审核";
const APPROVED_LABEL: &str = "已通过";
const REJECTED_LABEL: &str = "已驳回";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] mongodb::error::Error),
	#[error("failed to encode document: {0}")]
	Encode(#[from] mongodb::bson::ser::Error),
	#[error("failed to decode document: {0}")]
	Decode(#[from] mongodb::bson::de::Error),
	#[error("username already taken")]
	UsernameTaken,
}

/// A note together with its owner's profile.
///
/// `author` is `None` when the owner no longer resolves.
#[derive(Clone, Debug)]
pub struct JoinedNote {
	pub note: TravelNote,
	pub author: Option<User>,
}

/// How the moderation console narrows its listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoteSearch {
	All,
	State(ModerationState),
	/// Case-insensitive substring of the title or the owner's username.
	Text(String),
}

impl NoteSearch {
	pub fn parse(term: &str) -> Self {
		match term.trim() {
			"" => Self::All,
			PENDING_LABEL => Self::State(ModerationState::Pending),
			APPROVED_LABEL => Self::State(ModerationState::Approved),
			REJECTED_LABEL => Self::State(ModerationState::Rejected),
			text => Self::Text(text.to_owned()),
		}
	}

	pub fn matches(&self, note: &TravelNote, author: Option<&User>) -> bool {
		match self {
			Self::All => true,
			Self::State(state) => note.state == *state,
			Self::Text(text) => text_matches(text, note, author),
		}
	}
}

/// Case-insensitive substring match on the title or the owner's username.
pub fn text_matches(text: &str, note: &TravelNote, author: Option<&User>) -> bool {
	let needle = text.to_lowercase();

	note.title.to_lowercase().contains(&needle)
		|| author.is_some_and(|author| author.username.to_lowercase().contains(&needle))
}

/// A window over a sorted listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
	pub offset: u64,
	pub limit: u64,
}

#[axum::async_trait]
pub trait Store: Send + Sync {
	async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError>;

	/// Inserts a user, failing with [`StoreError::UsernameTaken`] on a duplicate username.
	async fn create_user(&self, user: User) -> Result<User, StoreError>;

	async fn update_avatar(&self, id: ObjectId, avatar: String)
		-> Result<Option<User>, StoreError>;

	async fn find_admin(&self, username: &str) -> Result<Option<Admin>, StoreError>;

	async fn create_note(&self, draft: NoteDraft) -> Result<TravelNote, StoreError>;

	/// Replaces an existing note's fields and sends it back to review.
	///
	/// Returns `None` when the id does not resolve; nothing is created.
	async fn resubmit_note(
		&self,
		id: ObjectId,
		draft: NoteDraft,
	) -> Result<Option<TravelNote>, StoreError>;

	async fn review_note(&self, id: ObjectId, review: Review)
		-> Result<Option<TravelNote>, StoreError>;

	/// Sets the soft-delete flag, returning whether the note exists.
	async fn set_deleted(&self, id: ObjectId, deleted: bool) -> Result<bool, StoreError>;

	/// A single note with its owner, regardless of visibility.
	///
	/// Notes whose owner does not resolve are treated as missing.
	async fn note(&self, id: ObjectId) -> Result<Option<JoinedNote>, StoreError>;

	/// Approved, non-deleted notes with their owners, newest first.
	async fn visible_notes(&self) -> Result<Vec<JoinedNote>, StoreError>;

	/// Visible notes whose title or owner username contains `text`, newest first.
	async fn search_visible_notes(&self, text: &str) -> Result<Vec<JoinedNote>, StoreError>;

	/// An owner's non-deleted notes in any state, newest first.
	async fn owner_notes(&self, owner: ObjectId) -> Result<Vec<TravelNote>, StoreError>;

	/// One page of the moderation listing and the number of notes matching `search`.
	async fn moderation_page(
		&self,
		search: &NoteSearch,
		page: Page,
	) -> Result<(Vec<JoinedNote>, u64), StoreError>;
}
