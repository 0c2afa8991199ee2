use std::cmp::Reverse;

use tokio::sync::RwLock;

use super::{text_matches, JoinedNote, NoteSearch, Page, Store, StoreError};
use crate::{
	config::AdminSeed,
	model::{Admin, NoteDraft, ObjectId, Review, TravelNote, User},
};

#[derive(Debug, Default)]
struct Collections {
	users: Vec<User>,
	admins: Vec<Admin>,
	notes: Vec<TravelNote>,
}

impl Collections {
	fn user(&self, id: ObjectId) -> Option<&User> {
		self.users.iter().find(|user| user.id == id)
	}

	fn note_mut(&mut self, id: ObjectId) -> Option<&mut TravelNote> {
		self.notes.iter_mut().find(|note| note.id == id)
	}

	/// Joins every note passing `filter` with its owner, newest first.
	fn joined<F>(&self, keep_orphans: bool, filter: F) -> Vec<JoinedNote>
	where
		F: Fn(&TravelNote, Option<&User>) -> bool,
	{
		let mut notes = self
			.notes
			.iter()
			.filter_map(|note| {
				let author = self.user(note.openid);

				if (author.is_none() && !keep_orphans) || !filter(note, author) {
					return None;
				}

				Some(JoinedNote {
					note: note.clone(),
					author: author.cloned(),
				})
			})
			.collect::<Vec<_>>();

		notes.sort_by_key(|joined| Reverse(joined.note.publish_time));
		notes
	}
}

/// An in-process store with the same semantics as the MongoDB backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
	collections: RwLock<Collections>,
}

impl MemoryStore {
	#[cfg(test)]
	pub fn new() -> Self {
		Self::default()
	}

	/// A store holding a single moderator account, or none.
	pub fn with_admin(seed: Option<&AdminSeed>) -> Self {
		let admins = seed
			.map(|seed| Admin {
				id: ObjectId::new(),
				username: seed.username.clone(),
				password: seed.password.clone(),
			})
			.into_iter()
			.collect();

		Self {
			collections: RwLock::new(Collections {
				admins,
				..Default::default()
			}),
		}
	}

	#[cfg(test)]
	pub async fn insert_admin(&self, admin: Admin) {
		self.collections.write().await.admins.push(admin);
	}

	#[cfg(test)]
	pub async fn insert_note(&self, note: TravelNote) {
		self.collections.write().await.notes.push(note);
	}
}

#[axum::async_trait]
impl Store for MemoryStore {
	async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
		let collections = self.collections.read().await;

		Ok(collections
			.users
			.iter()
			.find(|user| user.username == username)
			.cloned())
	}

	async fn create_user(&self, user: User) -> Result<User, StoreError> {
		let mut collections = self.collections.write().await;

		if collections
			.users
			.iter()
			.any(|existing| existing.username == user.username)
		{
			return Err(StoreError::UsernameTaken);
		}

		collections.users.push(user.clone());
		Ok(user)
	}

	async fn update_avatar(
		&self,
		id: ObjectId,
		avatar: String,
	) -> Result<Option<User>, StoreError> {
		let mut collections = self.collections.write().await;
		let Some(user) = collections.users.iter_mut().find(|user| user.id == id) else {
			return Ok(None);
		};

		user.avatar = Some(avatar);
		Ok(Some(user.clone()))
	}

	async fn find_admin(&self, username: &str) -> Result<Option<Admin>, StoreError> {
		let collections = self.collections.read().await;

		Ok(collections
			.admins
			.iter()
			.find(|admin| admin.username == username)
			.cloned())
	}

	async fn create_note(&self, draft: NoteDraft) -> Result<TravelNote, StoreError> {
		let note = TravelNote::submit(draft);

		self.collections.write().await.notes.push(note.clone());
		Ok(note)
	}

	async fn resubmit_note(
		&self,
		id: ObjectId,
		draft: NoteDraft,
	) -> Result<Option<TravelNote>, StoreError> {
		let mut collections = self.collections.write().await;

		Ok(collections.note_mut(id).map(|note| {
			note.resubmit(draft);
			note.clone()
		}))
	}

	async fn review_note(
		&self,
		id: ObjectId,
		review: Review,
	) -> Result<Option<TravelNote>, StoreError> {
		let mut collections = self.collections.write().await;

		Ok(collections.note_mut(id).map(|note| {
			note.review(review);
			note.clone()
		}))
	}

	async fn set_deleted(&self, id: ObjectId, deleted: bool) -> Result<bool, StoreError> {
		let mut collections = self.collections.write().await;
		let Some(note) = collections.note_mut(id) else {
			return Ok(false);
		};

		note.is_deleted = deleted;
		Ok(true)
	}

	async fn note(&self, id: ObjectId) -> Result<Option<JoinedNote>, StoreError> {
		let collections = self.collections.read().await;

		Ok(collections
			.joined(false, |note, _| note.id == id)
			.into_iter()
			.next())
	}

	async fn visible_notes(&self) -> Result<Vec<JoinedNote>, StoreError> {
		let collections = self.collections.read().await;

		Ok(collections.joined(false, |note, _| note.is_visible()))
	}

	async fn search_visible_notes(&self, text: &str) -> Result<Vec<JoinedNote>, StoreError> {
		let collections = self.collections.read().await;

		Ok(collections.joined(false, |note, author| {
			note.is_visible() && text_matches(text, note, author)
		}))
	}

	async fn owner_notes(&self, owner: ObjectId) -> Result<Vec<TravelNote>, StoreError> {
		let collections = self.collections.read().await;
		let mut notes = collections
			.notes
			.iter()
			.filter(|note| note.openid == owner && !note.is_deleted)
			.cloned()
			.collect::<Vec<_>>();

		notes.sort_by_key(|note| Reverse(note.publish_time));
		Ok(notes)
	}

	async fn moderation_page(
		&self,
		search: &NoteSearch,
		page: Page,
	) -> Result<(Vec<JoinedNote>, u64), StoreError> {
		let collections = self.collections.read().await;
		let matching = collections.joined(true, |note, author| search.matches(note, author));
		let total = matching.len() as u64;

		let notes = matching
			.into_iter()
			.skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
			.take(usize::try_from(page.limit).unwrap_or(usize::MAX))
			.collect();

		Ok((notes, total))
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::model::{DateTime, ImageList, ModerationState};

	fn user(username: &str) -> User {
		User {
			id: ObjectId::new(),
			username: username.into(),
			password: "p".into(),
			avatar: None,
			nickname: None,
			date: None,
		}
	}

	fn note(owner: ObjectId, title: &str, millis: i64, state: ModerationState) -> TravelNote {
		TravelNote {
			id: ObjectId::new(),
			title: title.into(),
			content: String::new(),
			img_list: ImageList::default(),
			video: None,
			openid: owner,
			state,
			reject_reason: None,
			is_deleted: false,
			publish_time: DateTime::from_millis(millis),
		}
	}

	#[tokio::test]
	async fn test_seeded_admin() {
		let seed = AdminSeed {
			username: "root".into(),
			password: "secret".into(),
		};

		let store = MemoryStore::with_admin(Some(&seed));
		let admin = store.find_admin("root").await.unwrap().unwrap();
		assert_eq!(admin.password, "secret");

		let store = MemoryStore::with_admin(None);
		assert!(store.find_admin("root").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_duplicate_username_is_rejected() {
		let store = MemoryStore::new();

		store.create_user(user("a")).await.unwrap();
		let result = store.create_user(user("a")).await;

		assert!(matches!(result, Err(StoreError::UsernameTaken)));
	}

	#[tokio::test]
	async fn test_moderation_page_counts_all_matches() {
		let store = MemoryStore::new();
		let alice = store.create_user(user("alice")).await.unwrap();

		for i in 0..5 {
			store
				.insert_note(note(alice.id, &format!("note {i}"), i, ModerationState::Pending))
				.await;
		}

		store
			.insert_note(note(alice.id, "approved", 10, ModerationState::Approved))
			.await;

		let (notes, total) = store
			.moderation_page(
				&NoteSearch::State(ModerationState::Pending),
				Page { offset: 2, limit: 2 },
			)
			.await
			.unwrap();

		assert_eq!(total, 5);
		assert_eq!(
			notes.iter().map(|n| n.note.title.as_str()).collect::<Vec<_>>(),
			vec!["note 2", "note 1"]
		);
	}

	#[tokio::test]
	async fn test_moderation_page_keeps_orphans() {
		let store = MemoryStore::new();

		store
			.insert_note(note(ObjectId::new(), "lost", 1, ModerationState::Pending))
			.await;

		let (notes, total) = store
			.moderation_page(&NoteSearch::All, Page { offset: 0, limit: 10 })
			.await
			.unwrap();

		assert_eq!(total, 1);
		assert!(notes[0].author.is_none());
		assert!(store.visible_notes().await.unwrap().is_empty());
	}
}
