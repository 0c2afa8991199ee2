use futures::TryStreamExt;
use mongodb::{
	bson::{self, doc, Bson, Document},
	error::{ErrorKind, WriteFailure},
	options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
	Client, Collection, IndexModel,
};

use super::{JoinedNote, NoteSearch, Page, Store, StoreError};
use crate::model::{Admin, ModerationState, NoteDraft, ObjectId, Review, TravelNote, User};

const USERS: &str = "users";
const ADMINS: &str = "admins";
const NOTES: &str = "travelnotes";

/// The field the owner's profile is joined into.
const USER_INFO: &str = "userInfo";

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone, Debug)]
pub struct MongoStore {
	users: Collection<User>,
	admins: Collection<Admin>,
	notes: Collection<TravelNote>,
}

impl MongoStore {
	/// Connects to the database and makes sure usernames are unique.
	pub async fn connect(url: &str, database: &str) -> Result<Self, StoreError> {
		let client = Client::with_uri_str(url).await?;
		let database = client.database(database);

		let store = Self {
			users: database.collection(USERS),
			admins: database.collection(ADMINS),
			notes: database.collection(NOTES),
		};

		store
			.users
			.create_index(
				IndexModel::builder()
					.keys(doc! { "username": 1 })
					.options(IndexOptions::builder().unique(true).build())
					.build(),
				None,
			)
			.await?;

		Ok(store)
	}

	/// Runs `$lookup` of the owner followed by `stages`, decoding each result.
	async fn aggregate_joined(
		&self,
		keep_orphans: bool,
		stages: impl IntoIterator<Item = Document>,
	) -> Result<Vec<JoinedNote>, StoreError> {
		let pipeline = join_owner(keep_orphans).into_iter().chain(stages);
		let documents: Vec<Document> = self
			.notes
			.aggregate(pipeline, None)
			.await?
			.try_collect()
			.await?;

		documents.into_iter().map(decode_joined).collect()
	}
}

/// `$lookup` + `$unwind` of the owning user into [`USER_INFO`].
///
/// Without `keep_orphans`, notes whose owner does not resolve are dropped.
fn join_owner(keep_orphans: bool) -> [Document; 2] {
	[
		doc! {
			"$lookup": {
				"from": USERS,
				"localField": "openid",
				"foreignField": "_id",
				"as": USER_INFO,
			}
		},
		doc! {
			"$unwind": {
				"path": format!("${USER_INFO}"),
				"preserveNullAndEmptyArrays": keep_orphans,
			}
		},
	]
}

fn newest_first() -> Document {
	doc! { "$sort": { "publishTime": -1 } }
}

fn visible() -> Document {
	doc! { "state": 1, "isDeleted": false }
}

/// Case-insensitive literal substring match on the title or the joined username.
fn text_filter(text: &str) -> Document {
	let pattern = regex_lite::escape(text);
	let regex = doc! { "$regex": pattern.as_str(), "$options": "i" };

	let mut username = Document::new();
	username.insert(format!("{USER_INFO}.username"), regex.clone());

	doc! {
		"$or": [
			{ "title": regex },
			username,
		]
	}
}

/// The moderation listing filter, shared by the page query and the count query.
fn search_filter(search: &NoteSearch) -> Document {
	match search {
		NoteSearch::All => Document::new(),
		NoteSearch::State(state) => doc! { "state": i32::from(*state) },
		NoteSearch::Text(text) => text_filter(text),
	}
}

fn decode_joined(mut document: Document) -> Result<JoinedNote, StoreError> {
	let author = match document.remove(USER_INFO) {
		Some(Bson::Document(user)) => Some(bson::from_document(user)?),
		_ => None,
	};

	Ok(JoinedNote {
		note: bson::from_document(document)?,
		author,
	})
}

fn draft_fields(draft: NoteDraft) -> Result<Document, StoreError> {
	Ok(doc! {
		"title": draft.title,
		"content": draft.content,
		"imgList": bson::to_bson(&draft.img_list)?,
		"openid": draft.openid,
		"video": draft.video,
	})
}

fn return_updated() -> FindOneAndUpdateOptions {
	FindOneAndUpdateOptions::builder()
		.return_document(ReturnDocument::After)
		.build()
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
	matches!(
		error.kind.as_ref(),
		ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
	)
}

#[axum::async_trait]
impl Store for MongoStore {
	async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
		Ok(self
			.users
			.find_one(doc! { "username": username }, None)
			.await?)
	}

	async fn create_user(&self, user: User) -> Result<User, StoreError> {
		match self.users.insert_one(&user, None).await {
			Ok(..) => Ok(user),
			Err(error) if is_duplicate_key(&error) => Err(StoreError::UsernameTaken),
			Err(error) => Err(error.into()),
		}
	}

	async fn update_avatar(
		&self,
		id: ObjectId,
		avatar: String,
	) -> Result<Option<User>, StoreError> {
		Ok(self
			.users
			.find_one_and_update(
				doc! { "_id": id },
				doc! { "$set": { "avatar": avatar } },
				return_updated(),
			)
			.await?)
	}

	async fn find_admin(&self, username: &str) -> Result<Option<Admin>, StoreError> {
		Ok(self
			.admins
			.find_one(doc! { "username": username }, None)
			.await?)
	}

	async fn create_note(&self, draft: NoteDraft) -> Result<TravelNote, StoreError> {
		let note = TravelNote::submit(draft);

		self.notes.insert_one(&note, None).await?;
		Ok(note)
	}

	async fn resubmit_note(
		&self,
		id: ObjectId,
		draft: NoteDraft,
	) -> Result<Option<TravelNote>, StoreError> {
		let mut fields = draft_fields(draft)?;
		fields.insert("state", i32::from(ModerationState::Pending));

		Ok(self
			.notes
			.find_one_and_update(doc! { "_id": id }, doc! { "$set": fields }, return_updated())
			.await?)
	}

	async fn review_note(
		&self,
		id: ObjectId,
		review: Review,
	) -> Result<Option<TravelNote>, StoreError> {
		let mut fields = doc! { "state": i32::from(review.state()) };

		if let Review::Reject(reason) = review {
			fields.insert("rejectReason", reason);
		}

		Ok(self
			.notes
			.find_one_and_update(doc! { "_id": id }, doc! { "$set": fields }, return_updated())
			.await?)
	}

	async fn set_deleted(&self, id: ObjectId, deleted: bool) -> Result<bool, StoreError> {
		let result = self
			.notes
			.update_one(doc! { "_id": id }, doc! { "$set": { "isDeleted": deleted } }, None)
			.await?;

		Ok(result.matched_count > 0)
	}

	async fn note(&self, id: ObjectId) -> Result<Option<JoinedNote>, StoreError> {
		// Match first so the lookup only runs for one document.
		let pipeline = [doc! { "$match": { "_id": id } }]
			.into_iter()
			.chain(join_owner(false));

		let mut cursor = self.notes.aggregate(pipeline, None).await?;

		cursor
			.try_next()
			.await?
			.map(decode_joined)
			.transpose()
	}

	async fn visible_notes(&self) -> Result<Vec<JoinedNote>, StoreError> {
		self.aggregate_joined(false, [doc! { "$match": visible() }, newest_first()])
			.await
	}

	async fn search_visible_notes(&self, text: &str) -> Result<Vec<JoinedNote>, StoreError> {
		let filter = doc! { "$and": [visible(), text_filter(text)] };

		self.aggregate_joined(false, [doc! { "$match": filter }, newest_first()])
			.await
	}

	async fn owner_notes(&self, owner: ObjectId) -> Result<Vec<TravelNote>, StoreError> {
		let options = FindOptions::builder()
			.sort(doc! { "publishTime": -1 })
			.build();

		Ok(self
			.notes
			.find(doc! { "openid": owner, "isDeleted": false }, options)
			.await?
			.try_collect()
			.await?)
	}

	async fn moderation_page(
		&self,
		search: &NoteSearch,
		page: Page,
	) -> Result<(Vec<JoinedNote>, u64), StoreError> {
		let filter = search_filter(search);

		let notes = self
			.aggregate_joined(
				true,
				[
					doc! { "$match": filter.clone() },
					newest_first(),
					doc! { "$skip": i64::try_from(page.offset).unwrap_or(i64::MAX) },
					doc! { "$limit": i64::try_from(page.limit).unwrap_or(i64::MAX) },
				],
			)
			.await?;

		let count = join_owner(true)
			.into_iter()
			.chain([doc! { "$match": filter }, doc! { "$count": "total" }]);

		let total = match self.notes.aggregate(count, None).await?.try_next().await? {
			Some(document) => match document.get("total") {
				Some(Bson::Int32(total)) => u64::try_from(*total).unwrap_or_default(),
				Some(Bson::Int64(total)) => u64::try_from(*total).unwrap_or_default(),
				_ => 0,
			},
			None => 0,
		};

		Ok((notes, total))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_state_filter() {
		assert_eq!(
			search_filter(&NoteSearch::State(ModerationState::Rejected)),
			doc! { "state": 2 }
		);
		assert_eq!(search_filter(&NoteSearch::All), Document::new());
	}

	#[test]
	fn test_text_filter_is_literal() {
		let filter = search_filter(&NoteSearch::Text("a.b(".into()));
		let clauses = filter.get_array("$or").unwrap();

		let title = clauses[0].as_document().unwrap().get_document("title").unwrap();
		assert_eq!(title.get_str("$regex").unwrap(), r"a\.b\(");
		assert_eq!(title.get_str("$options").unwrap(), "i");

		let username = clauses[1].as_document().unwrap();
		assert!(username.contains_key("userInfo.username"));
	}

	#[test]
	fn test_join_drops_orphans_unless_asked() {
		let [_, unwind] = join_owner(false);
		let unwind = unwind.get_document("$unwind").unwrap();

		assert_eq!(unwind.get_str("path").unwrap(), "$userInfo");
		assert!(!unwind.get_bool("preserveNullAndEmptyArrays").unwrap());
	}

	/// Tests against a live server, run with `MONGODB_TEST_URL` set and `--ignored`.
	mod live {
		use super::*;
		use crate::model::ImageList;

		/// A store over a fresh database, and the database name for cleanup.
		async fn store() -> Option<(MongoStore, String, String)> {
			let url = std::env::var("MONGODB_TEST_URL").ok()?;
			let name = format!("travel_notes_test_{}", uuid::Uuid::new_v4().simple());
			let store = MongoStore::connect(&url, &name).await.unwrap();

			Some((store, url, name))
		}

		async fn drop_database(url: &str, name: &str) {
			Client::with_uri_str(url)
				.await
				.unwrap()
				.database(name)
				.drop(None)
				.await
				.unwrap();
		}

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

		fn draft(openid: ObjectId, title: &str) -> NoteDraft {
			NoteDraft {
				title: title.into(),
				content: String::new(),
				img_list: ImageList::default(),
				openid,
				video: None,
			}
		}

		#[tokio::test]
		#[ignore = "needs MONGODB_TEST_URL"]
		async fn test_duplicate_username() {
			let Some((store, url, name)) = store().await else {
				return;
			};

			store.create_user(user("mika")).await.unwrap();
			let error = store.create_user(user("mika")).await.unwrap_err();

			assert!(matches!(error, StoreError::UsernameTaken));

			drop_database(&url, &name).await;
		}

		#[tokio::test]
		#[ignore = "needs MONGODB_TEST_URL"]
		async fn test_updates_return_new_document() {
			let Some((store, url, name)) = store().await else {
				return;
			};

			let mika = store.create_user(user("mika")).await.unwrap();
			let updated = store
				.update_avatar(mika.id, "https://cdn/a.png".into())
				.await
				.unwrap()
				.unwrap();
			assert_eq!(updated.avatar.as_deref(), Some("https://cdn/a.png"));

			let note = store.create_note(draft(mika.id, "Lisbon")).await.unwrap();
			let reviewed = store
				.review_note(note.id, Review::Reject("blurry".into()))
				.await
				.unwrap()
				.unwrap();
			assert_eq!(reviewed.state, ModerationState::Rejected);
			assert_eq!(reviewed.reject_reason.as_deref(), Some("blurry"));

			let resubmitted = store
				.resubmit_note(note.id, draft(mika.id, "Lisbon again"))
				.await
				.unwrap()
				.unwrap();
			assert_eq!(resubmitted.state, ModerationState::Pending);
			assert_eq!(resubmitted.title, "Lisbon again");

			assert!(store
				.review_note(ObjectId::new(), Review::Approve)
				.await
				.unwrap()
				.is_none());

			drop_database(&url, &name).await;
		}

		#[tokio::test]
		#[ignore = "needs MONGODB_TEST_URL"]
		async fn test_moderation_page_counts() {
			let Some((store, url, name)) = store().await else {
				return;
			};

			let mika = store.create_user(user("mika")).await.unwrap();
			for title in ["Lisbon", "Porto", "Kyoto"] {
				store.create_note(draft(mika.id, title)).await.unwrap();
			}
			store.create_note(draft(ObjectId::new(), "Orphan")).await.unwrap();

			let page = Page { offset: 2, limit: 3 };
			let (notes, total) = store.moderation_page(&NoteSearch::All, page).await.unwrap();
			assert_eq!(total, 4);
			assert_eq!(notes.len(), 2);

			let search = NoteSearch::Text("MIK".into());
			let (_, total) = store.moderation_page(&search, page).await.unwrap();
			assert_eq!(total, 3);

			let search = NoteSearch::State(ModerationState::Approved);
			let (notes, total) = store.moderation_page(&search, page).await.unwrap();
			assert_eq!((notes.len(), total), (0, 0));

			drop_database(&url, &name).await;
		}
	}
}
