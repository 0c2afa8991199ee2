use aide::axum::ApiRouter;

use crate::AppState;

pub mod admin;
pub mod docs;
pub mod model;
pub mod note;
pub mod polish;
pub mod upload;
pub mod user;

/// Every API route. The client apps expect them at the root, not nested.
pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.merge(note::routes())
		.merge(user::routes())
		.merge(admin::routes())
		.merge(upload::routes())
		.merge(polish::routes())
}
