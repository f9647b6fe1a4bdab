mod blogs;
mod bookmarks;
mod collection;
mod schema;
mod types;

pub use blogs::{placeholder_image, BlogError, BlogField, BlogStore, ValidationError, BLOGS_KEY};
pub use bookmarks::{BookmarkStore, BOOKMARKS_KEY};
pub use collection::PersistedCollection;
pub use schema::Database;
pub use types::DatabaseError;
