use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::collection::PersistedCollection;
use super::schema::Database;
use crate::clock::Clock;
use crate::model::{BlogDraft, BlogPost};

/// Storage key of the blog collection.
pub const BLOGS_KEY: &str = "blogs";

/// A required draft field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlogField {
    Title,
    Content,
}

impl fmt::Display for BlogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlogField::Title => write!(f, "title"),
            BlogField::Content => write!(f, "content"),
        }
    }
}

/// A draft is missing required fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("required fields are empty: {}", join_fields(.fields))]
pub struct ValidationError {
    pub fields: Vec<BlogField>,
}

fn join_fields(fields: &[BlogField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no blog post with id {0}")]
    NotFound(i64),
}

/// Generated image used when a post is created without one.
pub fn placeholder_image(now_ms: i64) -> String {
    format!("https://picsum.photos/400/300?random={now_ms}")
}

/// User-authored posts, newest first.
pub struct BlogStore {
    collection: PersistedCollection<BlogPost>,
    clock: Arc<dyn Clock>,
    items: Vec<BlogPost>,
    warning: Option<String>,
}

impl fmt::Debug for BlogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlogStore")
            .field("collection", &self.collection)
            .field("items", &self.items.len())
            .finish()
    }
}

impl BlogStore {
    pub async fn open(db: Database, clock: Arc<dyn Clock>) -> Self {
        let collection = PersistedCollection::new(db, BLOGS_KEY);
        let items = collection.load().await;
        Self {
            collection,
            clock,
            items,
            warning: None,
        }
    }

    pub fn items(&self) -> &[BlogPost] {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&BlogPost> {
        self.items.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Validate and prepend a new post.
    pub async fn create(&mut self, draft: BlogDraft) -> Result<BlogPost, BlogError> {
        let (title, content) = validate(&draft)?;
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();

        // Ids follow the clock but must stay unique when it has not moved.
        let id = match self.items.iter().map(|p| p.id).max() {
            Some(max) if max >= now_ms => max + 1,
            _ => now_ms,
        };
        let image = draft
            .supplied_image()
            .map(str::to_string)
            .unwrap_or_else(|| placeholder_image(now_ms));

        let post = BlogPost {
            id,
            title,
            content,
            image,
            created_at: now,
            updated_at: now,
        };
        self.items.insert(0, post.clone());
        tracing::info!(id, "Blog post created");
        self.persist().await;
        Ok(post)
    }

    /// Validate and replace a post in place, keeping its id and creation time.
    pub async fn update(&mut self, id: i64, draft: BlogDraft) -> Result<BlogPost, BlogError> {
        let (title, content) = validate(&draft)?;
        let now = self.clock.now();

        let post = self
            .items
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(BlogError::NotFound(id))?;

        post.title = title;
        post.content = content;
        if let Some(image) = draft.supplied_image() {
            post.image = image.to_string();
        }
        post.updated_at = now.max(post.updated_at + chrono::Duration::milliseconds(1));
        let updated = post.clone();

        tracing::info!(id, "Blog post updated");
        self.persist().await;
        Ok(updated)
    }

    /// Remove a post. Unknown ids are ignored. Returns whether anything was removed.
    ///
    /// Callers are expected to have confirmed with the user first.
    pub async fn delete(&mut self, id: i64) -> bool {
        let Some(pos) = self.items.iter().position(|p| p.id == id) else {
            tracing::debug!(id, "Delete of unknown blog post ignored");
            return false;
        };
        self.items.remove(pos);
        tracing::info!(id, "Blog post deleted");
        self.persist().await;
        true
    }

    /// The last persistence failure, if any, cleared on read.
    pub fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }

    async fn persist(&mut self) {
        if let Err(e) = self.collection.save(&self.items).await {
            tracing::warn!(error = %e, "Blog posts not saved; changes kept in memory");
            self.warning = Some(format!("Blog posts could not be saved: {e}"));
        }
    }
}

/// Trimmed title and content, or the list of empty fields.
fn validate(draft: &BlogDraft) -> Result<(String, String), ValidationError> {
    let title = draft.title.trim();
    let content = draft.content.trim();

    let mut fields = Vec::new();
    if title.is_empty() {
        fields.push(BlogField::Title);
    }
    if content.is_empty() {
        fields.push(BlogField::Content);
    }
    if !fields.is_empty() {
        return Err(ValidationError { fields });
    }
    Ok((title.to_string(), content.to_string()))
}
