use std::path::Path;
use std::sync::Arc;

use crate::clock::Clock;
use crate::feed::{CategoryOutcome, FeedController, FeedSettings, FetchOutcome};
use crate::gateway::ContentGateway;
use crate::media::{ImageEncoder, MediaError};
use crate::model::{Article, BlogDraft, BlogPost};
use crate::selection::{EditorTarget, SelectionCoordinator};
use crate::storage::{BlogError, BlogStore, BookmarkStore, Database};

// ============================================================================
// Confirmation
// ============================================================================

/// Asks the user to approve a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Approves everything. Used for `--yes` and in tests.
#[derive(Debug, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Result of [`App::delete_blog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
    NotFound,
}

// ============================================================================
// App
// ============================================================================

/// Composition root: the feed, both stores and the open views.
///
/// Fields are public for read access by the shell; mutations that span more
/// than one component go through the methods here.
pub struct App {
    pub feed: FeedController,
    pub bookmarks: BookmarkStore,
    pub blogs: BlogStore,
    pub selection: SelectionCoordinator,
    images: Arc<dyn ImageEncoder>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("feed", &self.feed)
            .field("bookmarks", &self.bookmarks.len())
            .field("blogs", &self.blogs.len())
            .field("selection", &self.selection)
            .finish()
    }
}

impl App {
    pub async fn new(
        db: Database,
        gateway: Arc<dyn ContentGateway>,
        clock: Arc<dyn Clock>,
        images: Arc<dyn ImageEncoder>,
        settings: FeedSettings,
    ) -> Self {
        let bookmarks = BookmarkStore::open(db.clone()).await;
        let blogs = BlogStore::open(db, Arc::clone(&clock)).await;
        tracing::info!(
            bookmarks = bookmarks.len(),
            blogs = blogs.len(),
            "Collections loaded"
        );
        Self {
            feed: FeedController::new(gateway, clock, settings),
            bookmarks,
            blogs,
            selection: SelectionCoordinator::new(),
            images,
        }
    }

    // ------------------------------------------------------------------
    // Feed
    // ------------------------------------------------------------------

    /// Select a category. The bookmark pseudo-category opens the overlay;
    /// any real category closes it.
    pub async fn select_category(&mut self, name: &str) -> CategoryOutcome {
        let outcome = self.feed.select_category(name).await;
        if outcome == CategoryOutcome::Bookmarks {
            self.selection.open_bookmarks();
        } else {
            self.selection.close_bookmarks();
        }
        outcome
    }

    pub async fn search(&mut self, query: &str) -> Option<FetchOutcome> {
        let outcome = self.feed.search(query).await;
        if outcome.is_some() {
            self.selection.close_bookmarks();
        }
        outcome
    }

    pub async fn clear_search(&mut self) -> FetchOutcome {
        self.selection.close_bookmarks();
        self.feed.clear_search().await
    }

    pub async fn retry(&mut self) -> FetchOutcome {
        self.feed.retry().await
    }

    /// The list the user is looking at: bookmarks while the overlay is open,
    /// otherwise the feed.
    pub fn visible_articles(&self) -> &[Article] {
        if self.selection.bookmarks_visible() {
            self.bookmarks.items()
        } else {
            self.feed.articles()
        }
    }

    /// Open the detail view for an entry of the visible list.
    pub fn open_article(&mut self, index: usize) -> Option<&Article> {
        let article = self.visible_articles().get(index)?.clone();
        self.selection.open_article(article);
        self.selection.detail_article()
    }

    /// Toggle the bookmark on an entry of the visible list.
    ///
    /// Returns whether it is bookmarked afterwards, or `None` for a bad index.
    pub async fn toggle_bookmark(&mut self, index: usize) -> Option<bool> {
        let article = self.visible_articles().get(index)?.clone();
        Some(self.bookmarks.toggle(&article).await)
    }

    /// Remove the bookmark at `index` of the bookmark list.
    pub async fn remove_bookmark(&mut self, index: usize) -> Option<Article> {
        let article = self.bookmarks.items().get(index)?.clone();
        self.bookmarks.remove(&article).await;
        Some(article)
    }

    // ------------------------------------------------------------------
    // Blog
    // ------------------------------------------------------------------

    pub async fn encode_image(&self, path: &Path) -> Result<String, MediaError> {
        self.images.encode(path).await
    }

    /// Save the draft for whatever the editor is open on.
    ///
    /// The editor closes on success and stays open on a validation error.
    pub async fn save_blog(
        &mut self,
        target: EditorTarget,
        draft: BlogDraft,
    ) -> Result<BlogPost, BlogError> {
        self.selection.open_editor(target);
        let post = match target {
            EditorTarget::Create => self.blogs.create(draft).await?,
            EditorTarget::Edit(id) => self.blogs.update(id, draft).await?,
        };
        self.selection.close_editor();
        if self.selection.blog_detail().is_some_and(|p| p.id == post.id) {
            self.selection.open_blog(post.clone());
        }
        Ok(post)
    }

    pub fn open_blog(&mut self, id: i64) -> Option<&BlogPost> {
        let post = self.blogs.get(id)?.clone();
        self.selection.open_blog(post);
        self.selection.blog_detail()
    }

    /// Delete a post once the user confirms.
    pub async fn delete_blog(&mut self, id: i64, confirm: &dyn Confirm) -> DeleteOutcome {
        let Some(post) = self.blogs.get(id) else {
            return DeleteOutcome::NotFound;
        };
        let prompt = format!("Delete blog post \"{}\"?", post.title);
        if !confirm.confirm(&prompt) {
            tracing::debug!(id, "Blog delete declined");
            return DeleteOutcome::Declined;
        }
        self.blogs.delete(id).await;
        self.selection.forget_blog(id);
        DeleteOutcome::Deleted
    }

    // ------------------------------------------------------------------
    // Warnings
    // ------------------------------------------------------------------

    /// Persistence warnings raised since the last call.
    pub fn take_warnings(&mut self) -> Vec<String> {
        self.bookmarks
            .take_warning()
            .into_iter()
            .chain(self.blogs.take_warning())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::gateway::GatewayError;
    use crate::media::DataUrlEncoder;
    use crate::model::Source;
    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    struct OneStory;

    #[async_trait]
    impl ContentGateway for OneStory {
        async fn fetch_category(&self, category: &str) -> Result<Vec<Article>, GatewayError> {
            Ok(vec![Article {
                title: format!("{category} headline"),
                image: None,
                description: None,
                content: None,
                url: "https://example.com".into(),
                source: Source { name: "s".into() },
                published_at: Utc::now(),
            }])
        }

        async fn search(&self, _query: &str) -> Result<Vec<Article>, GatewayError> {
            Ok(Vec::new())
        }
    }

    struct Decline;

    impl Confirm for Decline {
        fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    async fn app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        App::new(
            db,
            Arc::new(OneStory),
            Arc::new(ManualClock::at_ms(1_700_000_000_000)),
            Arc::new(DataUrlEncoder),
            FeedSettings::default(),
        )
        .await
    }

    #[tokio::test]
    async fn test_bookmark_category_opens_overlay() {
        let mut app = app().await;
        app.select_category("general").await;
        app.toggle_bookmark(0).await;

        assert_eq!(app.select_category("bookmark").await, CategoryOutcome::Bookmarks);
        assert!(app.selection.bookmarks_visible());
        assert_eq!(app.visible_articles()[0].title, "general headline");

        app.select_category("sports").await;
        assert!(!app.selection.bookmarks_visible());
    }

    #[tokio::test]
    async fn test_toggle_bad_index() {
        let mut app = app().await;
        assert_eq!(app.toggle_bookmark(3).await, None);
    }

    #[tokio::test]
    async fn test_save_blog_closes_editor() {
        let mut app = app().await;
        let err = app
            .save_blog(EditorTarget::Create, BlogDraft::new("", "body"))
            .await;
        assert!(err.is_err());
        assert_eq!(app.selection.editor(), Some(EditorTarget::Create));

        app.save_blog(EditorTarget::Create, BlogDraft::new("t", "body"))
            .await
            .unwrap();
        assert_eq!(app.selection.editor(), None);
        assert_eq!(app.blogs.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let mut app = app().await;
        let post = app
            .save_blog(EditorTarget::Create, BlogDraft::new("t", "c"))
            .await
            .unwrap();
        app.open_blog(post.id);

        assert_eq!(app.delete_blog(post.id, &Decline).await, DeleteOutcome::Declined);
        assert_eq!(app.blogs.len(), 1);

        assert_eq!(app.delete_blog(post.id, &AssumeYes).await, DeleteOutcome::Deleted);
        assert!(app.blogs.is_empty());
        assert!(app.selection.blog_detail().is_none());

        assert_eq!(app.delete_blog(post.id, &AssumeYes).await, DeleteOutcome::NotFound);
    }
}
