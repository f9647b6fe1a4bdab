use std::collections::HashSet;

use super::collection::PersistedCollection;
use super::schema::Database;
use crate::model::Article;

/// Storage key of the bookmark collection.
pub const BOOKMARKS_KEY: &str = "bookmarks";

/// Saved articles, keyed by title, in the order they were added.
#[derive(Debug)]
pub struct BookmarkStore {
    collection: PersistedCollection<Article>,
    items: Vec<Article>,
    /// Entry removed by the last toggle and where it was.
    last_removed: Option<(usize, Article)>,
    warning: Option<String>,
}

impl BookmarkStore {
    /// Load the stored bookmarks. Duplicate titles from older data are dropped.
    pub async fn open(db: Database) -> Self {
        let collection: PersistedCollection<Article> = PersistedCollection::new(db, BOOKMARKS_KEY);
        let loaded = collection.load().await;

        let mut seen = HashSet::new();
        let total = loaded.len();
        let items: Vec<Article> = loaded
            .into_iter()
            .filter(|a| seen.insert(a.title.clone()))
            .collect();
        if items.len() < total {
            tracing::warn!(
                dropped = total - items.len(),
                "Dropped bookmarks with duplicate titles"
            );
        }

        Self {
            collection,
            items,
            last_removed: None,
            warning: None,
        }
    }

    pub fn items(&self) -> &[Article] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_bookmarked(&self, article: &Article) -> bool {
        self.items.iter().any(|a| a.same_story(article))
    }

    /// Add the article, or remove it if one with the same title is saved.
    ///
    /// Toggling back the entry the previous toggle removed restores it in
    /// place, so a toggle pair leaves the collection unchanged.
    ///
    /// Returns whether the article is bookmarked afterwards.
    pub async fn toggle(&mut self, article: &Article) -> bool {
        let restore = self.last_removed.take();
        let now_bookmarked = if let Some(pos) = self.position(article) {
            let removed = self.items.remove(pos);
            self.last_removed = Some((pos, removed));
            false
        } else {
            match restore {
                Some((pos, removed)) if removed.same_story(article) => {
                    let pos = pos.min(self.items.len());
                    self.items.insert(pos, removed);
                }
                _ => self.items.push(article.clone()),
            }
            true
        };
        tracing::debug!(title = %article.title, bookmarked = now_bookmarked, "Bookmark toggled");
        self.persist().await;
        now_bookmarked
    }

    /// Remove by title. Absent articles are ignored. Returns whether anything was removed.
    pub async fn remove(&mut self, article: &Article) -> bool {
        let Some(pos) = self.position(article) else {
            return false;
        };
        self.last_removed = None;
        self.items.remove(pos);
        tracing::debug!(title = %article.title, "Bookmark removed");
        self.persist().await;
        true
    }

    /// The last persistence failure, if any, cleared on read.
    pub fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }

    fn position(&self, article: &Article) -> Option<usize> {
        self.items.iter().position(|a| a.same_story(article))
    }

    async fn persist(&mut self) {
        if let Err(e) = self.collection.save(&self.items).await {
            tracing::warn!(error = %e, "Bookmarks not saved; changes kept in memory");
            self.warning = Some(format!("Bookmarks could not be saved: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            image: None,
            description: Some("desc".into()),
            content: None,
            url: format!("https://example.com/{}", title.len()),
            source: Source { name: "Wire".into() },
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes() {
        let db = Database::open(":memory:").await.unwrap();
        let mut store = BookmarkStore::open(db).await;
        let a = article("One");

        assert!(store.toggle(&a).await);
        assert!(store.is_bookmarked(&a));
        assert!(!store.toggle(&a).await);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_pair_restores_saved_entry_in_place() {
        let db = Database::open(":memory:").await.unwrap();
        let mut store = BookmarkStore::open(db.clone()).await;
        store.toggle(&article("a")).await;
        store.toggle(&article("b")).await;
        let before = db.read_collection(BOOKMARKS_KEY).await.unwrap();

        // Same title, different fields: the stored copy comes back.
        let mut other = article("a");
        other.url = "https://elsewhere.example.com".into();
        assert!(!store.toggle(&other).await);
        assert!(store.toggle(&other).await);

        assert_eq!(db.read_collection(BOOKMARKS_KEY).await.unwrap(), before);
        assert_eq!(store.items()[0], article("a"));
    }

    #[tokio::test]
    async fn test_restore_forgotten_after_other_toggle() {
        let db = Database::open(":memory:").await.unwrap();
        let mut store = BookmarkStore::open(db).await;
        store.toggle(&article("a")).await;
        store.toggle(&article("b")).await;

        store.toggle(&article("a")).await;
        store.toggle(&article("c")).await;
        store.toggle(&article("a")).await;

        let titles: Vec<&str> = store.items().iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_identity_is_title() {
        let db = Database::open(":memory:").await.unwrap();
        let mut store = BookmarkStore::open(db).await;
        let a = article("Same headline");
        let mut b = a.clone();
        b.url = "https://other.example.com".into();

        store.toggle(&a).await;
        assert!(store.is_bookmarked(&b));
        store.toggle(&b).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let db = Database::open(":memory:").await.unwrap();
        let mut store = BookmarkStore::open(db).await;
        assert!(!store.remove(&article("missing")).await);
        assert!(store.take_warning().is_none());
    }

    #[tokio::test]
    async fn test_reopen_keeps_order() {
        let db = Database::open(":memory:").await.unwrap();
        let mut store = BookmarkStore::open(db.clone()).await;
        store.toggle(&article("first")).await;
        store.toggle(&article("second")).await;

        let reopened = BookmarkStore::open(db).await;
        let titles: Vec<&str> = reopened.items().iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_duplicate_titles_dropped_on_load() {
        let db = Database::open(":memory:").await.unwrap();
        let dupes = serde_json::to_string(&vec![article("x"), article("x"), article("y")]).unwrap();
        db.write_collection(BOOKMARKS_KEY, &dupes).await.unwrap();

        let store = BookmarkStore::open(db).await;
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_save_is_surfaced_as_warning() {
        let db = Database::open(":memory:").await.unwrap();
        let mut store = BookmarkStore::open(db.clone()).await;
        sqlx::query("DROP TABLE collections")
            .execute(&db.pool)
            .await
            .unwrap();

        assert!(store.toggle(&article("kept")).await);
        assert_eq!(store.len(), 1);
        let warning = store.take_warning().unwrap();
        assert!(warning.contains("could not be saved"));
        assert!(store.take_warning().is_none());
    }
}
