//! Bookmark and blog collections through their stores and the app.

use chrono::{Duration, TimeZone, Utc};
use newsdesk::app::{App, AssumeYes, Confirm, DeleteOutcome};
use newsdesk::clock::ManualClock;
use newsdesk::feed::FeedSettings;
use newsdesk::gateway::{HttpGateway, GatewaySettings};
use newsdesk::media::DataUrlEncoder;
use newsdesk::model::{Article, BlogDraft, Source};
use newsdesk::selection::EditorTarget;
use newsdesk::storage::{
    BlogError, BlogStore, BookmarkStore, Database, PersistedCollection, BLOGS_KEY, BOOKMARKS_KEY,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

const START_MS: i64 = 1_700_000_000_000;

fn article(title: &str) -> Article {
    Article {
        title: title.to_string(),
        image: Some("https://img.example.com/a.jpg".into()),
        description: Some(format!("about {title}")),
        content: None,
        url: format!("https://news.example.com/{}", title.len()),
        source: Source {
            name: "Wire".into(),
        },
        published_at: Utc.with_ymd_and_hms(2024, 3, 14, 15, 9, 26).unwrap(),
    }
}

// ============================================================================
// Bookmarks
// ============================================================================

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_double_toggle_of_new_article_restores_stored_bytes(
        titles in proptest::collection::hash_set("[a-z]{1,12}", 1..6),
        extra in "[A-Z]{1,12}",
    ) {
        runtime().block_on(async {
            let db = Database::open(":memory:").await.unwrap();
            let mut store = BookmarkStore::open(db.clone()).await;
            for title in &titles {
                store.toggle(&article(title)).await;
            }
            let before = db.read_collection(BOOKMARKS_KEY).await.unwrap();

            let a = article(&extra);
            assert!(store.toggle(&a).await);
            assert!(!store.toggle(&a).await);

            let after = db.read_collection(BOOKMARKS_KEY).await.unwrap();
            assert_eq!(before, after);
        });
    }

    #[test]
    fn test_double_toggle_of_saved_article_restores_stored_bytes(
        titles in proptest::collection::hash_set("[a-z]{1,12}", 1..6),
        pick in any::<prop::sample::Index>(),
    ) {
        runtime().block_on(async {
            let db = Database::open(":memory:").await.unwrap();
            let mut store = BookmarkStore::open(db.clone()).await;
            let titles: Vec<String> = titles.into_iter().collect();
            for title in &titles {
                store.toggle(&article(title)).await;
            }
            let before = db.read_collection(BOOKMARKS_KEY).await.unwrap();

            // Same title as a saved entry, different fields.
            let mut a = article(&titles[pick.index(titles.len())]);
            a.description = None;
            assert!(!store.toggle(&a).await);
            assert!(store.toggle(&a).await);

            let after = db.read_collection(BOOKMARKS_KEY).await.unwrap();
            assert_eq!(before, after);
        });
    }
}

#[tokio::test]
async fn test_bookmarks_survive_reopen() {
    let db = Database::open(":memory:").await.unwrap();
    let mut store = BookmarkStore::open(db.clone()).await;
    store.toggle(&article("Eclipse tonight")).await;
    store.toggle(&article("Markets rally")).await;
    store.remove(&article("Eclipse tonight")).await;

    let reopened = BookmarkStore::open(db).await;
    assert_eq!(reopened.items(), &[article("Markets rally")]);
}

#[tokio::test]
async fn test_bookmarks_are_stored_as_camel_case_json() {
    let db = Database::open(":memory:").await.unwrap();
    let mut store = BookmarkStore::open(db.clone()).await;
    store.toggle(&article("Eclipse tonight")).await;

    let raw = db.read_collection(BOOKMARKS_KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["title"], "Eclipse tonight");
    assert_eq!(value[0]["source"]["name"], "Wire");
    assert!(value[0].get("publishedAt").is_some());
}

#[tokio::test]
async fn test_corrupt_collection_loads_empty() {
    let db = Database::open(":memory:").await.unwrap();
    db.write_collection(BOOKMARKS_KEY, "{not json").await.unwrap();

    let store = BookmarkStore::open(db.clone()).await;
    assert!(store.is_empty());

    let collection: PersistedCollection<Article> = PersistedCollection::new(db, BOOKMARKS_KEY);
    assert!(collection.load().await.is_empty());
}

#[tokio::test]
async fn test_missing_collection_loads_empty() {
    let db = Database::open(":memory:").await.unwrap();
    let collection: PersistedCollection<Article> = PersistedCollection::new(db, "nothing-here");
    assert_eq!(collection.key(), "nothing-here");
    assert!(collection.load().await.is_empty());
}

#[tokio::test]
async fn test_file_database_persists_across_connections() {
    let dir = std::env::temp_dir().join(format!("newsdesk-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("collections.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::open(path).await.unwrap();
        let mut store = BookmarkStore::open(db).await;
        store.toggle(&article("Kept on disk")).await;
    }

    let db = Database::open(path).await.unwrap();
    let store = BookmarkStore::open(db).await;
    assert_eq!(store.len(), 1);
    assert_eq!(store.items()[0].title, "Kept on disk");

    let _ = std::fs::remove_dir_all(&dir);
}

// ============================================================================
// Blog posts
// ============================================================================

async fn blog_store(clock: Arc<ManualClock>) -> (BlogStore, Database) {
    let db = Database::open(":memory:").await.unwrap();
    (BlogStore::open(db.clone(), clock).await, db)
}

#[tokio::test]
async fn test_update_keeps_created_at_and_advances_updated_at() {
    let clock = Arc::new(ManualClock::at_ms(START_MS));
    let (mut blogs, _db) = blog_store(clock.clone()).await;

    let post = blogs.create(BlogDraft::new("Draft", "First words")).await.unwrap();
    assert_eq!(post.created_at, post.updated_at);

    clock.advance(Duration::minutes(3));
    let edited = blogs
        .update(post.id, BlogDraft::new("Final", "Better words"))
        .await
        .unwrap();

    assert_eq!(edited.id, post.id);
    assert_eq!(edited.created_at, post.created_at);
    assert!(edited.updated_at > edited.created_at);
    assert_eq!(edited.title, "Final");
}

#[tokio::test]
async fn test_update_within_same_millisecond_still_moves_updated_at() {
    let clock = Arc::new(ManualClock::at_ms(START_MS));
    let (mut blogs, _db) = blog_store(clock).await;

    let post = blogs.create(BlogDraft::new("t", "c")).await.unwrap();
    let edited = blogs.update(post.id, BlogDraft::new("t", "c2")).await.unwrap();
    assert!(edited.updated_at > post.created_at);
}

#[tokio::test]
async fn test_failed_validation_changes_nothing() {
    let clock = Arc::new(ManualClock::at_ms(START_MS));
    let (mut blogs, db) = blog_store(clock).await;

    let err = blogs.create(BlogDraft::new("", "")).await.unwrap_err();
    assert!(matches!(err, BlogError::Validation(_)));
    assert!(blogs.is_empty());
    assert_eq!(db.read_collection(BLOGS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_posts_survive_reopen_newest_first() {
    let clock = Arc::new(ManualClock::at_ms(START_MS));
    let (mut blogs, db) = blog_store(clock.clone()).await;
    blogs.create(BlogDraft::new("older", "a")).await.unwrap();
    clock.advance(Duration::seconds(10));
    blogs.create(BlogDraft::new("newer", "b")).await.unwrap();

    let reopened = BlogStore::open(db, clock).await;
    let titles: Vec<&str> = reopened.items().iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["newer", "older"]);
}

// ============================================================================
// Through the app
// ============================================================================

struct Never;

impl Confirm for Never {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

async fn app() -> App {
    let db = Database::open(":memory:").await.unwrap();
    // Nothing in these tests touches the network.
    let gateway = HttpGateway::new(GatewaySettings::default()).unwrap();
    App::new(
        db,
        Arc::new(gateway),
        Arc::new(ManualClock::at_ms(START_MS)),
        Arc::new(DataUrlEncoder),
        FeedSettings::default(),
    )
    .await
}

#[tokio::test]
async fn test_confirmed_delete_removes_exactly_one_post() {
    let mut app = app().await;
    let keep = app
        .save_blog(EditorTarget::Create, BlogDraft::new("keep", "x"))
        .await
        .unwrap();
    let gone = app
        .save_blog(EditorTarget::Create, BlogDraft::new("drop", "y"))
        .await
        .unwrap();

    assert_eq!(app.delete_blog(gone.id, &Never).await, DeleteOutcome::Declined);
    assert_eq!(app.blogs.len(), 2);

    assert_eq!(app.delete_blog(gone.id, &AssumeYes).await, DeleteOutcome::Deleted);
    assert_eq!(app.blogs.items(), &[keep.clone()]);

    assert_eq!(app.delete_blog(gone.id, &AssumeYes).await, DeleteOutcome::NotFound);
    assert_eq!(app.blogs.items(), &[keep]);
}

#[tokio::test]
async fn test_editing_open_post_refreshes_detail_view() {
    let mut app = app().await;
    let post = app
        .save_blog(EditorTarget::Create, BlogDraft::new("v1", "body"))
        .await
        .unwrap();
    app.open_blog(post.id);

    app.save_blog(EditorTarget::Edit(post.id), BlogDraft::new("v2", "body"))
        .await
        .unwrap();
    assert_eq!(app.selection.blog_detail().unwrap().title, "v2");
    assert_eq!(app.selection.editor(), None);
}

#[tokio::test]
async fn test_editing_unknown_post_is_not_found() {
    let mut app = app().await;
    let err = app
        .save_blog(EditorTarget::Edit(7), BlogDraft::new("t", "c"))
        .await
        .unwrap_err();
    assert_eq!(err, BlogError::NotFound(7));
}
