//! Plain-text rendering for the shell.
//!
//! Everything returns a `String` so the loop decides where output goes.

use std::fmt::Write;

use crate::app::App;
use crate::feed::{CategoryOutcome, FeedMode, FetchOutcome, CATEGORIES};
use crate::model::{Article, BlogPost};
use crate::storage::BookmarkStore;
use crate::util::{fit_width, strip_control_chars};

/// Column budget for list rows.
pub(super) const LINE_WIDTH: usize = 78;

pub(super) const HELP: &str = "\
Feed
  cat <name>          browse a category (cat bookmark shows saved articles)
  cats                list categories
  search <query>      search all articles
  clear               leave search and reload general headlines
  retry               repeat the last request
Articles
  show <n>            article details
  open <n>            open article in the browser
  bm <n>              toggle bookmark
  bookmarks           show saved articles
  unbm <n>            remove saved article n
Blog
  blogs               list your posts
  blog new <title> | <content> [| <image path>]
  blog edit <id> <title> | <content> [| <image path>]
  blog show <id>
  blog rm <id>
Other
  close               close the innermost open view
  status              current mode and counts
  help                this text
  quit";

pub(super) fn categories() -> String {
    CATEGORIES.join(", ")
}

/// Numbered article list with a bookmark marker.
pub(super) fn article_list(articles: &[Article], bookmarks: &BookmarkStore) -> String {
    let mut out = String::new();
    for (i, article) in articles.iter().enumerate() {
        let marker = if bookmarks.is_bookmarked(article) {
            '*'
        } else {
            ' '
        };
        let prefix = format!("{:>3}. [{marker}] ", i + 1);
        let suffix = format!(
            "  ({}, {})",
            article.source.name,
            article.published_at.format("%Y-%m-%d")
        );
        let room = LINE_WIDTH.saturating_sub(prefix.len() + suffix.len()).max(10);
        let _ = writeln!(out, "{prefix}{}{suffix}", fit_width(&article.title, room));
    }
    out
}

pub(super) fn article_detail(article: &Article, bookmarked: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", article.title);
    let _ = writeln!(
        out,
        "{} | {}{}",
        article.source.name,
        article.published_at.format("%Y-%m-%d %H:%M UTC"),
        if bookmarked { " | bookmarked" } else { "" }
    );
    let _ = writeln!(out, "{}", article.url);
    if let Some(image) = &article.image {
        let _ = writeln!(out, "image: {image}");
    }
    for text in [&article.description, &article.content].into_iter().flatten() {
        let _ = writeln!(out, "\n{text}");
    }
    out
}

pub(super) fn blog_list(posts: &[BlogPost]) -> String {
    if posts.is_empty() {
        return "no blog posts yet (blog new <title> | <content>)\n".to_string();
    }
    let mut out = String::new();
    for post in posts {
        let prefix = format!("{:>14}  ", post.id);
        let room = LINE_WIDTH.saturating_sub(prefix.len() + 12);
        let _ = writeln!(
            out,
            "{prefix}{}  {}",
            fit_width(&post.title, room),
            post.updated_at.format("%Y-%m-%d")
        );
    }
    out
}

pub(super) fn blog_detail(post: &BlogPost) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  (#{})", strip_control_chars(&post.title), post.id);
    let _ = write!(out, "created {}", post.created_at.format("%Y-%m-%d %H:%M UTC"));
    if post.updated_at != post.created_at {
        let _ = write!(out, ", updated {}", post.updated_at.format("%Y-%m-%d %H:%M UTC"));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "image: {}", fit_width(&post.image, LINE_WIDTH - 7));
    let _ = writeln!(out, "\n{}", strip_control_chars(&post.content));
    out
}

pub(super) fn status(app: &App) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  [{}]", app.feed.mode(), app.feed.status());
    if !app.feed.headline().is_empty() {
        let _ = writeln!(out, "headline: {}", app.feed.headline());
    }
    let _ = writeln!(
        out,
        "articles: {}  bookmarks: {}  blog posts: {}  cached categories: {}",
        app.feed.articles().len(),
        app.bookmarks.len(),
        app.blogs.len(),
        app.feed.cache().len()
    );
    let mut open = Vec::new();
    if app.selection.bookmarks_visible() {
        open.push("bookmarks".to_string());
    }
    if let Some(article) = app.selection.detail_article() {
        open.push(format!("article \"{}\"", fit_width(&article.title, 30)));
    }
    if let Some(post) = app.selection.blog_detail() {
        open.push(format!("blog #{}", post.id));
    }
    if !open.is_empty() {
        let _ = writeln!(out, "open: {}", open.join(", "));
    }
    out
}

/// One-line summary of a completed fetch.
pub(super) fn fetch_outcome(outcome: FetchOutcome, app: &App) -> String {
    match outcome {
        FetchOutcome::Loaded(n) => format!("{n} articles, {}", describe_mode(app.feed.mode())),
        FetchOutcome::Empty => app.feed.headline().to_string(),
        FetchOutcome::Failed(kind) => format!("{kind} (type 'retry' to try again)"),
        FetchOutcome::Superseded => "result arrived too late and was discarded".to_string(),
    }
}

pub(super) fn category_outcome(outcome: CategoryOutcome, app: &App) -> String {
    match outcome {
        CategoryOutcome::Cached => format!(
            "{} articles, {} (cached)",
            app.feed.articles().len(),
            describe_mode(app.feed.mode())
        ),
        CategoryOutcome::Fetched(outcome) => fetch_outcome(outcome, app),
        CategoryOutcome::Bookmarks => format!("{} bookmarked articles", app.bookmarks.len()),
    }
}

fn describe_mode(mode: &FeedMode) -> String {
    match mode {
        FeedMode::Category(name) => format!("top headlines in {name}"),
        FeedMode::Search(query) => format!("results for \"{query}\""),
    }
}
