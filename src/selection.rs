//! Which detail views and overlays are open.
//!
//! Each view is an independent slot: opening one never closes another, and a
//! slot's entity exists exactly while the view is visible.

use crate::model::{Article, BlogPost};

/// What the blog editor is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorTarget {
    Create,
    Edit(i64),
}

#[derive(Debug, Default)]
pub struct SelectionCoordinator {
    detail_article: Option<Article>,
    /// The overlay's content is the live bookmark store, so only visibility is tracked.
    bookmark_overlay: bool,
    blog_editor: Option<EditorTarget>,
    blog_detail: Option<BlogPost>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_article(&mut self, article: Article) {
        tracing::debug!(title = %article.title, "Article detail opened");
        self.detail_article = Some(article);
    }

    pub fn close_article(&mut self) {
        self.detail_article = None;
    }

    pub fn detail_article(&self) -> Option<&Article> {
        self.detail_article.as_ref()
    }

    pub fn open_bookmarks(&mut self) {
        self.bookmark_overlay = true;
    }

    pub fn close_bookmarks(&mut self) {
        self.bookmark_overlay = false;
    }

    pub fn bookmarks_visible(&self) -> bool {
        self.bookmark_overlay
    }

    pub fn open_editor(&mut self, target: EditorTarget) {
        self.blog_editor = Some(target);
    }

    pub fn close_editor(&mut self) {
        self.blog_editor = None;
    }

    pub fn editor(&self) -> Option<EditorTarget> {
        self.blog_editor
    }

    /// Id of the post being edited, `None` when creating or closed.
    pub fn editing_id(&self) -> Option<i64> {
        match self.blog_editor {
            Some(EditorTarget::Edit(id)) => Some(id),
            _ => None,
        }
    }

    pub fn open_blog(&mut self, post: BlogPost) {
        self.blog_detail = Some(post);
    }

    pub fn close_blog(&mut self) {
        self.blog_detail = None;
    }

    pub fn blog_detail(&self) -> Option<&BlogPost> {
        self.blog_detail.as_ref()
    }

    /// Drop a blog detail or editor that refers to a deleted post.
    pub fn forget_blog(&mut self, id: i64) {
        if self.blog_detail.as_ref().is_some_and(|p| p.id == id) {
            self.blog_detail = None;
        }
        if self.editing_id() == Some(id) {
            self.blog_editor = None;
        }
    }

    /// Close the most recently relevant view, innermost first.
    ///
    /// Returns `false` when nothing was open.
    pub fn close_top(&mut self) -> bool {
        if self.blog_editor.take().is_some() {
            return true;
        }
        if self.blog_detail.take().is_some() {
            return true;
        }
        if self.detail_article.take().is_some() {
            return true;
        }
        std::mem::take(&mut self.bookmark_overlay)
    }
}
