use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Articles
// ============================================================================

/// Where an article came from, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
}

/// A provider article after normalization.
///
/// Providers do not hand out stable identifiers, so `title` doubles as the
/// identity key for bookmarks. Two different stories sharing a headline will
/// collide; see [`Article::same_story`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: String,
    pub source: Source,
    pub published_at: DateTime<Utc>,
}

impl Article {
    /// Identity comparison used by the bookmark collection (title only).
    pub fn same_story(&self, other: &Article) -> bool {
        self.title == other.title
    }
}

// ============================================================================
// Blog posts
// ============================================================================

/// A user-authored post.
///
/// `id` and `created_at` are fixed at creation; `updated_at` moves on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Form input for creating or editing a post.
///
/// `image` is whatever embeddable string the image collaborator produced.
/// An empty or missing image is replaced by a placeholder on create and
/// leaves the current image untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogDraft {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
}

impl BlogDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// The image reference, if one was actually supplied.
    pub fn supplied_image(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_article() -> Article {
        Article {
            title: "Rust 2.0 announced".to_string(),
            image: None,
            description: Some("desc".to_string()),
            content: None,
            url: "https://example.com/rust".to_string(),
            source: Source {
                name: "Example".to_string(),
            },
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_article_serializes_camel_case() {
        let json = serde_json::to_value(sample_article()).unwrap();
        assert!(json.get("publishedAt").is_some());
        assert!(json.get("published_at").is_none());
        assert_eq!(json["source"]["name"], "Example");
    }

    #[test]
    fn test_same_story_ignores_everything_but_title() {
        let a = sample_article();
        let mut b = sample_article();
        b.url = "https://other.example.com/".to_string();
        b.description = None;
        assert!(a.same_story(&b));

        b.title = "Something else".to_string();
        assert!(!a.same_story(&b));
    }

    #[test]
    fn test_blog_post_json_shape() {
        let post = BlogPost {
            id: 1,
            title: "T".to_string(),
            content: "C".to_string(),
            image: "img".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());

        let back: BlogPost = serde_json::from_value(json).unwrap();
        assert_eq!(back, post);
    }

    #[test]
    fn test_draft_supplied_image_ignores_blank() {
        assert_eq!(BlogDraft::new("t", "c").supplied_image(), None);
        assert_eq!(BlogDraft::new("t", "c").with_image("  ").supplied_image(), None);
        assert_eq!(
            BlogDraft::new("t", "c").with_image("data:x").supplied_image(),
            Some("data:x")
        );
    }
}
