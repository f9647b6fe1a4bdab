//! newsdesk - a news feed core with bookmarks and a personal blog.
//!
//! The crate is organized around a handful of small components:
//!
//! - [`gateway`] - talks to a news provider and normalizes its JSON into [`model::Article`]
//! - [`feed`] - the feed state machine: category browse, search, cache with TTL
//! - [`storage`] - SQLite-backed persisted collections for bookmarks and blog posts
//! - [`selection`] - which article/blog/overlay is currently open
//! - [`app`] - composition root that wires the pieces together
//!
//! The binary in `main.rs` drives all of this through a line-oriented shell ([`ui`]).

pub mod app;
pub mod clock;
pub mod config;
pub mod feed;
pub mod gateway;
pub mod media;
pub mod model;
pub mod selection;
pub mod storage;
pub mod ui;
pub mod util;
