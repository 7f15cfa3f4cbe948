//! Domain layer for the meme stream: the served `Item`, the refresh-throttled
//! `ContentCache`, and the upstream gateway that fills it.
//!
//! The cache only knows the `ContentSource` trait. The production source is
//! `gateway::reddit::RedditClient`; tests inject their own.

pub mod content_cache;
pub mod error;
pub mod gateway;
pub mod item;

pub use content_cache::{ContentCache, ContentSource};
pub use item::Item;
