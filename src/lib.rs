//! Character catalog: normalizes the worlds/series/characters document into a
//! deduplicated index and answers search, featured, related-video and
//! detail-navigation requests over it.

pub mod assets;
pub mod character;
pub mod config;
pub mod debounce;
pub mod error;
pub mod featured;
pub mod loader;
pub mod navigation;
pub mod normalize;
pub mod query;
pub mod rating;
pub mod session;
pub mod videos;

pub use catalog_types as types;
pub use error::{CatalogError, Result};
