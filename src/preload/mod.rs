//! Speculative preload cache and its asynchronous data source

pub mod cache;
pub mod source;

pub use cache::{PreloadCache, PreloadEntry};
pub use source::{HttpPreloadSource, PreloadSource, StaticPreloadSource};
