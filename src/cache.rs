//! Compiled-unit cache module.
//!
//! # Examples
//!
//! ```rust
//! use reinhardt_stencil::cache::{InMemoryTemplateCache, identity_for};
//!
//! let cache = InMemoryTemplateCache::with_capacity(128);
//! let identity = identity_for("index.html", "<h1>{title}</h1>");
//! assert!(!cache.contains(&identity));
//! ```

#[cfg(feature = "cache")]
pub use reinhardt_stencil_cache::*;
