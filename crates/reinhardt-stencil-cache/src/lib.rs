//! # Reinhardt Stencil Cache
//!
//! In-memory [`CompiledUnitStore`](reinhardt_stencil_core::CompiledUnitStore)
//! for stencil templates.
//!
//! ## Features
//!
//! - **Content identities**: [`identity_for`] combines the template name with a
//!   SHA-256 fingerprint of its source
//! - **Statistics**: hits, misses, compilations and evictions
//! - **Capacity**: optional least-recently-used bound
//! - **Single flight**: concurrent misses of one identity compile once
//!
//! ## Example
//!
//! ```
//! use reinhardt_stencil_cache::{InMemoryTemplateCache, identity_for};
//! use reinhardt_stencil_core::Engine;
//!
//! let engine = Engine::new();
//! let cache = InMemoryTemplateCache::with_capacity(64);
//! let source = "<p>{message}</p>";
//! let identity = identity_for("message.html", source);
//!
//! let mut context = engine.context();
//! context.set("message", "a < b");
//! let output = engine.render_cached(&cache, &identity, source, &mut context).unwrap();
//!
//! assert_eq!(output, "<p>a &lt; b</p>");
//! assert!(cache.contains(&identity));
//! ```

mod identity;
mod in_memory;
mod statistics;

pub use identity::{content_hash, identity_for};
pub use in_memory::InMemoryTemplateCache;
pub use statistics::CacheStatistics;
