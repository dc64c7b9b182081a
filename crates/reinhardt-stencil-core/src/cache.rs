//! Compiled-unit storage seam
//!
//! The engine never stores compiled units itself. [`Engine::render_cached`]
//! consults a [`CompiledUnitStore`] and fills it on a miss; implementations
//! decide about eviction, sharing and identity derivation.
//!
//! [`Engine::render_cached`]: crate::Engine::render_cached

use std::fmt;
use std::sync::Arc;

use crate::compiler::CompiledUnit;

/// Key of a compiled unit in a store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateIdentity(String);

impl TemplateIdentity {
	pub fn new(identity: impl Into<String>) -> Self {
		Self(identity.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TemplateIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for TemplateIdentity {
	fn from(identity: &str) -> Self {
		Self::new(identity)
	}
}

/// Storage for compiled units, shared between renders
pub trait CompiledUnitStore: Send + Sync {
	fn get(&self, identity: &TemplateIdentity) -> Option<Arc<CompiledUnit>>;

	fn put(&self, identity: &TemplateIdentity, unit: Arc<CompiledUnit>);
}
