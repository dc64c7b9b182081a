//! Rendering context and variable scopes
//!
//! A [`RenderingContext`] belongs to exactly one render call. It owns a stack of
//! variable scopes; lookups search from the innermost scope outwards and popping
//! a scope restores the previously visible variables exactly.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::TemplateResult;
use crate::invoker::Invoker;
use crate::resolver::Resolver;
use crate::value::{Value, ValueMap};

/// Stack of variable scopes
#[derive(Debug, Clone)]
pub struct VariableScopes {
	scopes: Vec<ValueMap>,
}

impl Default for VariableScopes {
	fn default() -> Self {
		Self {
			scopes: vec![ValueMap::new()],
		}
	}
}

impl VariableScopes {
	pub fn new() -> Self {
		Self::default()
	}

	/// Innermost visible value of `name`
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.scopes.iter().rev().find_map(|scope| scope.get(name))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Set a variable in the innermost scope
	pub fn set(&mut self, name: impl Into<String>, value: Value) {
		if let Some(scope) = self.scopes.last_mut() {
			scope.insert(name.into(), value);
		}
	}

	/// Remove a variable from the innermost scope
	pub fn remove(&mut self, name: &str) -> Option<Value> {
		self.scopes
			.last_mut()
			.and_then(|scope| scope.shift_remove(name))
	}

	pub fn push(&mut self, variables: ValueMap) {
		self.scopes.push(variables);
	}

	/// Pop the innermost scope; the base scope is never popped
	pub fn pop(&mut self) -> Option<ValueMap> {
		if self.scopes.len() > 1 {
			self.scopes.pop()
		} else {
			None
		}
	}

	/// Number of pushed scopes above the base scope
	pub fn depth(&self) -> usize {
		self.scopes.len() - 1
	}

	/// Every visible variable, inner scopes shadowing outer ones
	pub fn all(&self) -> ValueMap {
		let mut all = ValueMap::new();
		for scope in &self.scopes {
			for (name, value) in scope {
				all.insert(name.clone(), value.clone());
			}
		}
		all
	}
}

/// Per-render state handed to nodes and components
#[derive(Clone)]
pub struct RenderingContext {
	variables: VariableScopes,
	resolver: Arc<Resolver>,
	invoker: Arc<Invoker>,
}

impl RenderingContext {
	pub fn new(resolver: Arc<Resolver>, invoker: Arc<Invoker>) -> Self {
		Self {
			variables: VariableScopes::new(),
			resolver,
			invoker,
		}
	}

	/// Assign any serializable value
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_core::{Engine, Value};
	///
	/// let engine = Engine::new();
	/// let mut context = engine.context();
	/// context.assign("tags", &["a", "b"]).unwrap();
	/// assert_eq!(context.get("tags").and_then(Value::len), Some(2));
	/// ```
	pub fn assign<T: Serialize + ?Sized>(
		&mut self,
		name: impl Into<String>,
		value: &T,
	) -> TemplateResult<&mut Self> {
		let value = Value::from_serialize(value)?;
		self.variables.set(name, value);
		Ok(self)
	}

	/// Set an already converted value in the innermost scope
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		self.variables.set(name, value.into());
		self
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.variables.get(name)
	}

	pub fn variables(&self) -> &VariableScopes {
		&self.variables
	}

	pub fn variables_mut(&mut self) -> &mut VariableScopes {
		&mut self.variables
	}

	pub fn push_scope(&mut self, variables: ValueMap) {
		tracing::trace!(depth = self.variables.depth() + 1, "push variable scope");
		self.variables.push(variables);
	}

	pub fn pop_scope(&mut self) -> Option<ValueMap> {
		tracing::trace!(depth = self.variables.depth(), "pop variable scope");
		self.variables.pop()
	}

	/// Run `body` inside a new scope that is popped on every exit path
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_core::{Engine, Value, ValueMap};
	///
	/// let engine = Engine::new();
	/// let mut context = engine.context();
	/// context.set("x", 1);
	///
	/// let mut scope = ValueMap::new();
	/// scope.insert("x".to_string(), Value::Int(2));
	/// let inner = context.with_scope(scope, |context| context.get("x").cloned());
	///
	/// assert_eq!(inner, Some(Value::Int(2)));
	/// assert_eq!(context.get("x"), Some(&Value::Int(1)));
	/// ```
	pub fn with_scope<T>(&mut self, variables: ValueMap, body: impl FnOnce(&mut Self) -> T) -> T {
		self.push_scope(variables);
		let mut guard = scopeguard::guard(self, |context| {
			context.pop_scope();
		});
		body(&mut **guard)
	}

	pub fn resolver(&self) -> &Arc<Resolver> {
		&self.resolver
	}

	pub fn invoker(&self) -> &Arc<Invoker> {
		&self.invoker
	}
}

impl std::fmt::Debug for RenderingContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RenderingContext")
			.field("variables", &self.variables)
			.finish_non_exhaustive()
	}
}

/// Convenience for building scope maps from name/value pairs
pub fn scope<I, K, V>(entries: I) -> ValueMap
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<Value>,
{
	entries
		.into_iter()
		.map(|(name, value)| (name.into(), value.into()))
		.collect::<IndexMap<_, _>>()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::template::Engine;
	use proptest::prelude::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn context() -> RenderingContext {
		Engine::new().context()
	}

	// =========================================================================
	// VariableScopes
	// =========================================================================

	#[rstest]
	fn test_lookup_falls_back_to_parent_scope() {
		// Arrange
		let mut scopes = VariableScopes::new();
		scopes.set("outer", Value::from("o"));
		scopes.push(scope([("inner", "i")]));

		// Act & Assert
		assert_eq!(scopes.get("outer"), Some(&Value::from("o")));
		assert_eq!(scopes.get("inner"), Some(&Value::from("i")));
		assert_eq!(scopes.depth(), 1);
	}

	#[rstest]
	fn test_base_scope_is_never_popped() {
		let mut scopes = VariableScopes::new();
		scopes.set("x", Value::Int(1));

		assert_eq!(scopes.pop(), None);
		assert_eq!(scopes.get("x"), Some(&Value::Int(1)));
	}

	#[rstest]
	fn test_all_prefers_inner_values() {
		let mut scopes = VariableScopes::new();
		scopes.set("a", Value::Int(1));
		scopes.set("b", Value::Int(2));
		scopes.push(scope([("a", 10)]));

		let all = scopes.all();

		assert_eq!(all.get("a"), Some(&Value::Int(10)));
		assert_eq!(all.get("b"), Some(&Value::Int(2)));
	}

	// =========================================================================
	// Scope hygiene
	// =========================================================================

	#[rstest]
	fn test_with_scope_restores_variables_after_error(mut context: RenderingContext) {
		// Arrange
		context.set("item", "outer");
		let before = context.variables().all();

		// Act
		let result: TemplateResult<()> = context.with_scope(scope([("item", "inner")]), |context| {
			context.set("leaked", true);
			Err(crate::error::TemplateError::component("test", "boom"))
		});

		// Assert
		assert!(result.is_err());
		assert_eq!(context.variables().all(), before);
		assert_eq!(context.variables().depth(), 0);
	}

	proptest! {
		#[test]
		fn prop_nested_push_pop_restores_visible_set(depths in proptest::collection::vec(0usize..4, 1..8)) {
			let mut context = Engine::new().context();
			context.set("root", 0);
			let before = context.variables().all();

			for (level, extra) in depths.iter().enumerate() {
				let variables = (0..*extra)
					.map(|index| (format!("v{}", index), Value::Int(level as i64)))
					.collect::<ValueMap>();
				context.push_scope(variables);
				context.set("root", level as i64);
			}
			for _ in &depths {
				context.pop_scope();
			}

			prop_assert_eq!(context.variables().all(), before);
		}
	}
}
