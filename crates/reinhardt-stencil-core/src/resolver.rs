//! Component resolution
//!
//! The [`Resolver`] maps a namespace alias plus a dotted call name to a
//! component. Each alias points at one or more targets (searched most recently
//! registered first). For every target, registered [`ResolverDelegate`]s whose
//! namespace covers the target are asked first, most specific first; then the
//! default convention is applied:
//!
//! ```text
//! alias f -> target reinhardt::stencil::components
//! f:format.raw -> reinhardt::stencil::components::FormatRawComponent
//! ```
//!
//! Argument contracts are computed once per component type and shared through
//! the injected [`ContractCache`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::component::{ArgumentContract, ArgumentRegistrar, Component, ResolvedComponent};
use crate::config::{DEFAULT_COMPONENT_SUFFIX, EngineConfig};
use crate::error::{ArgumentContractError, ResolutionError};
use crate::suggest::suggest_similar;

/// A component produced by a delegate, together with its type name
#[derive(Clone)]
pub struct ComponentType {
	pub type_name: String,
	pub component: Arc<dyn Component>,
}

impl ComponentType {
	pub fn new(type_name: impl Into<String>, component: impl Component + 'static) -> Self {
		Self {
			type_name: type_name.into(),
			component: Arc::new(component),
		}
	}
}

/// Pluggable resolution strategy for one namespace
pub trait ResolverDelegate: Send + Sync {
	/// Namespace covered by this delegate; it also covers nested namespaces
	fn namespace(&self) -> &str;

	/// `Ok(None)` passes the call name on to the next strategy
	fn resolve(&self, call_name: &str) -> Result<Option<ComponentType>, ResolutionError>;
}

/// Compute-once cache of argument contracts keyed by component type name
#[derive(Debug, Default)]
pub struct ContractCache {
	entries: RwLock<HashMap<String, Arc<OnceCell<Arc<ArgumentContract>>>>>,
	computations: AtomicUsize,
}

impl ContractCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Return the cached contract or compute it exactly once
	pub fn get_or_compute(
		&self,
		type_name: &str,
		compute: impl FnOnce() -> Result<ArgumentContract, ArgumentContractError>,
	) -> Result<Arc<ArgumentContract>, ArgumentContractError> {
		let cell = self.cell(type_name);
		cell.get_or_try_init(|| {
			self.computations.fetch_add(1, Ordering::Relaxed);
			tracing::debug!(component = type_name, "computing argument contract");
			compute().map(Arc::new)
		})
		.cloned()
	}

	fn cell(&self, type_name: &str) -> Arc<OnceCell<Arc<ArgumentContract>>> {
		if let Some(cell) = self.entries.read().get(type_name) {
			return Arc::clone(cell);
		}
		Arc::clone(
			self.entries
				.write()
				.entry(type_name.to_string())
				.or_default(),
		)
	}

	/// Number of contracts computed so far
	pub fn computations(&self) -> usize {
		self.computations.load(Ordering::Relaxed)
	}

	pub fn len(&self) -> usize {
		self.entries
			.read()
			.values()
			.filter(|cell| cell.get().is_some())
			.count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		self.entries.write().clear();
	}
}

/// Explicitly registered components keyed by fully qualified type name
#[derive(Default)]
pub struct ComponentRegistry {
	components: RwLock<HashMap<String, Arc<dyn Component>>>,
}

impl ComponentRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, type_name: impl Into<String>, component: Arc<dyn Component>) {
		let type_name = type_name.into();
		tracing::debug!(component = %type_name, "registering component");
		self.components.write().insert(type_name, component);
	}

	pub fn get(&self, type_name: &str) -> Option<Arc<dyn Component>> {
		self.components.read().get(type_name).cloned()
	}

	pub fn contains(&self, type_name: &str) -> bool {
		self.components.read().contains_key(type_name)
	}

	pub fn type_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.components.read().keys().cloned().collect();
		names.sort();
		names
	}
}

/// Conventional type name of `call_name` inside `target`
///
/// # Examples
///
/// ```
/// use reinhardt_stencil_core::conventional_type_name;
///
/// assert_eq!(
///     conventional_type_name("app::components", "format.raw", "Component"),
///     "app::components::FormatRawComponent"
/// );
/// ```
pub fn conventional_type_name(target: &str, call_name: &str, suffix: &str) -> String {
	let mut name = String::with_capacity(target.len() + call_name.len() + suffix.len() + 2);
	name.push_str(target);
	name.push_str("::");
	for segment in call_name.split('.') {
		let mut chars = segment.chars();
		if let Some(first) = chars.next() {
			name.extend(first.to_uppercase());
			name.push_str(chars.as_str());
		}
	}
	name.push_str(suffix);
	name
}

/// Inverse of [`conventional_type_name`] for suggestion purposes
fn conventional_call_name(type_name: &str, target: &str, suffix: &str) -> Option<String> {
	let local = type_name
		.strip_prefix(target)?
		.strip_prefix("::")?
		.strip_suffix(suffix)?;
	let mut call_name = String::new();
	for (index, c) in local.char_indices() {
		if c.is_uppercase() {
			if index > 0 {
				call_name.push('.');
			}
			call_name.extend(c.to_lowercase());
		} else {
			call_name.push(c);
		}
	}
	Some(call_name)
}

pub(crate) fn matches_pattern(pattern: &str, alias: &str) -> bool {
	match pattern.strip_suffix('*') {
		Some(prefix) => alias.starts_with(prefix),
		None => pattern == alias,
	}
}

fn covers(namespace: &str, target: &str) -> bool {
	target == namespace
		|| target
			.strip_prefix(namespace)
			.is_some_and(|rest| rest.starts_with("::"))
}

/// Maps namespace aliases and call names to components
pub struct Resolver {
	namespaces: RwLock<IndexMap<String, Vec<String>>>,
	ignored: RwLock<Vec<String>>,
	registry: ComponentRegistry,
	delegates: RwLock<Vec<Arc<dyn ResolverDelegate>>>,
	contracts: Arc<ContractCache>,
	suffix: String,
}

impl Default for Resolver {
	fn default() -> Self {
		Self::new(Arc::new(ContractCache::new()))
	}
}

impl Resolver {
	/// Create a resolver sharing the given contract cache
	pub fn new(contracts: Arc<ContractCache>) -> Self {
		Self {
			namespaces: RwLock::new(IndexMap::new()),
			ignored: RwLock::new(Vec::new()),
			registry: ComponentRegistry::new(),
			delegates: RwLock::new(Vec::new()),
			contracts,
			suffix: DEFAULT_COMPONENT_SUFFIX.to_string(),
		}
	}

	/// Create a resolver with the namespaces and suffix of `config`
	pub fn from_config(config: &EngineConfig, contracts: Arc<ContractCache>) -> Self {
		let mut resolver = Self::new(contracts);
		resolver.suffix = config.component_suffix.clone();
		for (alias, targets) in &config.namespaces {
			for target in targets {
				resolver.register_namespace(alias, target);
			}
		}
		for pattern in &config.ignored_namespaces {
			resolver.ignore_namespace(pattern);
		}
		resolver
	}

	pub fn suffix(&self) -> &str {
		&self.suffix
	}

	pub fn contracts(&self) -> &Arc<ContractCache> {
		&self.contracts
	}

	/// Add `target` to the targets of `alias`; later targets are searched first
	pub fn register_namespace(&self, alias: &str, target: &str) {
		tracing::debug!(alias, target, "registering namespace");
		let mut namespaces = self.namespaces.write();
		let targets = namespaces.entry(alias.to_string()).or_default();
		targets.retain(|existing| existing != target);
		targets.push(target.to_string());
	}

	/// Ignore an alias, or every alias starting with a prefix when `pattern` ends with `*`
	pub fn ignore_namespace(&self, pattern: &str) {
		tracing::debug!(pattern, "ignoring namespace");
		let mut ignored = self.ignored.write();
		if !ignored.iter().any(|existing| existing == pattern) {
			ignored.push(pattern.to_string());
		}
	}

	pub fn is_ignored(&self, alias: &str) -> bool {
		self.ignored
			.read()
			.iter()
			.any(|pattern| matches_pattern(pattern, alias))
	}

	/// `Ok(true)` for registered aliases, `Ok(false)` for ignored ones
	pub fn is_namespace_valid(&self, alias: &str) -> Result<bool, ResolutionError> {
		if self.namespaces.read().contains_key(alias) {
			return Ok(true);
		}
		if self.is_ignored(alias) {
			return Ok(false);
		}
		Err(self.unknown_namespace(alias, &[]))
	}

	pub(crate) fn unknown_namespace(&self, alias: &str, extra: &[&str]) -> ResolutionError {
		let mut known: Vec<String> = self.namespaces.read().keys().cloned().collect();
		known.extend(extra.iter().map(|alias| alias.to_string()));
		ResolutionError::UnknownNamespace {
			alias: alias.to_string(),
			suggestion: suggest_similar(alias, &known),
			location: None,
		}
	}

	/// Targets of `alias`, most recently registered first
	pub fn targets(&self, alias: &str) -> Vec<String> {
		self.namespaces
			.read()
			.get(alias)
			.map(|targets| targets.iter().rev().cloned().collect())
			.unwrap_or_default()
	}

	/// Register a component under an explicit type name
	pub fn register_component(&self, type_name: impl Into<String>, component: impl Component + 'static) {
		self.registry.register(type_name, Arc::new(component));
	}

	/// Register a component under the conventional name of `call_name` in `target`
	pub fn register_component_in(
		&self,
		target: &str,
		call_name: &str,
		component: impl Component + 'static,
	) {
		let type_name = conventional_type_name(target, call_name, &self.suffix);
		self.register_component(type_name, component);
	}

	pub fn register_delegate(&self, delegate: impl ResolverDelegate + 'static) {
		self.register_shared_delegate(Arc::new(delegate));
	}

	pub fn register_shared_delegate(&self, delegate: Arc<dyn ResolverDelegate>) {
		tracing::debug!(namespace = delegate.namespace(), "registering resolver delegate");
		self.delegates.write().push(delegate);
	}

	pub fn registry(&self) -> &ComponentRegistry {
		&self.registry
	}

	/// Resolve a call against the globally registered namespaces
	pub fn resolve(
		&self,
		alias: &str,
		call_name: &str,
	) -> Result<Arc<ResolvedComponent>, ResolutionError> {
		if !self.is_namespace_valid(alias)? {
			return Err(ResolutionError::UnknownNamespace {
				alias: alias.to_string(),
				suggestion: None,
				location: None,
			});
		}
		self.resolve_in(alias, &self.targets(alias), call_name)
	}

	/// Resolve a call against an explicit list of targets, searched in order
	pub fn resolve_in(
		&self,
		alias: &str,
		targets: &[String],
		call_name: &str,
	) -> Result<Arc<ResolvedComponent>, ResolutionError> {
		let mut searched = Vec::with_capacity(targets.len());
		for target in targets {
			if let Some(found) = self.ask_delegates(target, call_name)? {
				return self.finish(found.type_name, found.component);
			}
			let type_name = conventional_type_name(target, call_name, &self.suffix);
			if let Some(component) = self.registry.get(&type_name) {
				return self.finish(type_name, component);
			}
			searched.push(type_name);
		}

		let candidates: Vec<String> = self
			.registry
			.type_names()
			.iter()
			.filter_map(|type_name| {
				targets
					.iter()
					.find_map(|target| conventional_call_name(type_name, target, &self.suffix))
			})
			.collect();
		Err(ResolutionError::UnknownComponent {
			alias: alias.to_string(),
			name: call_name.to_string(),
			searched,
			suggestion: suggest_similar(call_name, &candidates)
				.map(|name| format!("{}:{}", alias, name)),
			location: None,
		})
	}

	fn ask_delegates(
		&self,
		target: &str,
		call_name: &str,
	) -> Result<Option<ComponentType>, ResolutionError> {
		let mut delegates: Vec<Arc<dyn ResolverDelegate>> = self
			.delegates
			.read()
			.iter()
			.filter(|delegate| covers(delegate.namespace(), target))
			.cloned()
			.collect();
		delegates.sort_by_key(|delegate| std::cmp::Reverse(delegate.namespace().len()));

		for delegate in delegates {
			if let Some(found) = delegate.resolve(call_name)? {
				tracing::trace!(
					namespace = delegate.namespace(),
					call_name,
					component = %found.type_name,
					"resolved through delegate"
				);
				return Ok(Some(found));
			}
		}
		Ok(None)
	}

	fn finish(
		&self,
		type_name: String,
		component: Arc<dyn Component>,
	) -> Result<Arc<ResolvedComponent>, ResolutionError> {
		let contract = self
			.contracts
			.get_or_compute(&type_name, || {
				let mut registrar = ArgumentRegistrar::new(type_name.clone());
				component.register_arguments(&mut registrar)?;
				Ok(registrar.into_contract())
			})
			.map_err(|source| ResolutionError::Contract {
				type_name: type_name.clone(),
				source,
			})?;
		tracing::trace!(component = %type_name, "resolved component");
		Ok(Arc::new(ResolvedComponent::new(type_name, component, contract)))
	}
}
