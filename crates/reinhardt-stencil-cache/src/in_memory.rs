//! In-memory compiled-unit cache

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;
use reinhardt_stencil_core::{
	CompiledUnit, CompiledUnitStore, Engine, RenderingContext, TemplateIdentity, TemplateResult,
};

use crate::identity::identity_for;
use crate::statistics::CacheStatistics;

/// Compiled units keyed by identity, least recently used first
type Entries = IndexMap<TemplateIdentity, Arc<CompiledUnit>>;

/// Thread-safe store of compiled units
///
/// Without a capacity the cache grows without bound. With one, storing a new
/// unit beyond the capacity evicts the least recently used unit.
/// [`InMemoryTemplateCache::get_or_compile`] compiles each identity at most
/// once at a time, even when many threads miss it together.
#[derive(Debug, Default)]
pub struct InMemoryTemplateCache {
	entries: Mutex<Entries>,
	capacity: Option<usize>,
	/// One gate per identity currently being compiled
	in_flight: Mutex<HashMap<TemplateIdentity, Arc<Mutex<()>>>>,
	hits: AtomicU64,
	misses: AtomicU64,
	compilations: AtomicU64,
	evictions: AtomicU64,
}

impl InMemoryTemplateCache {
	/// Create an unbounded cache
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_cache::InMemoryTemplateCache;
	///
	/// let cache = InMemoryTemplateCache::new();
	/// assert!(cache.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a cache holding at most `capacity` units
	///
	/// A capacity of zero stores nothing.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			capacity: Some(capacity),
			..Self::default()
		}
	}

	pub fn capacity(&self) -> Option<usize> {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	pub fn contains(&self, identity: &TemplateIdentity) -> bool {
		self.entries.lock().contains_key(identity)
	}

	/// Identities from least to most recently used
	pub fn identities(&self) -> Vec<TemplateIdentity> {
		self.entries.lock().keys().cloned().collect()
	}

	pub fn remove(&self, identity: &TemplateIdentity) -> Option<Arc<CompiledUnit>> {
		self.entries.lock().shift_remove(identity)
	}

	/// Drop every unit; statistics are kept
	pub fn clear(&self) {
		self.entries.lock().clear();
	}

	/// Get cache statistics
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_cache::InMemoryTemplateCache;
	/// use reinhardt_stencil_core::{CompiledUnitStore, TemplateIdentity};
	///
	/// let cache = InMemoryTemplateCache::new();
	/// assert!(cache.get(&TemplateIdentity::new("missing")).is_none());
	///
	/// let stats = cache.statistics();
	/// assert_eq!(stats.misses, 1);
	/// assert_eq!(stats.total_requests, 1);
	/// ```
	pub fn statistics(&self) -> CacheStatistics {
		let hits = self.hits.load(Ordering::Relaxed);
		let misses = self.misses.load(Ordering::Relaxed);
		CacheStatistics {
			hits,
			misses,
			total_requests: hits + misses,
			entry_count: self.len() as u64,
			compilations: self.compilations.load(Ordering::Relaxed),
			evictions: self.evictions.load(Ordering::Relaxed),
		}
	}

	/// Look up a unit without touching statistics or recency
	fn peek(&self, identity: &TemplateIdentity) -> Option<Arc<CompiledUnit>> {
		self.entries.lock().get(identity).cloned()
	}

	/// Return the stored unit or compile, store and return a new one
	///
	/// Concurrent callers missing the same identity wait for a single
	/// compilation instead of compiling in parallel. A failed compilation is not
	/// stored; the next caller compiles again.
	pub fn get_or_compile<F>(
		&self,
		identity: &TemplateIdentity,
		compile: F,
	) -> TemplateResult<Arc<CompiledUnit>>
	where
		F: FnOnce() -> TemplateResult<CompiledUnit>,
	{
		if let Some(unit) = self.get(identity) {
			return Ok(unit);
		}

		let gate = Arc::clone(
			self.in_flight
				.lock()
				.entry(identity.clone())
				.or_insert_with(|| Arc::new(Mutex::new(()))),
		);
		let result = {
			let _compiling = gate.lock();
			match self.peek(identity) {
				Some(unit) => {
					tracing::trace!(identity = %identity, "compiled by a concurrent caller");
					Ok(unit)
				}
				None => compile().map(|unit| {
					self.compilations.fetch_add(1, Ordering::Relaxed);
					let unit = Arc::new(unit);
					self.put(identity, Arc::clone(&unit));
					unit
				}),
			}
		};
		self.in_flight.lock().remove(identity);
		result
	}

	/// Parse, compile and cache `source` under its content identity, then render it
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_cache::InMemoryTemplateCache;
	/// use reinhardt_stencil_core::Engine;
	///
	/// let engine = Engine::new();
	/// let cache = InMemoryTemplateCache::new();
	/// let mut context = engine.context();
	/// context.set("name", "Ada");
	///
	/// for _ in 0..3 {
	///     let output = cache.render(&engine, "greeting", "Hi {name}", &mut context).unwrap();
	///     assert_eq!(output, "Hi Ada");
	/// }
	/// assert_eq!(cache.statistics().compilations, 1);
	/// assert_eq!(cache.statistics().hits, 2);
	/// ```
	pub fn render(
		&self,
		engine: &Engine,
		name: &str,
		source: &str,
		context: &mut RenderingContext,
	) -> TemplateResult<String> {
		let identity = identity_for(name, source);
		let unit = self.get_or_compile(&identity, || {
			let parsed = engine.parse_named(name, source)?;
			Ok(engine.compile(&parsed))
		})?;
		unit.render(context)
	}
}

impl CompiledUnitStore for InMemoryTemplateCache {
	fn get(&self, identity: &TemplateIdentity) -> Option<Arc<CompiledUnit>> {
		let mut entries = self.entries.lock();
		match entries.get_index_of(identity) {
			Some(index) => {
				let last = entries.len() - 1;
				entries.move_index(index, last);
				self.hits.fetch_add(1, Ordering::Relaxed);
				entries.get_index(last).map(|(_, unit)| Arc::clone(unit))
			}
			None => {
				self.misses.fetch_add(1, Ordering::Relaxed);
				None
			}
		}
	}

	fn put(&self, identity: &TemplateIdentity, unit: Arc<CompiledUnit>) {
		if self.capacity == Some(0) {
			return;
		}
		let mut entries = self.entries.lock();
		entries.shift_remove(identity);
		entries.insert(identity.clone(), unit);
		if let Some(capacity) = self.capacity {
			while entries.len() > capacity {
				if let Some((evicted, _)) = entries.shift_remove_index(0) {
					self.evictions.fetch_add(1, Ordering::Relaxed);
					tracing::debug!(identity = %evicted, "evicting compiled unit");
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use reinhardt_stencil_core::{Node, TemplateError};
	use rstest::{fixture, rstest};
	use std::sync::Barrier;
	use std::thread;

	fn unit(text: &str) -> Arc<CompiledUnit> {
		Arc::new(CompiledUnit::compile(None, &Node::text(text)))
	}

	fn identity(name: &str) -> TemplateIdentity {
		TemplateIdentity::new(name)
	}

	#[fixture]
	fn cache() -> InMemoryTemplateCache {
		InMemoryTemplateCache::new()
	}

	#[rstest]
	fn test_get_counts_hits_and_misses(cache: InMemoryTemplateCache) {
		// Arrange
		cache.put(&identity("a"), unit("A"));

		// Act
		let hit = cache.get(&identity("a"));
		let miss = cache.get(&identity("b"));

		// Assert
		assert!(hit.is_some());
		assert!(miss.is_none());
		let stats = cache.statistics();
		assert_eq!((stats.hits, stats.misses, stats.entry_count), (1, 1, 1));
	}

	#[rstest]
	fn test_capacity_evicts_least_recently_used() {
		// Arrange
		let cache = InMemoryTemplateCache::with_capacity(2);
		cache.put(&identity("a"), unit("A"));
		cache.put(&identity("b"), unit("B"));

		// Act
		cache.get(&identity("a"));
		cache.put(&identity("c"), unit("C"));

		// Assert
		assert_eq!(cache.identities(), vec![identity("a"), identity("c")]);
		assert_eq!(cache.statistics().evictions, 1);
	}

	#[rstest]
	fn test_zero_capacity_stores_nothing() {
		let cache = InMemoryTemplateCache::with_capacity(0);

		cache.put(&identity("a"), unit("A"));

		assert!(cache.is_empty());
	}

	#[rstest]
	fn test_failed_compilation_is_not_stored(cache: InMemoryTemplateCache) {
		// Act
		let result = cache.get_or_compile(&identity("a"), || {
			Err(TemplateError::component("test", "broken"))
		});

		// Assert
		assert!(result.is_err());
		assert!(!cache.contains(&identity("a")));
		assert_eq!(cache.statistics().compilations, 0);
	}

	#[rstest]
	fn test_concurrent_misses_compile_once(cache: InMemoryTemplateCache) {
		// Arrange
		let cache = Arc::new(cache);
		let barrier = Arc::new(Barrier::new(8));

		// Act
		let handles: Vec<_> = (0..8)
			.map(|_| {
				let cache = Arc::clone(&cache);
				let barrier = Arc::clone(&barrier);
				thread::spawn(move || {
					barrier.wait();
					cache
						.get_or_compile(&identity("shared"), || {
							thread::sleep(std::time::Duration::from_millis(20));
							Ok(CompiledUnit::compile(None, &Node::text("S")))
						})
						.map(|_| ())
				})
			})
			.collect();
		for handle in handles {
			handle.join().unwrap().unwrap();
		}

		// Assert
		assert_eq!(cache.statistics().compilations, 1);
		assert_eq!(cache.len(), 1);
	}
}
