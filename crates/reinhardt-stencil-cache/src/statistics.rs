//! Cache statistics

/// Snapshot of the counters of an [`InMemoryTemplateCache`](crate::InMemoryTemplateCache)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
	pub hits: u64,
	pub misses: u64,
	pub total_requests: u64,
	/// Current number of stored units
	pub entry_count: u64,
	/// Units compiled through `get_or_compile`
	pub compilations: u64,
	/// Units dropped to respect the capacity
	pub evictions: u64,
}

impl CacheStatistics {
	/// Calculate hit rate (0.0 to 1.0)
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_cache::CacheStatistics;
	///
	/// let stats = CacheStatistics {
	///     hits: 3,
	///     misses: 1,
	///     total_requests: 4,
	///     ..CacheStatistics::default()
	/// };
	/// assert_eq!(stats.hit_rate(), 0.75);
	/// ```
	pub fn hit_rate(&self) -> f64 {
		if self.total_requests == 0 {
			0.0
		} else {
			self.hits as f64 / self.total_requests as f64
		}
	}

	pub fn miss_rate(&self) -> f64 {
		if self.total_requests == 0 {
			0.0
		} else {
			self.misses as f64 / self.total_requests as f64
		}
	}
}
