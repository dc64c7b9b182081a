//! Array literals such as `{0: 'a', key: value, 'quoted key': 3}`

use crate::value::{Value, ValueMap};

use super::Node;

#[derive(Debug, Clone)]
pub struct ArrayEntry {
	/// `None` when the key is implied
	pub key: Option<String>,
	pub value: Node,
}

/// Ordered collection literal
#[derive(Debug, Clone, Default)]
pub struct ArrayNode {
	entries: Vec<ArrayEntry>,
}

impl ArrayNode {
	pub fn new(entries: Vec<ArrayEntry>) -> Self {
		Self { entries }
	}

	pub fn entries(&self) -> &[ArrayEntry] {
		&self.entries
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Build a collection value from evaluated entries
///
/// Without any explicit key the result is a list. Otherwise it is a map in which
/// implied keys continue after the largest integer key seen so far.
pub(crate) fn assemble<'k>(entries: impl IntoIterator<Item = (Option<&'k str>, Value)>) -> Value {
	let entries: Vec<(Option<&str>, Value)> = entries.into_iter().collect();
	if entries.iter().all(|(key, _)| key.is_none()) {
		return Value::List(entries.into_iter().map(|(_, value)| value).collect());
	}

	let mut map = ValueMap::with_capacity(entries.len());
	let mut next_index: i64 = 0;
	for (key, value) in entries {
		let key = match key {
			Some(key) => {
				if let Ok(index) = key.parse::<i64>() {
					next_index = next_index.max(index + 1);
				}
				key.to_string()
			}
			None => {
				let key = next_index.to_string();
				next_index += 1;
				key
			}
		};
		map.insert(key, value);
	}
	Value::Map(map)
}
