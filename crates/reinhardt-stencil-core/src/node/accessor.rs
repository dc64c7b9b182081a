//! Object accessor paths
//!
//! `user.address.city`, `items.0` and `labels.{locale}` are accessor paths.
//! A path is resolved against the visible variables at evaluation time;
//! missing keys resolve to `null`. The reserved root `_all` yields every visible
//! variable as a map.

use std::fmt;

use crate::context::VariableScopes;
use crate::value::Value;

/// Reserved root segment exposing all visible variables
pub const ALL_VARIABLES: &str = "_all";

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
	Key(String),
	/// Nested accessor whose string value is used as key
	Dynamic(ObjectAccessor),
}

/// Dotted property/index path
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAccessor {
	segments: Vec<PathSegment>,
}

impl ObjectAccessor {
	/// Accessor for a single variable name
	pub fn variable(name: impl Into<String>) -> Self {
		Self {
			segments: vec![PathSegment::Key(name.into())],
		}
	}

	/// Parse a complete accessor path
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_core::ObjectAccessor;
	///
	/// let accessor = ObjectAccessor::parse("user.{field}.length").unwrap();
	/// assert_eq!(accessor.to_string(), "user.{field}.length");
	/// assert!(ObjectAccessor::parse("user.").is_none());
	/// assert!(ObjectAccessor::parse("a b").is_none());
	/// ```
	pub fn parse(path: &str) -> Option<Self> {
		match Self::parse_prefix(path.as_bytes(), 0) {
			Some((accessor, end)) if end == path.len() => Some(accessor),
			_ => None,
		}
	}

	/// Parse the longest accessor starting at `start`, returning it with its end offset
	pub(crate) fn parse_prefix(bytes: &[u8], start: usize) -> Option<(Self, usize)> {
		let mut segments = Vec::new();
		let mut index = start;
		loop {
			if bytes.get(index) == Some(&b'{') {
				let (inner, end) = Self::parse_prefix(bytes, index + 1)?;
				if bytes.get(end) != Some(&b'}') {
					return None;
				}
				segments.push(PathSegment::Dynamic(inner));
				index = end + 1;
			} else {
				let length = identifier_length(bytes, index);
				if length == 0 {
					return None;
				}
				let key = std::str::from_utf8(&bytes[index..index + length]).ok()?;
				segments.push(PathSegment::Key(key.to_string()));
				index += length;
			}

			let continues = bytes.get(index) == Some(&b'.')
				&& bytes
					.get(index + 1)
					.is_some_and(|next| *next == b'{' || is_identifier_byte(*next));
			if !continues {
				return Some((Self { segments }, index));
			}
			index += 1;
		}
	}

	pub fn segments(&self) -> &[PathSegment] {
		&self.segments
	}

	/// Name of the root variable, when it is static
	pub fn root(&self) -> Option<&str> {
		match self.segments.first() {
			Some(PathSegment::Key(key)) => Some(key),
			_ => None,
		}
	}

	/// Resolve against the visible variables; missing paths yield `null`
	pub fn resolve(&self, variables: &VariableScopes) -> Value {
		let keys: Vec<String> = self
			.segments
			.iter()
			.map(|segment| match segment {
				PathSegment::Key(key) => key.clone(),
				PathSegment::Dynamic(inner) => inner.resolve(variables).to_output_string(),
			})
			.collect();
		let Some((first, rest)) = keys.split_first() else {
			return Value::Null;
		};

		let all;
		let mut current = if first == ALL_VARIABLES {
			all = Value::Map(variables.all());
			Some(&all)
		} else {
			variables.get(first)
		};
		for key in rest {
			current = current.and_then(|value| value.get(key));
		}
		current.cloned().unwrap_or_default()
	}
}

impl fmt::Display for ObjectAccessor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (index, segment) in self.segments.iter().enumerate() {
			if index > 0 {
				f.write_str(".")?;
			}
			match segment {
				PathSegment::Key(key) => f.write_str(key)?,
				PathSegment::Dynamic(inner) => write!(f, "{{{}}}", inner)?,
			}
		}
		Ok(())
	}
}

fn is_identifier_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

/// Identifier length at `start`; a `-` directly followed by `>` ends the identifier
fn identifier_length(bytes: &[u8], start: usize) -> usize {
	let mut index = start;
	while let Some(&byte) = bytes.get(index) {
		if !is_identifier_byte(byte) || byte == b'-' && bytes.get(index + 1) == Some(&b'>') {
			break;
		}
		index += 1;
	}
	index - start
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::scope;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn variables() -> VariableScopes {
		let mut variables = VariableScopes::new();
		let user = Value::from(json!({"name": "Ada", "tags": ["x", "y"], "field": "name"}));
		variables.set("user", user);
		variables.set("field", Value::from("name"));
		variables
	}

	#[rstest]
	#[case("user.name", Value::from("Ada"))]
	#[case("user.tags.1", Value::from("y"))]
	#[case("user.{field}", Value::from("Ada"))]
	#[case("user.{user.field}", Value::from("Ada"))]
	#[case("user.missing.deeper", Value::Null)]
	#[case("nobody", Value::Null)]
	#[case("_all.field", Value::from("name"))]
	fn test_resolve(variables: VariableScopes, #[case] path: &str, #[case] expected: Value) {
		// Arrange
		let accessor = ObjectAccessor::parse(path).unwrap();

		// Act
		let value = accessor.resolve(&variables);

		// Assert
		assert_eq!(value, expected);
	}

	#[rstest]
	fn test_inner_scope_shadows_outer(mut variables: VariableScopes) {
		variables.push(scope([("field", "tags")]));

		let value = ObjectAccessor::parse("user.{field}.0")
			.unwrap()
			.resolve(&variables);

		assert_eq!(value, Value::from("x"));
	}

	#[rstest]
	#[case("a->f:x()", "a", 1)]
	#[case("a.b|f", "a.b", 3)]
	#[case("a.", "a", 1)]
	#[case("data-id", "data-id", 7)]
	fn test_parse_prefix_stops_at_operators(
		#[case] input: &str,
		#[case] expected: &str,
		#[case] end: usize,
	) {
		let (accessor, parsed_end) = ObjectAccessor::parse_prefix(input.as_bytes(), 0).unwrap();

		assert_eq!(accessor.to_string(), expected);
		assert_eq!(parsed_end, end);
	}
}
