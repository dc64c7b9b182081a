//! Runtime value model
//!
//! Every node evaluates to a [`Value`]. Host data enters the engine through
//! `serde`, so anything implementing [`Serialize`] can be assigned to a
//! rendering context.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TemplateResult;

/// Ordered map of values keyed by string
pub type ValueMap = IndexMap<String, Value>;

/// A dynamically typed template value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	List(Vec<Value>),
	Map(ValueMap),
}

impl Value {
	/// Convert any serializable host value
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_core::Value;
	///
	/// #[derive(serde::Serialize)]
	/// struct User { name: &'static str, age: u32 }
	///
	/// let value = Value::from_serialize(&User { name: "Ada", age: 36 }).unwrap();
	/// assert_eq!(value.get("name"), Some(&Value::from("Ada")));
	/// assert_eq!(value.get("age"), Some(&Value::Int(36)));
	/// ```
	pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> TemplateResult<Self> {
		Ok(serde_json::to_value(value)?.into())
	}

	/// Canonical type name used in argument contract errors
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "boolean",
			Self::Int(_) => "integer",
			Self::Float(_) => "float",
			Self::String(_) => "string",
			Self::List(_) => "list",
			Self::Map(_) => "map",
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Whether the value is a list or a map
	pub fn is_collection(&self) -> bool {
		matches!(self, Self::List(_) | Self::Map(_))
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	/// Truthiness as used by conditions
	///
	/// Strings are falsy when their trimmed, lowercased form is empty, `false` or `0`.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Null => false,
			Self::Bool(b) => *b,
			Self::Int(i) => *i != 0,
			Self::Float(f) => *f != 0.0,
			Self::String(s) => {
				let normalized = s.trim().to_lowercase();
				!(normalized.is_empty() || normalized == "false" || normalized == "0")
			}
			Self::List(items) => !items.is_empty(),
			Self::Map(entries) => !entries.is_empty(),
		}
	}

	/// Number of elements for collections, `None` otherwise
	pub fn len(&self) -> Option<usize> {
		match self {
			Self::List(items) => Some(items.len()),
			Self::Map(entries) => Some(entries.len()),
			_ => None,
		}
	}

	/// Look up a map key or a list index
	pub fn get(&self, key: &str) -> Option<&Value> {
		match self {
			Self::Map(entries) => entries.get(key),
			Self::List(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
			_ => None,
		}
	}

	/// Iterate over `(key, value)` pairs of a collection
	///
	/// Lists yield their integer index as key. Scalars yield nothing.
	pub fn entries(&self) -> Vec<(Value, &Value)> {
		match self {
			Self::List(items) => items
				.iter()
				.enumerate()
				.map(|(index, item)| (Value::Int(index as i64), item))
				.collect(),
			Self::Map(entries) => entries
				.iter()
				.map(|(key, item)| (Value::String(key.clone()), item))
				.collect(),
			_ => Vec::new(),
		}
	}

	/// Numeric interpretation of numbers and numeric strings
	pub fn as_number(&self) -> Option<f64> {
		match self {
			Self::Int(i) => Some(*i as f64),
			Self::Float(f) => Some(*f),
			Self::String(s) => parse_numeric(s),
			_ => None,
		}
	}

	/// String used when the value reaches template output
	pub fn to_output_string(&self) -> String {
		self.to_string()
	}

	/// Loose equality
	///
	/// Booleans compare by truthiness, numeric strings compare numerically and
	/// a number compared with a non-numeric string compares as text.
	pub fn loose_eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Self::Bool(_), _) | (_, Self::Bool(_)) => self.is_truthy() == other.is_truthy(),
			(Self::Null, Self::Null) => true,
			(Self::Null, Self::String(s)) | (Self::String(s), Self::Null) => s.is_empty(),
			(Self::Null, value) | (value, Self::Null) => !value.is_truthy(),
			(Self::String(a), Self::String(b)) => match (parse_numeric(a), parse_numeric(b)) {
				(Some(x), Some(y)) => x == y,
				_ => a == b,
			},
			(Self::String(s), number @ (Self::Int(_) | Self::Float(_)))
			| (number @ (Self::Int(_) | Self::Float(_)), Self::String(s)) => match parse_numeric(s) {
				Some(parsed) => number.as_number() == Some(parsed),
				None => number.to_string() == *s,
			},
			(Self::Int(a), Self::Int(b)) => a == b,
			(a @ (Self::Int(_) | Self::Float(_)), b @ (Self::Int(_) | Self::Float(_))) => {
				a.as_number() == b.as_number()
			}
			(Self::List(a), Self::List(b)) => {
				a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
			}
			(Self::Map(a), Self::Map(b)) => {
				a.len() == b.len()
					&& a.iter()
						.all(|(key, x)| b.get(key).is_some_and(|y| x.loose_eq(y)))
			}
			_ => false,
		}
	}

	/// Strict equality: same variant and equal content
	pub fn strict_eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Self::Float(a), Self::Float(b)) => a == b,
			_ => std::mem::discriminant(self) == std::mem::discriminant(other) && self == other,
		}
	}

	/// Loose ordering used by `<`, `<=`, `>` and `>=`
	pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
		match (self, other) {
			(Self::Bool(_), _) | (_, Self::Bool(_)) => {
				Some(self.is_truthy().cmp(&other.is_truthy()))
			}
			(Self::Null, Self::String(s)) => Some("".cmp(s.as_str())),
			(Self::String(s), Self::Null) => Some(s.as_str().cmp("")),
			(Self::Null, value) | (value, Self::Null) if value.is_collection() => None,
			(Self::Null, value) => Some(false.cmp(&value.is_truthy())),
			(value, Self::Null) => Some(value.is_truthy().cmp(&false)),
			(Self::String(a), Self::String(b)) => match (parse_numeric(a), parse_numeric(b)) {
				(Some(x), Some(y)) => x.partial_cmp(&y),
				_ => Some(a.cmp(b)),
			},
			(Self::String(_), Self::Int(_) | Self::Float(_))
			| (Self::Int(_) | Self::Float(_), Self::String(_)) => {
				match (self.as_number(), other.as_number()) {
					(Some(x), Some(y)) => x.partial_cmp(&y),
					_ => Some(self.to_string().cmp(&other.to_string())),
				}
			}
			(Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
			(Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
				self.as_number()?.partial_cmp(&other.as_number()?)
			}
			(Self::List(a), Self::List(b)) => Some(a.len().cmp(&b.len())),
			(Self::Map(a), Self::Map(b)) => Some(a.len().cmp(&b.len())),
			_ => None,
		}
	}
}

/// Parse a string that looks like a number, tolerating surrounding whitespace
pub(crate) fn parse_numeric(s: &str) -> Option<f64> {
	let trimmed = s.trim();
	if trimmed.is_empty()
		|| !trimmed
			.bytes()
			.all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
	{
		return None;
	}
	trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => Ok(()),
			Self::Bool(b) => write!(f, "{}", b),
			Self::Int(i) => write!(f, "{}", i),
			Self::Float(x) => write!(f, "{}", x),
			Self::String(s) => f.write_str(s),
			Self::List(_) | Self::Map(_) => {
				let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
				f.write_str(&json)
			}
		}
	}
}

impl From<serde_json::Value> for Value {
	fn from(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => Self::Null,
			serde_json::Value::Bool(b) => Self::Bool(b),
			serde_json::Value::Number(n) => match n.as_i64() {
				Some(i) => Self::Int(i),
				None => n.as_f64().map_or(Self::Null, Self::Float),
			},
			serde_json::Value::String(s) => Self::String(s),
			serde_json::Value::Array(items) => {
				Self::List(items.into_iter().map(Value::from).collect())
			}
			serde_json::Value::Object(entries) => Self::Map(
				entries
					.into_iter()
					.map(|(key, value)| (key, Value::from(value)))
					.collect(),
			),
		}
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Int(i64::from(value))
	}
}

impl From<usize> for Value {
	fn from(value: usize) -> Self {
		i64::try_from(value).map_or(Self::Float(value as f64), Self::Int)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(values: Vec<T>) -> Self {
		Self::List(values.into_iter().map(Into::into).collect())
	}
}

impl From<ValueMap> for Value {
	fn from(entries: ValueMap) -> Self {
		Self::Map(entries)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	// =========================================================================
	// Conversion
	// =========================================================================

	#[rstest]
	fn test_from_serialize_keeps_map_order() {
		// Arrange
		let input = json!({"zeta": 1, "alpha": [true, null, 1.5]});

		// Act
		let value = Value::from_serialize(&input).unwrap();

		// Assert
		let Value::Map(entries) = &value else {
			panic!("expected a map, got {:?}", value);
		};
		assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
		assert_eq!(
			value.get("alpha"),
			Some(&Value::List(vec![
				Value::Bool(true),
				Value::Null,
				Value::Float(1.5)
			]))
		);
	}

	#[rstest]
	#[case(Value::Null, "")]
	#[case(Value::Bool(true), "true")]
	#[case(Value::Bool(false), "false")]
	#[case(Value::Int(-3), "-3")]
	#[case(Value::Float(2.5), "2.5")]
	#[case(Value::from(vec![1, 2]), "[1,2]")]
	fn test_output_string(#[case] value: Value, #[case] expected: &str) {
		assert_eq!(value.to_output_string(), expected);
	}

	#[rstest]
	fn test_get_indexes_lists() {
		let value = Value::from(vec!["a", "b"]);

		assert_eq!(value.get("1"), Some(&Value::from("b")));
		assert_eq!(value.get("2"), None);
		assert_eq!(value.get("x"), None);
	}

	// =========================================================================
	// Truthiness and comparison
	// =========================================================================

	#[rstest]
	#[case(Value::from(""), false)]
	#[case(Value::from("  "), false)]
	#[case(Value::from("0"), false)]
	#[case(Value::from(" FALSE "), false)]
	#[case(Value::from("no"), true)]
	#[case(Value::Int(0), false)]
	#[case(Value::Float(0.1), true)]
	#[case(Value::List(vec![]), false)]
	#[case(Value::Null, false)]
	fn test_is_truthy(#[case] value: Value, #[case] expected: bool) {
		assert_eq!(value.is_truthy(), expected);
	}

	#[rstest]
	#[case(Value::Int(0), Value::from("0"), true)]
	#[case(Value::from("foo"), Value::Int(0), false)]
	#[case(Value::from("1e1"), Value::from("10"), true)]
	#[case(Value::Int(1), Value::Float(1.0), true)]
	#[case(Value::Bool(true), Value::from("yes"), true)]
	#[case(Value::Null, Value::from(""), true)]
	#[case(Value::Null, Value::Int(0), true)]
	#[case(Value::Null, Value::from("0"), false)]
	#[case(Value::from("abc"), Value::from("abc"), true)]
	fn test_loose_eq(#[case] a: Value, #[case] b: Value, #[case] expected: bool) {
		assert_eq!(a.loose_eq(&b), expected);
		assert_eq!(b.loose_eq(&a), expected);
	}

	#[rstest]
	#[case(Value::Int(0), Value::from("0"), false)]
	#[case(Value::Int(1), Value::Float(1.0), false)]
	#[case(Value::from("a"), Value::from("a"), true)]
	#[case(Value::Int(2), Value::Int(2), true)]
	fn test_strict_eq(#[case] a: Value, #[case] b: Value, #[case] expected: bool) {
		assert_eq!(a.strict_eq(&b), expected);
	}

	#[rstest]
	#[case(Value::Int(2), Value::from("10"), Some(Ordering::Less))]
	#[case(Value::from("b"), Value::from("a"), Some(Ordering::Greater))]
	#[case(Value::Float(1.5), Value::Int(1), Some(Ordering::Greater))]
	#[case(Value::Null, Value::Int(1), Some(Ordering::Less))]
	#[case(Value::List(vec![]), Value::Int(1), None)]
	fn test_loose_cmp(#[case] a: Value, #[case] b: Value, #[case] expected: Option<Ordering>) {
		assert_eq!(a.loose_cmp(&b), expected);
	}
}
