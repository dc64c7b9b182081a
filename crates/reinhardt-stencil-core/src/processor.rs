//! Argument processing policies
//!
//! The invoker hands every supplied argument value to an [`ArgumentProcessor`],
//! which may coerce it and then decides whether it satisfies the declared type.
//!
//! - [`LenientArgumentProcessor`] never coerces and only checks collection,
//!   string and boolean shapes. Typed lists (`T[]`) are checked by their first
//!   element.
//! - [`StrictArgumentProcessor`] coerces scalars to the declared type, recognizes
//!   type aliases and checks every element of typed lists.

use std::sync::Arc;

use crate::component::{ArgumentDefinition, MIXED};
use crate::config::ArgumentProcessing;
use crate::value::{Value, parse_numeric};

/// Coerces and validates argument values against their definition
pub trait ArgumentProcessor: Send + Sync {
	fn process(&self, value: Value, definition: &ArgumentDefinition) -> Value;

	fn is_valid(&self, value: &Value, definition: &ArgumentDefinition) -> bool;
}

/// Processor implementing the given policy
pub fn processor_for(policy: ArgumentProcessing) -> Arc<dyn ArgumentProcessor> {
	match policy {
		ArgumentProcessing::Lenient => Arc::new(LenientArgumentProcessor),
		ArgumentProcessing::Strict => Arc::new(StrictArgumentProcessor),
	}
}

/// Declared argument type, with aliases folded
#[derive(Debug, Clone, PartialEq)]
enum DeclaredType {
	Integer,
	Float,
	Boolean,
	String,
	/// Any list or map
	Collection,
	Map,
	Mixed,
	ListOf(Box<DeclaredType>),
	/// Names the engine does not inspect
	Other,
}

impl DeclaredType {
	fn parse(type_name: &str) -> Self {
		let type_name = type_name.trim();
		if let Some(element) = type_name.strip_suffix("[]") {
			return Self::ListOf(Box::new(Self::parse(element)));
		}
		match type_name.to_ascii_lowercase().as_str() {
			"int" | "integer" => Self::Integer,
			"float" | "double" | "number" => Self::Float,
			"bool" | "boolean" => Self::Boolean,
			"string" | "str" => Self::String,
			"array" | "iterable" | "list" => Self::Collection,
			"object" | "map" => Self::Map,
			MIXED => Self::Mixed,
			_ => Self::Other,
		}
	}
}

// ============================================================================
// Lenient
// ============================================================================

/// Shape checks only; values are never changed
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientArgumentProcessor;

impl LenientArgumentProcessor {
	fn accepts(declared: &DeclaredType, value: &Value) -> bool {
		match declared {
			DeclaredType::Map => matches!(value, Value::Map(_)),
			DeclaredType::Collection => value.is_collection(),
			DeclaredType::ListOf(element) => {
				value.is_collection()
					&& value
						.entries()
						.first()
						.is_none_or(|(_, first)| Self::accepts(element, first))
			}
			DeclaredType::String => !value.is_collection(),
			DeclaredType::Boolean => matches!(value, Value::Bool(_)),
			_ => true,
		}
	}
}

impl ArgumentProcessor for LenientArgumentProcessor {
	fn process(&self, value: Value, _definition: &ArgumentDefinition) -> Value {
		value
	}

	fn is_valid(&self, value: &Value, definition: &ArgumentDefinition) -> bool {
		value.is_null() || Self::accepts(&DeclaredType::parse(definition.type_name()), value)
	}
}

// ============================================================================
// Strict
// ============================================================================

/// Coerces scalars to the declared type and checks every list element
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictArgumentProcessor;

impl StrictArgumentProcessor {
	fn coerce(declared: &DeclaredType, value: Value) -> Value {
		match (declared, value) {
			(_, Value::Null) => Value::Null,
			(DeclaredType::Integer, Value::Float(f)) => Value::Int(f.trunc() as i64),
			(DeclaredType::Integer, Value::Bool(b)) => Value::Int(i64::from(b)),
			(DeclaredType::Integer, Value::String(s)) => match parse_numeric(&s) {
				Some(number) => Value::Int(number.trunc() as i64),
				None => Value::String(s),
			},
			(DeclaredType::Float, Value::Int(i)) => Value::Float(i as f64),
			(DeclaredType::Float, Value::Bool(b)) => Value::Float(if b { 1.0 } else { 0.0 }),
			(DeclaredType::Float, Value::String(s)) => match parse_numeric(&s) {
				Some(number) => Value::Float(number),
				None => Value::String(s),
			},
			(DeclaredType::Boolean, value) if !value.is_collection() => {
				Value::Bool(value.is_truthy())
			}
			(DeclaredType::String, value) if !value.is_collection() => {
				Value::String(value.to_output_string())
			}
			(DeclaredType::ListOf(element), Value::List(items)) => Value::List(
				items
					.into_iter()
					.map(|item| Self::coerce(element, item))
					.collect(),
			),
			(DeclaredType::ListOf(element), Value::Map(entries)) => Value::Map(
				entries
					.into_iter()
					.map(|(key, item)| (key, Self::coerce(element, item)))
					.collect(),
			),
			(_, value) => value,
		}
	}

	fn accepts(declared: &DeclaredType, value: &Value) -> bool {
		match declared {
			DeclaredType::Integer => matches!(value, Value::Int(_)),
			DeclaredType::Float => matches!(value, Value::Int(_) | Value::Float(_)),
			DeclaredType::Boolean => matches!(value, Value::Bool(_)),
			DeclaredType::String => matches!(value, Value::String(_)),
			DeclaredType::Collection => value.is_collection(),
			DeclaredType::Map => matches!(value, Value::Map(_)),
			DeclaredType::ListOf(element) => {
				value.is_collection()
					&& value
						.entries()
						.iter()
						.all(|(_, item)| Self::accepts(element, item))
			}
			DeclaredType::Mixed | DeclaredType::Other => true,
		}
	}
}

impl ArgumentProcessor for StrictArgumentProcessor {
	fn process(&self, value: Value, definition: &ArgumentDefinition) -> Value {
		Self::coerce(&DeclaredType::parse(definition.type_name()), value)
	}

	fn is_valid(&self, value: &Value, definition: &ArgumentDefinition) -> bool {
		if value.is_null() {
			return !definition.is_required();
		}
		Self::accepts(&DeclaredType::parse(definition.type_name()), value)
	}
}
