//! Abstract syntax tree
//!
//! Parsing produces a [`Node::Root`]. Every variant evaluates against a
//! [`RenderingContext`] without mutating the tree, so one parsed template can be
//! rendered any number of times.
//!
//! ## Main Types
//!
//! - [`Node`]: the tagged node variant
//! - [`ObjectAccessor`]: variable/property paths
//! - [`ArrayNode`]: collection literals
//! - [`BooleanNode`]: parsed conditions
//! - [`Invocation`]: component calls with arguments and children

mod accessor;
mod array;
mod invocation;

pub use accessor::{ALL_VARIABLES, ObjectAccessor, PathSegment};
pub use array::{ArrayEntry, ArrayNode};
pub use invocation::{DynamicArgument, Invocation};

pub(crate) use array::assemble;

pub use crate::boolean::BooleanNode;

use crate::context::RenderingContext;
use crate::error::TemplateResult;
use crate::escaping::escape_value;
use crate::value::Value;

/// A node of the template tree
#[derive(Debug, Clone)]
pub enum Node {
	/// Top of a parsed template, also used for mixed text/expression values
	Root(Vec<Node>),
	Text(String),
	/// Number, boolean or null literal from an expression
	Literal(Value),
	ObjectAccessor(ObjectAccessor),
	Array(ArrayNode),
	Boolean(BooleanNode),
	Invocation(Box<Invocation>),
	/// HTML-escapes the string result of the wrapped node
	Escaping(Box<Node>),
}

impl Node {
	pub fn text(value: impl Into<String>) -> Self {
		Self::Text(value.into())
	}

	/// Wrap `node` for output escaping unless it is already wrapped
	pub fn escaping(node: Node) -> Self {
		match node {
			Self::Escaping(_) => node,
			other => Self::Escaping(Box::new(other)),
		}
	}

	/// Evaluate the node
	pub fn evaluate(&self, context: &mut RenderingContext) -> TemplateResult<Value> {
		match self {
			Self::Root(children) => evaluate_sequence(children, context),
			Self::Text(text) => Ok(Value::String(text.clone())),
			Self::Literal(value) => Ok(value.clone()),
			Self::ObjectAccessor(accessor) => Ok(accessor.resolve(context.variables())),
			Self::Array(array) => {
				let mut values = Vec::with_capacity(array.entries().len());
				for entry in array.entries() {
					values.push((entry.key.as_deref(), entry.value.evaluate(context)?));
				}
				Ok(assemble(values))
			}
			Self::Boolean(boolean) => boolean.evaluate(context).map(Value::Bool),
			Self::Invocation(invocation) => invocation.evaluate(context),
			Self::Escaping(inner) if matches!(**inner, Self::Escaping(_)) => inner.evaluate(context),
			Self::Escaping(inner) => inner.evaluate(context).map(escape_value),
		}
	}

	/// Render the node to its output string
	pub fn render(&self, context: &mut RenderingContext) -> TemplateResult<String> {
		self.evaluate(context).map(|value| value.to_output_string())
	}

	/// The invocation behind this node, looking through escaping wrappers
	pub fn as_invocation(&self) -> Option<&Invocation> {
		match self {
			Self::Invocation(invocation) => Some(invocation),
			Self::Escaping(inner) => inner.as_invocation(),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Children of a root node, empty for every other variant
	pub fn children(&self) -> &[Node] {
		match self {
			Self::Root(children) => children,
			_ => &[],
		}
	}
}

/// Evaluate a node list with root semantics
///
/// No node yields `null`, a single node keeps its raw value and several nodes are
/// concatenated as strings.
pub(crate) fn evaluate_sequence(
	nodes: &[Node],
	context: &mut RenderingContext,
) -> TemplateResult<Value> {
	match nodes {
		[] => Ok(Value::Null),
		[single] => single.evaluate(context),
		_ => {
			let mut output = String::new();
			for node in nodes {
				output.push_str(&node.evaluate(context)?.to_output_string());
			}
			Ok(Value::String(output))
		}
	}
}
