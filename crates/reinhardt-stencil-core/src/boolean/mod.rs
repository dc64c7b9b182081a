//! Boolean condition sub-language
//!
//! Conditions are written in attribute values and quoted arguments:
//!
//! ```text
//! {user.age} >= 18 && ({user.role} == 'admin' || !{user.banned})
//! ```
//!
//! Expressions embedded with braces arrive from the sequencer as operand nodes;
//! the surrounding text is lexed here. Precedence from loosest to tightest is
//! `||`, `&&`, comparison, `!`, parentheses.
//!
//! Two evaluation strategies exist. [`BoolExpr::evaluate`] walks the tree and
//! [`compile`] builds a closure tree once; both pull operand values lazily from an
//! [`OperandSource`] so that short-circuiting skips unevaluated operands.

mod compiled;
mod parser;

pub use compiled::{CompiledCondition, compile};
pub use parser::ConditionSyntaxError;

use crate::context::RenderingContext;
use crate::error::TemplateResult;
use crate::node::Node;
use crate::value::Value;

// ============================================================================
// Expression tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
	Equal,
	NotEqual,
	Identical,
	NotIdentical,
	Less,
	LessOrEqual,
	Greater,
	GreaterOrEqual,
	/// `%`, truthy when the integer remainder is non-zero
	Modulo,
}

impl Comparator {
	pub fn symbol(self) -> &'static str {
		match self {
			Self::Equal => "==",
			Self::NotEqual => "!=",
			Self::Identical => "===",
			Self::NotIdentical => "!==",
			Self::Less => "<",
			Self::LessOrEqual => "<=",
			Self::Greater => ">",
			Self::GreaterOrEqual => ">=",
			Self::Modulo => "%",
		}
	}

	/// Apply the comparator to two evaluated operands
	pub fn apply(self, left: &Value, right: &Value) -> bool {
		use std::cmp::Ordering;

		match self {
			Self::Equal => left.loose_eq(right),
			Self::NotEqual => !left.loose_eq(right),
			Self::Identical => left.strict_eq(right),
			Self::NotIdentical => !left.strict_eq(right),
			Self::Less => left.loose_cmp(right) == Some(Ordering::Less),
			Self::LessOrEqual => matches!(
				left.loose_cmp(right),
				Some(Ordering::Less | Ordering::Equal)
			),
			Self::Greater => left.loose_cmp(right) == Some(Ordering::Greater),
			Self::GreaterOrEqual => matches!(
				left.loose_cmp(right),
				Some(Ordering::Greater | Ordering::Equal)
			),
			Self::Modulo => match (integer(left), integer(right)) {
				(Some(_), Some(0)) | (None, _) | (_, None) => false,
				(Some(dividend), Some(divisor)) => dividend.wrapping_rem(divisor) != 0,
			},
		}
	}
}

fn integer(value: &Value) -> Option<i64> {
	match value {
		Value::Null => Some(0),
		Value::Bool(b) => Some(i64::from(*b)),
		other => other.as_number().map(|number| number.trunc() as i64),
	}
}

/// Piece of a quoted string or of text glued to an embedded expression
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePiece {
	Text(String),
	Operand(usize),
}

/// Parsed condition
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr {
	Or(Box<BoolExpr>, Box<BoolExpr>),
	And(Box<BoolExpr>, Box<BoolExpr>),
	Not(Box<BoolExpr>),
	Compare(Comparator, Box<BoolExpr>, Box<BoolExpr>),
	/// Number, keyword, bare word or plain quoted string
	Literal(Value),
	/// Embedded expression, by index into the operand list
	Operand(usize),
	/// Text interpolated with embedded expressions
	Template(Vec<TemplatePiece>),
}

impl BoolExpr {
	/// Tree-walk evaluation
	pub fn evaluate(&self, operands: &mut dyn OperandSource) -> TemplateResult<Value> {
		match self {
			Self::Or(left, right) => Ok(Value::Bool(
				left.evaluate(operands)?.is_truthy() || right.evaluate(operands)?.is_truthy(),
			)),
			Self::And(left, right) => Ok(Value::Bool(
				left.evaluate(operands)?.is_truthy() && right.evaluate(operands)?.is_truthy(),
			)),
			Self::Not(inner) => Ok(Value::Bool(!inner.evaluate(operands)?.is_truthy())),
			Self::Compare(comparator, left, right) => {
				let left = left.evaluate(operands)?;
				let right = right.evaluate(operands)?;
				Ok(Value::Bool(comparator.apply(&left, &right)))
			}
			Self::Literal(value) => Ok(value.clone()),
			Self::Operand(index) => operands.operand(*index),
			Self::Template(pieces) => interpolate(pieces, operands),
		}
	}
}

pub(crate) fn interpolate(
	pieces: &[TemplatePiece],
	operands: &mut dyn OperandSource,
) -> TemplateResult<Value> {
	let mut output = String::new();
	for piece in pieces {
		match piece {
			TemplatePiece::Text(text) => output.push_str(text),
			TemplatePiece::Operand(index) => {
				output.push_str(&operands.operand(*index)?.to_output_string())
			}
		}
	}
	Ok(Value::String(output))
}

// ============================================================================
// Operands
// ============================================================================

/// Supplies operand values on demand
pub trait OperandSource {
	fn operand(&mut self, index: usize) -> TemplateResult<Value>;
}

/// Pre-evaluated operands; out-of-range indices yield `null`
impl OperandSource for Vec<Value> {
	fn operand(&mut self, index: usize) -> TemplateResult<Value> {
		Ok(self.get(index).cloned().unwrap_or_default())
	}
}

/// Operand nodes evaluated against a rendering context
pub(crate) struct NodeOperands<'a> {
	pub(crate) nodes: &'a [Node],
	pub(crate) context: &'a mut RenderingContext,
}

impl OperandSource for NodeOperands<'_> {
	fn operand(&mut self, index: usize) -> TemplateResult<Value> {
		match self.nodes.get(index) {
			Some(node) => node.evaluate(self.context),
			None => Ok(Value::Null),
		}
	}
}

// ============================================================================
// Node
// ============================================================================

/// Condition node of the template tree
#[derive(Debug, Clone)]
pub enum BooleanNode {
	/// A single embedded expression tested for truthiness
	Truthiness(Box<Node>),
	Expression {
		expression: BoolExpr,
		operands: Vec<Node>,
	},
}

impl BooleanNode {
	/// Build a condition from the nodes of an attribute or argument value
	///
	/// A value made of one non-text node is tested for truthiness; anything else is
	/// lexed and parsed as an expression.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_core::{BooleanNode, Engine, Node};
	///
	/// let condition = BooleanNode::parse(vec![Node::text("(0 && 1) || 1")]).unwrap();
	/// let mut context = Engine::new().context();
	/// assert!(condition.evaluate(&mut context).unwrap());
	/// ```
	pub fn parse(parts: Vec<Node>) -> Result<Self, ConditionSyntaxError> {
		let mut parts = flatten(parts);
		if parts.len() == 1 && parts[0].as_text().is_none() {
			return Ok(Self::Truthiness(Box::new(parts.remove(0))));
		}
		let (expression, operands) = parser::parse(parts)?;
		Ok(Self::Expression {
			expression,
			operands,
		})
	}

	/// Tree-walk evaluation
	pub fn evaluate(&self, context: &mut RenderingContext) -> TemplateResult<bool> {
		match self {
			Self::Truthiness(node) => Ok(node.evaluate(context)?.is_truthy()),
			Self::Expression {
				expression,
				operands,
			} => {
				let mut source = NodeOperands {
					nodes: operands,
					context,
				};
				Ok(expression.evaluate(&mut source)?.is_truthy())
			}
		}
	}
}

fn flatten(parts: Vec<Node>) -> Vec<Node> {
	let mut flat = Vec::with_capacity(parts.len());
	for part in parts {
		match part {
			Node::Root(children) => flat.extend(flatten(children)),
			other => flat.push(other),
		}
	}
	flat
}
