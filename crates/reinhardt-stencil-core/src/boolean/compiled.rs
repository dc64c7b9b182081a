//! Closure strategy for conditions

use std::sync::Arc;

use crate::error::TemplateResult;
use crate::value::Value;

use super::{BoolExpr, OperandSource, interpolate};

/// A condition translated into nested closures
pub type CompiledCondition =
	Arc<dyn Fn(&mut dyn OperandSource) -> TemplateResult<Value> + Send + Sync>;

/// Translate an expression tree into closures, once
pub fn compile(expression: &BoolExpr) -> CompiledCondition {
	match expression {
		BoolExpr::Or(left, right) => {
			let (left, right) = (compile(left), compile(right));
			Arc::new(move |operands: &mut dyn OperandSource| {
				Ok(Value::Bool(
					left(operands)?.is_truthy() || right(operands)?.is_truthy(),
				))
			})
		}
		BoolExpr::And(left, right) => {
			let (left, right) = (compile(left), compile(right));
			Arc::new(move |operands: &mut dyn OperandSource| {
				Ok(Value::Bool(
					left(operands)?.is_truthy() && right(operands)?.is_truthy(),
				))
			})
		}
		BoolExpr::Not(inner) => {
			let inner = compile(inner);
			Arc::new(move |operands: &mut dyn OperandSource| {
				Ok(Value::Bool(!inner(operands)?.is_truthy()))
			})
		}
		BoolExpr::Compare(comparator, left, right) => {
			let comparator = *comparator;
			let (left, right) = (compile(left), compile(right));
			Arc::new(move |operands: &mut dyn OperandSource| {
				let left = left(operands)?;
				let right = right(operands)?;
				Ok(Value::Bool(comparator.apply(&left, &right)))
			})
		}
		BoolExpr::Literal(value) => {
			let value = value.clone();
			Arc::new(move |_: &mut dyn OperandSource| Ok(value.clone()))
		}
		BoolExpr::Operand(index) => {
			let index = *index;
			Arc::new(move |operands: &mut dyn OperandSource| operands.operand(index))
		}
		BoolExpr::Template(pieces) => {
			let pieces = pieces.clone();
			Arc::new(move |operands: &mut dyn OperandSource| interpolate(&pieces, operands))
		}
	}
}
