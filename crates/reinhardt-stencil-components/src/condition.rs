//! `f:if`, `f:then` and `f:else`
//!
//! ```text
//! <f:if condition="{user.admin} || {user.id} == {post.author}">
//!     <f:then>Edit</f:then>
//!     <f:else if="{user.id}">Report</f:else>
//!     <f:else>Sign in</f:else>
//! </f:if>
//!
//! {f:if(condition: items, then: 'has items', else: 'empty')}
//! ```
//!
//! When the condition holds, the `then` argument wins over a `f:then` child.
//! Without either, every child is rendered unless the body contains `f:else`.
//! When it fails, the `else` argument wins over the first `f:else` child whose
//! `if` condition holds or that has none.

use reinhardt_stencil_core::prelude::*;
use reinhardt_stencil_core::conventional_type_name;

use crate::COMPONENTS_NAMESPACE;

fn child_type(call_name: &str, context: &RenderingContext) -> String {
	conventional_type_name(COMPONENTS_NAMESPACE, call_name, context.resolver().suffix())
}

fn supplied<'a>(arguments: &'a Arguments, name: &str) -> Option<&'a Value> {
	arguments.get(name).filter(|value| !value.is_null())
}

/// Conditional rendering with optional then/else branches
#[derive(Debug, Clone, Copy, Default)]
pub struct IfComponent;

impl IfComponent {
	fn render_then(
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		if let Some(then) = supplied(arguments, "then") {
			return Ok(then.clone());
		}

		let then_type = child_type("then", context);
		let else_type = child_type("else", context);
		let mut has_else = false;
		for child in children.iter() {
			if child.is_component(&then_type) {
				return child.render(context);
			}
			has_else |= child.is_component(&else_type);
		}
		if has_else {
			Ok(Value::Null)
		} else {
			children.render(context)
		}
	}

	fn render_else(
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		if let Some(otherwise) = supplied(arguments, "else") {
			return Ok(otherwise.clone());
		}

		let else_type = child_type("else", context);
		for child in children.iter() {
			if !child.is_component(&else_type) {
				continue;
			}
			match child.argument("if", context)? {
				Some(condition) if !condition.is_truthy() => continue,
				_ => return child.render(context),
			}
		}
		Ok(Value::Null)
	}
}

impl Component for IfComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments
			.register(
				ArgumentDefinition::new("condition", "boolean", "Condition deciding the branch")
					.with_default(false),
			)?
			.register(
				ArgumentDefinition::new("then", "mixed", "Value returned when the condition holds")
					.escaped(),
			)?
			.register(
				ArgumentDefinition::new("else", "mixed", "Value returned when the condition fails")
					.escaped(),
			)?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let condition = arguments.bool("condition");
		tracing::trace!(condition, "evaluating conditional");
		if condition {
			Self::render_then(arguments, children, context)
		} else {
			Self::render_else(arguments, children, context)
		}
	}

	fn escape_output(&self) -> bool {
		false
	}

	fn escape_children(&self) -> Option<bool> {
		Some(true)
	}
}

/// Branch rendered by an enclosing `f:if` when its condition holds
#[derive(Debug, Clone, Copy, Default)]
pub struct ThenComponent;

impl Component for ThenComponent {
	fn render(
		&self,
		_arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		children.render(context)
	}

	fn escape_output(&self) -> bool {
		false
	}

	fn escape_children(&self) -> Option<bool> {
		Some(true)
	}
}

/// Branch rendered by an enclosing `f:if` when its condition fails
///
/// The optional `if` condition turns the branch into an else-if; the enclosing
/// `f:if` evaluates it before choosing the branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElseComponent;

impl Component for ElseComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments.register(ArgumentDefinition::new(
			"if",
			"boolean",
			"Additional condition for an else-if branch",
		))?;
		Ok(())
	}

	fn render(
		&self,
		_arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		children.render(context)
	}

	fn escape_output(&self) -> bool {
		false
	}

	fn escape_children(&self) -> Option<bool> {
		Some(true)
	}
}
