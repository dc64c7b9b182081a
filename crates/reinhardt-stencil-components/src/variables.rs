//! `f:alias` and `f:variable`

use reinhardt_stencil_core::ALL_VARIABLES;
use reinhardt_stencil_core::prelude::*;

/// Names a variable can never take
const RESERVED_NAMES: &[&str] = &[ALL_VARIABLES, "true", "false", "null"];

/// Renders its children with the entries of `map` as additional variables
///
/// ```text
/// <f:alias map="{name: user.profile.displayName}">{name}</f:alias>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AliasComponent;

impl Component for AliasComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments.register(
			ArgumentDefinition::new("map", "map", "Variables visible to the children").required(),
		)?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let variables = match arguments.value("map") {
			Value::Map(entries) => entries.clone(),
			_ => ValueMap::new(),
		};
		context.with_scope(variables, |context| children.render(context))
	}

	fn escape_output(&self) -> bool {
		false
	}

	fn escape_children(&self) -> Option<bool> {
		Some(true)
	}
}

/// Assigns a variable in the innermost scope and renders nothing
///
/// The value comes from the `value` argument, a piped value or the children.
/// Children are stored unescaped, escaping applies once the variable is output.
///
/// ```text
/// <f:variable name="greeting">Hello {user.name}</f:variable>
/// {user.name -> f:variable(name: 'author')}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableComponent;

impl Component for VariableComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments
			.register(ArgumentDefinition::new("name", "string", "Variable name").required())?
			.register(ArgumentDefinition::new("value", "mixed", "Value to assign"))?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let name = arguments.string("name");
		if name.is_empty() || name.contains('.') || RESERVED_NAMES.contains(&name.as_str()) {
			return Err(TemplateError::component(
				"f:variable",
				format!("`{}` cannot be used as a variable name", name),
			));
		}
		let value = arguments.content_or_children("value", children, context)?;
		tracing::trace!(name = %name, value_type = value.type_name(), "assigning template variable");
		context.variables_mut().set(name, value);
		Ok(Value::Null)
	}

	fn escape_output(&self) -> bool {
		false
	}

	fn escape_children(&self) -> Option<bool> {
		Some(false)
	}

	fn content_argument_name(&self) -> Option<&str> {
		Some("value")
	}
}
