//! `f:count`, `f:comment` and `f:debug`

use reinhardt_stencil_core::prelude::*;

/// Number of elements of a list or map; `null` counts as zero
#[derive(Debug, Clone, Copy, Default)]
pub struct CountComponent;

impl Component for CountComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments.register(ArgumentDefinition::new("subject", "array", "List or map to count"))?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let subject = arguments.content_or_children("subject", children, context)?;
		if subject.is_null() {
			return Ok(Value::Int(0));
		}
		match subject.len() {
			Some(count) => Ok(Value::from(count)),
			None => Err(TemplateError::component(
				"f:count",
				format!("cannot count a value of type {}", subject.type_name()),
			)),
		}
	}

	fn content_argument_name(&self) -> Option<&str> {
		Some("subject")
	}
}

/// Swallows its children; nothing inside is evaluated
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentComponent;

impl Component for CommentComponent {
	fn render(
		&self,
		_arguments: &Arguments,
		_children: &Children<'_>,
		_context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		Ok(Value::Null)
	}

	fn escape_output(&self) -> bool {
		false
	}

	fn escape_children(&self) -> Option<bool> {
		Some(false)
	}
}

/// Dumps a value with its type as pretty-printed JSON
///
/// Without a value or children every visible variable is dumped. Invocations
/// are always tree-walked.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugComponent;

impl Component for DebugComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments
			.register(ArgumentDefinition::new("value", "mixed", "Value to dump"))?
			.register(ArgumentDefinition::new("title", "string", "Heading").with_default(""))?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let value = if arguments.value("value").is_null() && children.is_empty() {
			Value::Map(context.variables().all())
		} else {
			arguments.content_or_children("value", children, context)?
		};
		let title = arguments.string("title");
		tracing::debug!(title = %title, value_type = value.type_name(), "rendering debug output");

		let dump = serde_json::to_string_pretty(&value)?;
		if title.is_empty() {
			Ok(Value::String(format!("{} {}", value.type_name(), dump)))
		} else {
			Ok(Value::String(format!("{}: {} {}", title, value.type_name(), dump)))
		}
	}

	fn escape_children(&self) -> Option<bool> {
		Some(false)
	}

	fn content_argument_name(&self) -> Option<&str> {
		Some("value")
	}

	fn compilable(&self) -> bool {
		false
	}
}
