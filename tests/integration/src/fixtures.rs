//! Application components registered next to the default library
//!
//! All of them live in [`APP_NAMESPACE`] under the alias `app`.

use reinhardt_stencil::components::{DefaultComponents, TagBuilder};
use reinhardt_stencil::prelude::*;

pub const APP_NAMESPACE: &str = "tests::app";

/// `<article>` with an escaped title heading and the children as body
pub struct CardComponent;

impl Component for CardComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments
			.register(ArgumentDefinition::new("title", "string", "Card heading").required().escaped())?
			.register(
				ArgumentDefinition::new("highlighted", "boolean", "Adds the highlight class")
					.with_default(false),
			)?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let class = if arguments.bool("highlighted") {
			"card highlighted"
		} else {
			"card"
		};
		let body = format!(
			"<h2>{}</h2>{}",
			arguments.string("title"),
			children.render(context)?.to_output_string()
		);
		Ok(Value::String(
			TagBuilder::new("article")
				.attribute("class", class)
				.content(body)
				.render(),
		))
	}

	fn escape_output(&self) -> bool {
		false
	}

	fn escape_children(&self) -> Option<bool> {
		Some(true)
	}
}

/// `greeting, name!` where `name` is the content argument
pub struct GreetComponent;

impl Component for GreetComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments
			.register(ArgumentDefinition::new("name", "string", "Who to greet"))?
			.register(ArgumentDefinition::new("greeting", "string", "Salutation").with_default("Hello"))?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let name = arguments.content_or_children("name", children, context)?;
		Ok(Value::String(format!(
			"{}, {}!",
			arguments.string("greeting"),
			name.to_output_string()
		)))
	}

	fn content_argument_name(&self) -> Option<&str> {
		Some("name")
	}
}

/// Sum of an integer list, used to exercise typed-list contracts
pub struct SumComponent;

impl Component for SumComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments.register(ArgumentDefinition::new("numbers", "int[]", "Values to add").required())?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		_children: &Children<'_>,
		_context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let sum: f64 = arguments
			.value("numbers")
			.entries()
			.iter()
			.filter_map(|(_, value)| value.as_number())
			.sum();
		Ok(Value::Float(sum))
	}
}

/// Renders its children with the default escaping flags
pub struct PassthroughComponent;

impl Component for PassthroughComponent {
	fn render(
		&self,
		_arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		children.render(context)
	}
}

/// Renders its children; accepts any argument
pub struct WrapComponent;

impl Component for WrapComponent {
	fn render(
		&self,
		_arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		children.render(context)
	}

	fn accepts_undeclared_arguments(&self) -> bool {
		true
	}
}

/// Builder with the default library and the `app` components
pub fn builder() -> EngineBuilder {
	Engine::builder()
		.with_default_components()
		.namespace("app", APP_NAMESPACE)
		.component_in(APP_NAMESPACE, "card", CardComponent)
		.component_in(APP_NAMESPACE, "greet", GreetComponent)
		.component_in(APP_NAMESPACE, "sum", SumComponent)
		.component_in(APP_NAMESPACE, "passthrough", PassthroughComponent)
		.component_in(APP_NAMESPACE, "wrap", WrapComponent)
}

/// Engine for the given argument processing policy
pub fn engine(policy: ArgumentProcessing) -> anyhow::Result<Engine> {
	Ok(builder().argument_processing(policy).build()?)
}
