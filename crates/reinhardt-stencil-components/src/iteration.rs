//! `f:for`

use reinhardt_stencil_core::prelude::*;
use reinhardt_stencil_core::scope;

/// Renders its children once per element of a list or map
///
/// Each pass runs in a fresh variable scope holding the element under `as`,
/// optionally its key under `key` and loop information under `iteration`:
///
/// | field     | meaning                        |
/// |-----------|--------------------------------|
/// | `index`   | zero-based position            |
/// | `cycle`   | one-based position             |
/// | `total`   | number of elements             |
/// | `isFirst` | first pass                     |
/// | `isLast`  | last pass                      |
/// | `isEven`  | `cycle` is even                |
/// | `isOdd`   | `cycle` is odd                 |
///
/// ```text
/// <f:for each="{users}" as="user" key="id" iteration="loop">
///     {loop.cycle}. {user.name}
/// </f:for>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ForComponent;

fn iteration_info(index: usize, total: usize) -> Value {
	let cycle = index + 1;
	Value::Map(scope([
		("index", Value::from(index)),
		("cycle", Value::from(cycle)),
		("total", Value::from(total)),
		("isFirst", Value::from(index == 0)),
		("isLast", Value::from(cycle == total)),
		("isEven", Value::from(cycle % 2 == 0)),
		("isOdd", Value::from(cycle % 2 == 1)),
	]))
}

impl Component for ForComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments
			.register(ArgumentDefinition::new("each", "array", "List or map to iterate").required())?
			.register(
				ArgumentDefinition::new("as", "string", "Variable holding the element").required(),
			)?
			.register(
				ArgumentDefinition::new("key", "string", "Variable holding the key").with_default(""),
			)?
			.register(
				ArgumentDefinition::new("reverse", "boolean", "Iterate from the last element")
					.with_default(false),
			)?
			.register(
				ArgumentDefinition::new("iteration", "string", "Variable holding loop information")
					.with_default(""),
			)?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let element_name = arguments.string("as");
		if element_name.is_empty() {
			return Err(TemplateError::component(
				"f:for",
				"the `as` argument must name a variable",
			));
		}
		let key_name = arguments.string("key");
		let iteration_name = arguments.string("iteration");

		let mut entries = arguments.value("each").entries();
		if arguments.bool("reverse") {
			entries.reverse();
		}
		let total = entries.len();

		let mut output = String::new();
		for (index, (key, element)) in entries.into_iter().enumerate() {
			let mut variables = scope([(element_name.as_str(), element.clone())]);
			if !key_name.is_empty() {
				variables.insert(key_name.clone(), key);
			}
			if !iteration_name.is_empty() {
				variables.insert(iteration_name.clone(), iteration_info(index, total));
			}
			let rendered = context.with_scope(variables, |context| children.render(context))?;
			output.push_str(&rendered.to_output_string());
		}
		Ok(Value::String(output))
	}

	fn escape_output(&self) -> bool {
		false
	}

	fn escape_children(&self) -> Option<bool> {
		Some(true)
	}
}
