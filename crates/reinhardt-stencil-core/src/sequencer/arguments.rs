//! Binding parsed argument values to an invocation

use std::sync::Arc;

use crate::component::ArgumentDefinition;
use crate::error::TemplateResult;
use crate::node::{BooleanNode, Invocation, Node};

use super::ParseContext;

/// `name: value` in a call or `name="value"` in a tag
pub(super) struct NamedArgument {
	pub(super) name: String,
	pub(super) value: Node,
	pub(super) offset: usize,
}

/// A keyless call argument, or the left side of a pipe
pub(super) struct PositionalArgument {
	pub(super) value: Node,
	pub(super) offset: usize,
}

impl<'a> ParseContext<'a> {
	/// Attach arguments to `invocation`
	///
	/// Named arguments are bound first. A piped value then takes the content
	/// argument when the component declares one, otherwise the first declared
	/// argument still free; positional arguments fill the remaining free
	/// arguments in declaration order. Names missing from the contract are kept
	/// and rejected by the invoker, unless the component accepts them.
	pub(super) fn bind(
		&self,
		invocation: &mut Invocation,
		named: Vec<NamedArgument>,
		positional: Vec<PositionalArgument>,
		piped: Option<PositionalArgument>,
	) -> TemplateResult<()> {
		let component = Arc::clone(&invocation.component);
		let contract = component.contract();

		for argument in named {
			if invocation.arguments.contains_key(&argument.name) {
				return Err(self
					.source
					.error(
						argument.offset,
						format!(
							"duplicate argument `{}` for `{}`",
							argument.name,
							invocation.call_name()
						),
					)
					.into());
			}
			let value = self.argument_node(contract.get(&argument.name), argument.value, argument.offset)?;
			invocation.arguments.insert(argument.name, value);
		}

		if let Some(argument) = piped {
			let content = component
				.component()
				.content_argument_name()
				.filter(|name| contract.contains(name) && !invocation.arguments.contains_key(*name));
			let target = content.or_else(|| {
				contract
					.iter()
					.map(ArgumentDefinition::name)
					.find(|name| !invocation.arguments.contains_key(*name))
			});
			let Some(target) = target else {
				return Err(self
					.source
					.error(
						argument.offset,
						format!("`{}` has no free argument for the piped value", invocation.call_name()),
					)
					.into());
			};
			let value = self.argument_node(contract.get(target), argument.value, argument.offset)?;
			invocation.arguments.insert(target.to_string(), value);
		}

		for argument in positional {
			let free = contract
				.iter()
				.find(|definition| !invocation.arguments.contains_key(definition.name()));
			let Some(definition) = free else {
				return Err(self
					.source
					.error(
						argument.offset,
						format!(
							"too many positional arguments for `{}`, it declares {}",
							invocation.call_name(),
							contract.len()
						),
					)
					.into());
			};
			let value = self.argument_node(Some(definition), argument.value, argument.offset)?;
			invocation
				.arguments
				.insert(definition.name().to_string(), value);
		}
		Ok(())
	}

	/// Apply the declared argument type to a parsed value
	///
	/// Boolean arguments are reparsed as conditions; escaped arguments are
	/// wrapped when escaping is active and the value is not literal text.
	fn argument_node(
		&self,
		definition: Option<&ArgumentDefinition>,
		value: Node,
		offset: usize,
	) -> TemplateResult<Node> {
		match definition {
			Some(definition) if definition.is_boolean() => {
				let parts = match value {
					Node::Root(parts) => parts,
					other => vec![other],
				};
				BooleanNode::parse(parts)
					.map(Node::Boolean)
					.map_err(|error| self.source.error(offset, error.to_string()).into())
			}
			Some(definition)
				if definition.is_escaped() && self.escaping && !matches!(value, Node::Text(_)) =>
			{
				Ok(Node::Escaping(Box::new(value)))
			}
			_ => Ok(value),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::node::ObjectAccessor;
	use crate::sequencer::tests::with_context;
	use rstest::rstest;

	fn invocation(context: &ParseContext<'_>) -> Invocation {
		let component = context.resolver.resolve("t", "echo").unwrap();
		Invocation::new("t", "echo", component, context.source.location(0))
	}

	fn positional(value: &str) -> PositionalArgument {
		PositionalArgument {
			value: Node::text(value),
			offset: 0,
		}
	}

	#[rstest]
	fn test_positional_arguments_fill_free_slots_in_order() {
		// Arrange
		let named = vec![NamedArgument {
			name: "value".to_string(),
			value: Node::text("v"),
			offset: 0,
		}];

		// Act
		let bound = with_context(|context| {
			let mut invocation = invocation(context);
			context
				.bind(&mut invocation, named, vec![positional("s")], None)
				.map(|()| invocation)
		})
		.unwrap();

		// Assert
		let names: Vec<&str> = bound.arguments.keys().map(String::as_str).collect();
		assert_eq!(names, vec!["value", "suffix"]);
		assert!(matches!(bound.arguments.get("suffix"), Some(Node::Text(text)) if text == "s"));
	}

	#[rstest]
	fn test_piped_value_precedes_positional_arguments() {
		let piped = PositionalArgument {
			value: Node::ObjectAccessor(ObjectAccessor::variable("x")),
			offset: 0,
		};

		let bound = with_context(|context| {
			let mut invocation = invocation(context);
			context
				.bind(&mut invocation, Vec::new(), vec![positional("s")], Some(piped))
				.map(|()| invocation)
		})
		.unwrap();

		assert!(matches!(bound.arguments.get("value"), Some(Node::ObjectAccessor(_))));
		assert!(matches!(bound.arguments.get("suffix"), Some(Node::Text(_))));
	}

	#[rstest]
	fn test_undeclared_named_argument_is_kept_for_the_invoker() {
		let named = vec![NamedArgument {
			name: "other".to_string(),
			value: Node::text("o"),
			offset: 0,
		}];

		let bound = with_context(|context| {
			let mut invocation = invocation(context);
			context
				.bind(&mut invocation, named, Vec::new(), None)
				.map(|()| invocation)
		})
		.unwrap();

		assert!(bound.arguments.contains_key("other"));
	}

	#[rstest]
	#[case::boolean(
		ArgumentDefinition::new("flag", "boolean", ""),
		Node::text("1 == 1"),
		"boolean"
	)]
	#[case::escaped_accessor(
		ArgumentDefinition::new("label", "string", "").escaped(),
		Node::ObjectAccessor(ObjectAccessor::variable("x")),
		"escaping"
	)]
	#[case::escaped_text_is_literal(
		ArgumentDefinition::new("label", "string", "").escaped(),
		Node::text("<b>"),
		"text"
	)]
	fn test_argument_node_follows_declaration(
		#[case] definition: ArgumentDefinition,
		#[case] value: Node,
		#[case] expected: &str,
	) {
		// Act
		let node = with_context(|context| context.argument_node(Some(&definition), value, 0)).unwrap();

		// Assert
		let kind = match node {
			Node::Boolean(_) => "boolean",
			Node::Escaping(_) => "escaping",
			Node::Text(_) => "text",
			_ => "other",
		};
		assert_eq!(kind, expected);
	}

	#[rstest]
	fn test_invalid_condition_is_a_positioned_error() {
		let definition = ArgumentDefinition::new("flag", "boolean", "");

		let error = with_context(|context| {
			context
				.argument_node(Some(&definition), Node::text("a = b"), 0)
				.map(|_| ())
		})
		.unwrap_err();

		assert!(error.to_string().contains("invalid condition"));
	}
}
