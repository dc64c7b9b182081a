//! HTML tag components resolved on demand
//!
//! Every call name under [`HTML_NAMESPACE`](crate::HTML_NAMESPACE) resolves to a
//! component building the element of the same name. Undeclared arguments
//! become attributes:
//!
//! ```text
//! <h:a href="/users/{user.id}" class="nav" data="{id: user.id}">{user.name}</h:a>
//! <h:input type="checkbox" checked="{user.active}" />
//! ```

use std::sync::OnceLock;

use regex::Regex;
use reinhardt_stencil_core::prelude::*;
use reinhardt_stencil_core::ResolutionError;

use crate::HTML_NAMESPACE;
use crate::tag_builder::TagBuilder;

fn element_name_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(r"^[A-Za-z][A-Za-z0-9]*(-[A-Za-z0-9]+)*$").expect("element name pattern is valid")
	})
}

/// Delegate producing an [`HtmlTagComponent`] for any valid element name
#[derive(Debug, Clone)]
pub struct HtmlTagDelegate {
	namespace: String,
}

impl Default for HtmlTagDelegate {
	fn default() -> Self {
		Self::new()
	}
}

impl HtmlTagDelegate {
	pub fn new() -> Self {
		Self::with_namespace(HTML_NAMESPACE)
	}

	/// Serve element components from another namespace
	pub fn with_namespace(namespace: impl Into<String>) -> Self {
		Self {
			namespace: namespace.into(),
		}
	}
}

impl ResolverDelegate for HtmlTagDelegate {
	fn namespace(&self) -> &str {
		&self.namespace
	}

	fn resolve(&self, call_name: &str) -> Result<Option<ComponentType>, ResolutionError> {
		if !element_name_pattern().is_match(call_name) {
			return Err(ResolutionError::Unresolvable {
				namespace: self.namespace.clone(),
				name: call_name.to_string(),
				reason: "not a valid HTML element name".to_string(),
				location: None,
			});
		}
		let element = call_name.to_ascii_lowercase();
		Ok(Some(ComponentType::new(
			format!("{}::{}", self.namespace, element),
			HtmlTagComponent::new(element),
		)))
	}
}

/// Builds one HTML element from its arguments and children
///
/// `additionalAttributes` adds the entries of a map, `data` adds `data-*`
/// attributes and every undeclared argument is set last. Boolean `true`
/// renders a bare attribute, `false` and `null` drop it.
#[derive(Debug, Clone)]
pub struct HtmlTagComponent {
	element: String,
}

impl HtmlTagComponent {
	pub fn new(element: impl Into<String>) -> Self {
		Self {
			element: element.into(),
		}
	}

	pub fn element(&self) -> &str {
		&self.element
	}
}

impl Component for HtmlTagComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments
			.register(ArgumentDefinition::new(
				"additionalAttributes",
				"map",
				"Attributes added to the element",
			))?
			.register(ArgumentDefinition::new(
				"data",
				"map",
				"Entries rendered as data-* attributes",
			))?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let mut tag = TagBuilder::new(self.element.as_str())
			.force_closing_tag(true)
			.spread(arguments.value("additionalAttributes"));
		if let Value::Map(entries) = arguments.value("data") {
			for (name, value) in entries {
				tag = tag.value_attribute(&format!("data-{}", name), value);
			}
		}
		for (name, value) in arguments.undeclared() {
			tag = tag.value_attribute(name, value);
		}

		let content = children.render(context)?.to_output_string();
		Ok(Value::String(tag.content(content).render()))
	}

	fn escape_output(&self) -> bool {
		false
	}

	fn escape_children(&self) -> Option<bool> {
		Some(true)
	}

	fn accepts_undeclared_arguments(&self) -> bool {
		true
	}
}
