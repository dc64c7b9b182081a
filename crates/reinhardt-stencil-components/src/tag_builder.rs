//! HTML tag assembly
//!
//! [`TagBuilder`] collects a tag name, attributes and content and renders them
//! as markup. Attribute values are always HTML-escaped; the content is emitted
//! as given, so callers pass content that is already escaped where needed.

use indexmap::IndexMap;
use reinhardt_stencil_core::{Value, escape_html};

/// Elements that never have content or a closing tag
const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

/// Whether `name` is an HTML void element
pub fn is_void_element(name: &str) -> bool {
	VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// Builder for a single HTML element
///
/// # Examples
///
/// ```
/// use reinhardt_stencil_components::TagBuilder;
///
/// let html = TagBuilder::new("a")
///     .attribute("href", "/about")
///     .attribute("class", "nav-link")
///     .content("About")
///     .render();
/// assert_eq!(html, r#"<a href="/about" class="nav-link">About</a>"#);
///
/// let image = TagBuilder::new("img")
///     .attribute("src", "/static/logo.png")
///     .attribute("alt", "Logo \"main\"")
///     .render();
/// assert_eq!(image, r#"<img src="/static/logo.png" alt="Logo &quot;main&quot;" />"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagBuilder {
	name: String,
	attributes: IndexMap<String, Option<String>>,
	content: String,
	force_closing_tag: bool,
}

impl TagBuilder {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Set an attribute, replacing an earlier value of the same name
	pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.insert(name.into(), Some(value.into()));
		self
	}

	/// Set an attribute rendered without a value, such as `disabled`
	pub fn flag(mut self, name: impl Into<String>) -> Self {
		self.attributes.insert(name.into(), None);
		self
	}

	/// Set an attribute from a template value
	///
	/// `true` becomes a flag, `false` and `null` remove the attribute, every
	/// other value is set through its output string.
	pub fn value_attribute(mut self, name: &str, value: &Value) -> Self {
		match value {
			Value::Null | Value::Bool(false) => {
				self.attributes.shift_remove(name);
				self
			}
			Value::Bool(true) => self.flag(name),
			other => self.attribute(name, other.to_output_string()),
		}
	}

	/// Append every entry of a map as an attribute; other values are ignored
	pub fn spread(mut self, attributes: &Value) -> Self {
		if let Value::Map(entries) = attributes {
			for (name, value) in entries {
				self = self.value_attribute(name, value);
			}
		}
		self
	}

	pub fn has_attribute(&self, name: &str) -> bool {
		self.attributes.contains_key(name)
	}

	/// Set the content emitted between the opening and closing tag
	pub fn content(mut self, content: impl Into<String>) -> Self {
		self.content = content.into();
		self
	}

	/// Emit `<x></x>` instead of `<x />` when there is no content
	pub fn force_closing_tag(mut self, force: bool) -> Self {
		self.force_closing_tag = force;
		self
	}

	/// Attributes as ` name="value"` pairs with a leading space each
	pub fn render_attributes(&self) -> String {
		let mut output = String::new();
		for (name, value) in &self.attributes {
			output.push(' ');
			output.push_str(name);
			if let Some(value) = value {
				output.push_str("=\"");
				output.push_str(&escape_html(value));
				output.push('"');
			}
		}
		output
	}

	pub fn render(&self) -> String {
		let attributes = self.render_attributes();
		if is_void_element(&self.name) {
			return format!("<{}{} />", self.name, attributes);
		}
		if self.content.is_empty() && !self.force_closing_tag {
			return format!("<{}{} />", self.name, attributes);
		}
		format!(
			"<{name}{attributes}>{content}</{name}>",
			name = self.name,
			content = self.content
		)
	}
}
