//! `f:format.raw`, `f:format.htmlspecialchars` and `f:format.json`
//!
//! All three take their input from `value`, a piped value or the children, and
//! receive the children unescaped.

use std::sync::OnceLock;

use regex::Regex;
use reinhardt_stencil_core::prelude::*;

fn entity_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(r"^&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);")
			.expect("entity pattern is valid")
	})
}

/// Escape HTML special characters with control over quotes and existing entities
///
/// # Examples
///
/// ```
/// use reinhardt_stencil_components::html_special_chars;
///
/// assert_eq!(html_special_chars("<a href='x'>", false, true), "&lt;a href=&#x27;x&#x27;&gt;");
/// assert_eq!(html_special_chars("\"q\"", true, true), "\"q\"");
/// assert_eq!(html_special_chars("&amp; &", false, false), "&amp; &amp;");
/// ```
pub fn html_special_chars(input: &str, keep_quotes: bool, double_encode: bool) -> String {
	let mut escaped = String::with_capacity(input.len());
	for (index, c) in input.char_indices() {
		match c {
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'&' if !double_encode && entity_pattern().is_match(&input[index..]) => escaped.push('&'),
			'&' => escaped.push_str("&amp;"),
			'"' if !keep_quotes => escaped.push_str("&quot;"),
			'\'' if !keep_quotes => escaped.push_str("&#x27;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

/// Outputs its input without escaping
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatRawComponent;

impl Component for FormatRawComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments.register(ArgumentDefinition::new("value", "mixed", "Value to output as is"))?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		arguments.content_or_children("value", children, context)
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

/// Escapes its input, optionally keeping quotes and existing entities
///
/// Collections and `null` pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatHtmlspecialcharsComponent;

impl Component for FormatHtmlspecialcharsComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments
			.register(ArgumentDefinition::new("value", "string", "Text to escape"))?
			.register(
				ArgumentDefinition::new("keepQuotes", "boolean", "Leave quotes unescaped")
					.with_default(false),
			)?
			.register(
				ArgumentDefinition::new("doubleEncode", "boolean", "Escape existing entities again")
					.with_default(true),
			)?;
		Ok(())
	}

	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let value = arguments.content_or_children("value", children, context)?;
		if value.is_null() || value.is_collection() {
			return Ok(value);
		}
		Ok(Value::String(html_special_chars(
			&value.to_output_string(),
			arguments.bool("keepQuotes"),
			arguments.bool("doubleEncode"),
		)))
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

/// Encodes its input as JSON
///
/// With `forceObject` a list is encoded as an object keyed by index.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatJsonComponent;

impl Component for FormatJsonComponent {
	fn register_arguments(
		&self,
		arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		arguments
			.register(ArgumentDefinition::new("value", "mixed", "Value to encode"))?
			.register(
				ArgumentDefinition::new("forceObject", "boolean", "Encode lists as objects")
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
		let value = match arguments.content_or_children("value", children, context)? {
			Value::List(items) if arguments.bool("forceObject") => Value::Map(
				items
					.into_iter()
					.enumerate()
					.map(|(index, item)| (index.to_string(), item))
					.collect(),
			),
			value => value,
		};
		Ok(Value::String(serde_json::to_string(&value)?))
	}

	fn escape_children(&self) -> Option<bool> {
		Some(false)
	}

	fn content_argument_name(&self) -> Option<&str> {
		Some("value")
	}
}
