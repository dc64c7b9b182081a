//! Attribute parsing for component tags
//!
//! ```text
//! <f:link href="/u/{user.id}" class="{css}" active {attrs} {name}="value" />
//! ```
//!
//! - `name="..."`: the value may mix text and inline expressions
//! - `name`: shorthand for `name="{name}"`
//! - `{map}`: spreads a map into the arguments at render time
//! - `{accessor}="..."`: the argument name is evaluated at render time
//!
//! Namespace declarations (`xmlns`, `xmlns:*`, `data-stencil-namespace`) are not
//! arguments and are dropped.

use crate::error::TemplateResult;
use crate::node::{DynamicArgument, Node, ObjectAccessor};

use super::arguments::NamedArgument;
use super::expression::parse_inline;
use super::{ParseContext, collapse};

const NAMESPACE_MARKER: &str = "data-stencil-namespace";

/// Arguments found in a tag header
pub(super) struct Attributes {
	pub(super) named: Vec<NamedArgument>,
	pub(super) dynamic: Vec<DynamicArgument>,
}

fn is_name_start(byte: u8) -> bool {
	byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_name_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.' | b':')
}

fn is_namespace_declaration(name: &str) -> bool {
	name == "xmlns" || name.starts_with("xmlns:") || name == NAMESPACE_MARKER
}

/// Parse the attribute area of a tag; `base` is the offset of `text` in the source
pub(super) fn parse_attributes(
	context: &ParseContext<'_>,
	text: &str,
	base: usize,
) -> TemplateResult<Attributes> {
	let bytes = text.as_bytes();
	let error = |pos: usize, message: String| context.source.error(base + pos, message);
	let mut attributes = Attributes {
		named: Vec::new(),
		dynamic: Vec::new(),
	};

	let mut pos = 0;
	loop {
		while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
			pos += 1;
		}
		let Some(&byte) = bytes.get(pos) else {
			break;
		};

		if byte == b'{' {
			let start = pos;
			let Some(close) = matching_brace(bytes, start) else {
				return Err(error(start, "unterminated expression in tag".to_string()).into());
			};
			let inner = &text[start + 1..close];
			let Some(expression) = parse_inline(context, inner, base + start + 1, false)? else {
				return Err(error(start, format!("`{{{}}}` is not a valid expression", inner)).into());
			};
			pos = close + 1;

			if bytes.get(pos) == Some(&b'=') {
				pos += 1;
				let value = quoted_value(context, text, base, &mut pos)
					.ok_or_else(|| error(pos, "dynamic attribute value must be quoted".to_string()))??;
				attributes.dynamic.push(DynamicArgument::Named {
					name: expression,
					value,
				});
			} else {
				attributes.dynamic.push(DynamicArgument::Spread(expression));
			}
			continue;
		}

		if !is_name_start(byte) {
			return Err(error(pos, format!("unexpected `{}` in tag", byte as char)).into());
		}
		let start = pos;
		while bytes.get(pos).copied().is_some_and(is_name_byte) {
			pos += 1;
		}
		let name = &text[start..pos];

		let mut lookahead = pos;
		while bytes.get(lookahead).is_some_and(u8::is_ascii_whitespace) {
			lookahead += 1;
		}
		let value = if bytes.get(lookahead) == Some(&b'=') {
			pos = lookahead + 1;
			while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
				pos += 1;
			}
			quoted_value(context, text, base, &mut pos).ok_or_else(|| {
				error(pos, format!("value of attribute `{}` must be quoted", name))
			})??
		} else {
			let Some(accessor) = ObjectAccessor::parse(name) else {
				return Err(error(start, format!("`{}` is not a valid shorthand attribute", name)).into());
			};
			Node::ObjectAccessor(accessor)
		};

		if is_namespace_declaration(name) {
			continue;
		}
		attributes.named.push(NamedArgument {
			name: name.to_string(),
			value,
			offset: base + start,
		});
	}
	Ok(attributes)
}

/// Parse a quoted value at `pos`; `None` when no quote starts there
fn quoted_value(
	context: &ParseContext<'_>,
	text: &str,
	base: usize,
	pos: &mut usize,
) -> Option<TemplateResult<Node>> {
	let bytes = text.as_bytes();
	let quote = *bytes.get(*pos).filter(|byte| matches!(**byte, b'"' | b'\''))?;
	let start = *pos + 1;
	let mut index = start;
	while index < bytes.len() && bytes[index] != quote {
		index += if bytes[index] == b'\\' { 2 } else { 1 };
	}
	if index >= bytes.len() {
		*pos = bytes.len();
		return Some(Err(context
			.source
			.error(base + start - 1, "unterminated quoted value".to_string())
			.into()));
	}
	*pos = index + 1;
	Some(
		context
			.fragment(&text[start..index], base + start, Some(quote))
			.map(collapse),
	)
}

/// Index of the `}` closing the brace at `open`, skipping quoted spans
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
	let mut depth = 0usize;
	let mut index = open;
	while index < bytes.len() {
		match bytes[index] {
			quote @ (b'\'' | b'"') => {
				index += 1;
				while index < bytes.len() && bytes[index] != quote {
					index += if bytes[index] == b'\\' { 2 } else { 1 };
				}
				index += 1;
			}
			b'{' => {
				depth += 1;
				index += 1;
			}
			b'}' => {
				depth -= 1;
				if depth == 0 {
					return Some(index);
				}
				index += 1;
			}
			_ => index += 1,
		}
	}
	None
}
