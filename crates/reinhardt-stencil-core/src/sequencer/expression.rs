//! Inline expression grammar
//!
//! ```text
//! chain      := operand (('|' | '->') call)*
//! operand    := call | array | quoted | number | keyword | accessor
//! call       := alias ':' name '(' (argument (',' argument)* ','?)? ')'
//! argument   := (key ':')? chain
//! array      := '{' (entry (',' entry)* ','?)? '}'
//! entry      := (key ':')? chain
//! ```
//!
//! Arrays and quoted strings are only recognized inside call arguments and
//! array entries; the top level of an expression found in template text is
//! restricted to chains, accessors and literals so that foreign brace syntax
//! degrades to text. Once a call head `alias:name(` has been read the parser is
//! committed and every further violation is a hard error.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ResolutionError, TemplateError};
use crate::node::{ArrayEntry, ArrayNode, Invocation, Node, ObjectAccessor, PathSegment};
use crate::value::Value;

use super::ParseContext;
use super::arguments::{NamedArgument, PositionalArgument};
use super::namespace::AliasStatus;

fn call_head_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(r"^([A-Za-z][A-Za-z0-9_\-]*):([A-Za-z][A-Za-z0-9_.\-]*)\(")
			.expect("call head pattern is valid")
	})
}

fn number_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(r"^-?[0-9]+(\.[0-9]+)?").expect("number pattern is valid")
	})
}

pub(super) enum Failure {
	/// The text is not an expression; the caller falls back to literal text
	NoMatch,
	Fatal(TemplateError),
}

impl From<TemplateError> for Failure {
	fn from(error: TemplateError) -> Self {
		Self::Fatal(error)
	}
}

impl From<ResolutionError> for Failure {
	fn from(error: ResolutionError) -> Self {
		Self::Fatal(error.into())
	}
}

type Parsed<T> = Result<T, Failure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
	/// Top level of an expression
	Top,
	Argument,
	/// Array entry; quoted strings are not interpolated
	ArrayValue,
}

struct CallHead<'t> {
	alias: &'t str,
	name: &'t str,
	start: usize,
	/// Index just past the opening parenthesis
	end: usize,
}

/// Parse the inside of `{...}`
///
/// `arrays` enables a top-level array body such as `{key: 'value', 2}`, which is
/// valid in attribute values but not in template text. `Ok(None)` means the
/// content is not an expression.
pub(super) fn parse_inline(
	context: &ParseContext<'_>,
	inner: &str,
	offset: usize,
	arrays: bool,
) -> Result<Option<Node>, TemplateError> {
	let mut parser = ExpressionParser::new(context, inner, offset);
	match parser.complete(|parser| parser.chain(Position::Top)) {
		Ok(node) => return Ok(Some(node)),
		Err(Failure::Fatal(error)) => return Err(error),
		Err(Failure::NoMatch) => {}
	}
	if !arrays {
		return Ok(None);
	}

	let mut parser = ExpressionParser::new(context, inner, offset);
	match parser.complete(|parser| parser.array_body(None)) {
		Ok(node) => Ok(Some(node)),
		Err(Failure::Fatal(error)) => Err(error),
		Err(Failure::NoMatch) => Ok(None),
	}
}

struct ExpressionParser<'c, 'a, 't> {
	context: &'c ParseContext<'a>,
	text: &'t str,
	base: usize,
	pos: usize,
	committed: bool,
}

impl<'c, 'a, 't> ExpressionParser<'c, 'a, 't> {
	fn new(context: &'c ParseContext<'a>, text: &'t str, base: usize) -> Self {
		Self {
			context,
			text,
			base,
			pos: 0,
			committed: false,
		}
	}

	// ========================================================================
	// Cursor helpers
	// ========================================================================

	fn bytes(&self) -> &'t [u8] {
		self.text.as_bytes()
	}

	fn peek(&self) -> Option<u8> {
		self.bytes().get(self.pos).copied()
	}

	fn at_end(&self) -> bool {
		self.pos >= self.text.len()
	}

	fn skip_whitespace(&mut self) {
		while self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
			self.pos += 1;
		}
	}

	fn eat(&mut self, expected: &str) -> bool {
		if self.text[self.pos..].starts_with(expected) {
			self.pos += expected.len();
			true
		} else {
			false
		}
	}

	fn fatal(&self, pos: usize, message: impl Into<String>) -> Failure {
		Failure::Fatal(self.context.source.error(self.base + pos, message).into())
	}

	/// Turn a soft failure into a hard one once the parser is committed
	fn require<T>(&self, parsed: Parsed<T>, pos: usize, message: &str) -> Parsed<T> {
		match parsed {
			Err(Failure::NoMatch) => Err(self.fatal(pos, message)),
			other => other,
		}
	}

	fn complete(&mut self, parse: impl FnOnce(&mut Self) -> Parsed<Node>) -> Parsed<Node> {
		let node = parse(self)?;
		self.skip_whitespace();
		if self.at_end() {
			return Ok(node);
		}
		if self.committed {
			let rest: String = self.text[self.pos..].chars().take(12).collect();
			return Err(self.fatal(self.pos, format!("unexpected `{}` after expression", rest)));
		}
		Err(Failure::NoMatch)
	}

	// ========================================================================
	// Grammar
	// ========================================================================

	fn chain(&mut self, position: Position) -> Parsed<Node> {
		let mut node = self.operand(position)?;
		loop {
			let before = self.pos;
			self.skip_whitespace();
			let piped = if self.eat("->") {
				true
			} else if self.peek() == Some(b'|') && self.bytes().get(self.pos + 1) != Some(&b'|') {
				self.pos += 1;
				true
			} else {
				false
			};
			if !piped {
				self.pos = before;
				return Ok(node);
			}

			self.skip_whitespace();
			let pipe_offset = self.base + before;
			let Some(head) = self.call_head() else {
				return Err(Failure::NoMatch);
			};
			node = self.call(
				head,
				Some(PositionalArgument {
					value: node,
					offset: pipe_offset,
				}),
			)?;
		}
	}

	fn operand(&mut self, position: Position) -> Parsed<Node> {
		match self.peek() {
			None => return Err(Failure::NoMatch),
			Some(quote @ (b'\'' | b'"')) if position != Position::Top => {
				return self.quoted(quote, position == Position::Argument);
			}
			Some(b'{') if position != Position::Top => {
				self.pos += 1;
				return self.array_body(Some(b'}'));
			}
			_ => {}
		}

		if let Some(head) = self.call_head() {
			return self.call(head, None);
		}
		if let Some(number) = self.number() {
			return Ok(Node::Literal(number));
		}

		let (accessor, end) =
			ObjectAccessor::parse_prefix(self.bytes(), self.pos).ok_or(Failure::NoMatch)?;
		self.pos = end;
		if let [PathSegment::Key(key)] = accessor.segments() {
			match key.as_str() {
				"true" => return Ok(Node::Literal(Value::Bool(true))),
				"false" => return Ok(Node::Literal(Value::Bool(false))),
				"null" => return Ok(Node::Literal(Value::Null)),
				_ => {}
			}
		}
		Ok(Node::ObjectAccessor(accessor))
	}

	fn number(&mut self) -> Option<Value> {
		let found = number_pattern().find(&self.text[self.pos..])?;
		let end = self.pos + found.end();
		if self
			.bytes()
			.get(end)
			.is_some_and(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.'))
		{
			return None;
		}
		let literal = found.as_str();
		let value = match literal.parse::<i64>() {
			Ok(integer) => Value::Int(integer),
			Err(_) => Value::Float(literal.parse::<f64>().ok()?),
		};
		self.pos = end;
		Some(value)
	}

	fn call_head(&self) -> Option<CallHead<'t>> {
		let rest = &self.text[self.pos..];
		let captures = call_head_pattern().captures(rest)?;
		let (whole, alias, name) = (captures.get(0)?, captures.get(1)?, captures.get(2)?);
		Some(CallHead {
			alias: &rest[alias.range()],
			name: &rest[name.range()],
			start: self.pos,
			end: self.pos + whole.end(),
		})
	}

	fn call(&mut self, head: CallHead<'t>, piped: Option<PositionalArgument>) -> Parsed<Node> {
		let offset = self.base + head.start;
		let location = self.context.source.location(offset);
		let targets = match self.context.namespaces.status(head.alias) {
			Ok(AliasStatus::Known(targets)) => targets,
			Ok(AliasStatus::Ignored) => return Err(Failure::NoMatch),
			Err(error) => return Err(error.with_location(location).into()),
		};
		self.committed = true;
		let component = self
			.context
			.resolver
			.resolve_in(head.alias, &targets, head.name)
			.map_err(|error| error.with_location(location))?;
		self.pos = head.end;

		let (named, positional) = self.arguments(head.start)?;
		let mut invocation = Invocation::new(head.alias, head.name, component, location);
		self.context
			.bind(&mut invocation, named, positional, piped)?;
		Ok(Node::Invocation(Box::new(invocation)))
	}

	fn arguments(
		&mut self,
		call_start: usize,
	) -> Parsed<(Vec<NamedArgument>, Vec<PositionalArgument>)> {
		let mut named = Vec::new();
		let mut positional = Vec::new();
		loop {
			self.skip_whitespace();
			if self.at_end() {
				return Err(self.fatal(call_start, "unterminated argument list, expected `)`"));
			}
			if self.eat(")") {
				break;
			}

			let start = self.pos;
			let key = if self.call_head().is_some() {
				None
			} else {
				self.key()?
			};
			self.skip_whitespace();
			let value_start = self.pos;
			let value = self.chain(Position::Argument);
			let value = self.require(value, value_start, "invalid argument value")?;
			match key {
				Some(name) => named.push(NamedArgument {
					name,
					value,
					offset: self.base + start,
				}),
				None => positional.push(PositionalArgument {
					value,
					offset: self.base + start,
				}),
			}

			self.skip_whitespace();
			if self.eat(",") {
				continue;
			}
			if self.eat(")") {
				break;
			}
			if self.at_end() {
				return Err(self.fatal(call_start, "unterminated argument list, expected `)`"));
			}
			return Err(self.fatal(self.pos, "expected `,` or `)` in argument list"));
		}
		Ok((named, positional))
	}

	/// An argument or array key followed by `:`; the cursor is restored when absent
	fn key(&mut self) -> Parsed<Option<String>> {
		let start = self.pos;
		let key = match self.peek() {
			Some(quote @ (b'\'' | b'"')) => match self.quoted_span(quote) {
				Some(content) => unescape(content, quote),
				None => return Ok(None),
			},
			Some(byte) if byte.is_ascii_alphanumeric() || byte == b'_' => {
				let length = self.bytes()[self.pos..]
					.iter()
					.take_while(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-'))
					.count();
				let key = self.text[self.pos..self.pos + length].to_string();
				self.pos += length;
				key
			}
			_ => return Ok(None),
		};

		self.skip_whitespace();
		if self.peek() == Some(b':') && self.bytes().get(self.pos + 1) != Some(&b':') {
			self.pos += 1;
			Ok(Some(key))
		} else {
			self.pos = start;
			Ok(None)
		}
	}

	/// Content of the quoted span at the cursor, advancing past it
	fn quoted_span(&mut self, quote: u8) -> Option<&'t str> {
		let bytes = self.bytes();
		let mut index = self.pos + 1;
		while index < bytes.len() {
			match bytes[index] {
				b'\\' => index += 2,
				byte if byte == quote => {
					let content = &self.text[self.pos + 1..index];
					self.pos = index + 1;
					return Some(content);
				}
				_ => index += 1,
			}
		}
		None
	}

	fn quoted(&mut self, quote: u8, interpolate: bool) -> Parsed<Node> {
		let content_offset = self.base + self.pos + 1;
		let content = self.quoted_span(quote).ok_or(Failure::NoMatch)?;
		if interpolate && content.contains('{') {
			let nodes = self
				.context
				.fragment(content, content_offset, Some(quote))?;
			return Ok(super::collapse(nodes));
		}
		Ok(Node::Text(unescape(content, quote)))
	}

	/// Entries up to `close`, or to the end of the text when `close` is `None`
	fn array_body(&mut self, close: Option<u8>) -> Parsed<Node> {
		let open = self.pos.saturating_sub(1);
		let mut entries = Vec::new();
		loop {
			self.skip_whitespace();
			if self.closes(close) {
				break;
			}
			if self.at_end() {
				return match close {
					Some(_) if self.committed => Err(self.fatal(open, "unterminated array, expected `}`")),
					_ => Err(Failure::NoMatch),
				};
			}

			let key = if self.call_head().is_some() {
				None
			} else {
				self.key()?
			};
			self.skip_whitespace();
			let value = self.chain(Position::ArrayValue)?;
			entries.push(ArrayEntry { key, value });

			self.skip_whitespace();
			if self.eat(",") {
				continue;
			}
			if self.closes(close) {
				break;
			}
			return Err(Failure::NoMatch);
		}
		Ok(Node::Array(ArrayNode::new(entries)))
	}

	fn closes(&mut self, close: Option<u8>) -> bool {
		match close {
			Some(byte) if self.peek() == Some(byte) => {
				self.pos += 1;
				true
			}
			None => self.at_end(),
			_ => false,
		}
	}
}

/// Remove backslashes escaping `quote`
pub(super) fn unescape(content: &str, quote: u8) -> String {
	let escaped = format!("\\{}", quote as char);
	content.replace(&escaped, &(quote as char).to_string())
}
