//! Sequencer: builds the template tree from scanner captures
//!
//! The sequencer keeps an explicit stack of open invocations. Finished nodes are
//! attached to the innermost open invocation, or to the root when the stack is
//! empty, after passing through the parse's interceptors.
//!
//! ## Contexts
//!
//! - text: literal runs, merged into a single [`Node::Text`] where adjacent
//! - expression: `{...}` parsed by the inline expression grammar; content that
//!   does not form an expression stays text
//! - tag: `<alias:name ...>` headers with attributes, closed by `</alias:name>`
//!   or `/>`

mod arguments;
mod expression;
mod namespace;
mod tag;

use crate::error::TemplateResult;
use crate::escaping::{Interceptor, InterceptorPosition};
use crate::node::{Invocation, Node};
use crate::resolver::Resolver;
use crate::scanner::{Capture, Scanner};
use crate::source::Source;

use self::namespace::{AliasStatus, NamespaceScope};

/// Parse-wide state shared by the expression, tag and argument parsers
pub(crate) struct ParseContext<'a> {
	pub(crate) source: &'a Source,
	pub(crate) resolver: &'a Resolver,
	pub(crate) namespaces: NamespaceScope<'a>,
	/// Wrap escaped arguments in [`Node::Escaping`]
	pub(crate) escaping: bool,
}

impl<'a> ParseContext<'a> {
	/// Parse text that may contain inline expressions but no tags
	///
	/// `quote` is the delimiter of the enclosing quoted string, whose escaped form
	/// is resolved in literal runs.
	pub(crate) fn fragment(
		&self,
		text: &str,
		base: usize,
		quote: Option<u8>,
	) -> TemplateResult<Vec<Node>> {
		let mut scanner = Scanner::fragment(self.source, text, base);
		let mut nodes = Vec::new();
		loop {
			match scanner.next_capture()? {
				Capture::End => break,
				Capture::Text { value, .. } => {
					let value = match quote {
						Some(quote) => expression::unescape(&value, quote),
						None => value,
					};
					push_merged(&mut nodes, Node::Text(value));
				}
				Capture::Expression { inner, raw, offset } => {
					match expression::parse_inline(self, inner, offset, true)? {
						Some(node) => nodes.push(node),
						None => push_merged(&mut nodes, Node::text(raw)),
					}
				}
				Capture::TagStart { raw, .. } | Capture::Cdata { value: raw, .. } => {
					push_merged(&mut nodes, Node::text(raw))
				}
			}
		}
		Ok(nodes)
	}
}

/// Reduce a parsed value to a single node
pub(super) fn collapse(mut nodes: Vec<Node>) -> Node {
	match nodes.len() {
		0 => Node::text(""),
		1 => nodes.remove(0),
		_ => Node::Root(nodes),
	}
}

fn push_merged(nodes: &mut Vec<Node>, node: Node) {
	if let Node::Text(text) = &node {
		if let Some(Node::Text(previous)) = nodes.last_mut() {
			previous.push_str(text);
			return;
		}
	}
	nodes.push(node);
}

/// Parse a template into a [`Node::Root`]
///
/// Namespace declarations are extracted first and stay local to this parse.
pub(crate) fn sequence(
	mut source: Source,
	resolver: &Resolver,
	escaping: bool,
	uri_prefix: &str,
	interceptors: Vec<Box<dyn Interceptor>>,
) -> TemplateResult<Node> {
	let mut namespaces = NamespaceScope::new(resolver);
	namespace::extract(&mut source, &mut namespaces, uri_prefix);

	let context = ParseContext {
		source: &source,
		resolver,
		namespaces,
		escaping,
	};
	let mut sequencer = Sequencer {
		context,
		interceptors,
		stack: Vec::new(),
		root: Vec::new(),
	};
	let root = sequencer.run()?;

	tracing::debug!(
		template = source.name().unwrap_or("<inline>"),
		bytes = source.len(),
		nodes = root.children().len(),
		"sequenced template"
	);
	Ok(root)
}

struct Sequencer<'a> {
	context: ParseContext<'a>,
	interceptors: Vec<Box<dyn Interceptor>>,
	/// Open tag invocations, innermost last
	stack: Vec<Invocation>,
	root: Vec<Node>,
}

impl<'a> Sequencer<'a> {
	fn run(&mut self) -> TemplateResult<Node> {
		let mut scanner = Scanner::new(self.context.source);
		loop {
			match scanner.next_capture()? {
				Capture::End => break,
				Capture::Text { value, .. } => self.text(value),
				Capture::Cdata { value, .. } => self.text(value.to_string()),
				Capture::Expression { inner, raw, offset } => {
					match expression::parse_inline(&self.context, inner, offset, false)? {
						Some(node) => self.expression(node),
						None => self.text(raw.to_string()),
					}
				}
				Capture::TagStart {
					alias,
					name,
					closing,
					raw,
					offset,
				} => self.tag(&mut scanner, alias, name, closing, raw, offset)?,
			}
		}

		if let Some(open) = self.stack.last() {
			return Err(self
				.context
				.source
				.error(
					open.location.offset,
					format!("tag `<{}>` is never closed", open.call_name()),
				)
				.into());
		}
		Ok(Node::Root(std::mem::take(&mut self.root)))
	}

	// ========================================================================
	// Contexts
	// ========================================================================

	fn text(&mut self, value: String) {
		let node = self.intercept(Node::Text(value), InterceptorPosition::Text);
		self.attach(node);
	}

	fn expression(&mut self, node: Node) {
		let node = match node {
			Node::Invocation(invocation) => {
				self.open(&invocation);
				self.intercept(
					Node::Invocation(invocation),
					InterceptorPosition::ClosingComponent,
				)
			}
			node @ Node::ObjectAccessor(_) => {
				self.intercept(node, InterceptorPosition::ObjectAccessor)
			}
			node => node,
		};
		self.attach(node);
	}

	fn tag(
		&mut self,
		scanner: &mut Scanner<'_>,
		alias: &str,
		name: &str,
		closing: bool,
		raw: &str,
		offset: usize,
	) -> TemplateResult<()> {
		let location = self.context.source.location(offset);
		let targets = match self.context.namespaces.status(alias) {
			Ok(AliasStatus::Known(targets)) => targets,
			Ok(AliasStatus::Ignored) => {
				self.text(raw.to_string());
				return Ok(());
			}
			Err(error) => return Err(error.with_location(location).into()),
		};
		let component = self
			.context
			.resolver
			.resolve_in(alias, &targets, name)
			.map_err(|error| error.with_location(location))?;

		if closing {
			scanner.finish_close_tag(offset)?;
			let Some(invocation) = self.stack.pop() else {
				return Err(self
					.context
					.source
					.error(
						offset,
						format!("closing tag `</{}:{}>` has no open tag", alias, name),
					)
					.into());
			};
			if invocation.component.type_name() != component.type_name() {
				return Err(self
					.context
					.source
					.error(
						offset,
						format!(
							"closing tag `</{}:{}>` does not match `<{}>` opened at {}",
							alias,
							name,
							invocation.call_name(),
							invocation.location
						),
					)
					.into());
			}
			self.close(invocation);
			return Ok(());
		}

		let body = scanner.finish_open_tag(offset)?;
		let mut invocation = Invocation::new(alias, name, component, location);
		let attributes = tag::parse_attributes(&self.context, body.attributes, body.attributes_offset)?;
		invocation.dynamic_arguments = attributes.dynamic;
		self.context
			.bind(&mut invocation, attributes.named, Vec::new(), None)?;

		self.open(&invocation);
		if body.self_closing {
			self.close(invocation);
		} else {
			self.stack.push(invocation);
		}
		Ok(())
	}

	// ========================================================================
	// Tree building
	// ========================================================================

	fn open(&mut self, invocation: &Invocation) {
		for interceptor in &mut self.interceptors {
			if interceptor
				.positions()
				.contains(&InterceptorPosition::OpeningComponent)
			{
				interceptor.open_component(invocation);
			}
		}
	}

	fn close(&mut self, invocation: Invocation) {
		let node = self.intercept(
			Node::Invocation(Box::new(invocation)),
			InterceptorPosition::ClosingComponent,
		);
		self.attach(node);
	}

	fn intercept(&mut self, mut node: Node, position: InterceptorPosition) -> Node {
		for interceptor in &mut self.interceptors {
			if interceptor.positions().contains(&position) {
				node = interceptor.process(node, position);
			}
		}
		node
	}

	fn attach(&mut self, node: Node) {
		let target = match self.stack.last_mut() {
			Some(invocation) => &mut invocation.children,
			None => &mut self.root,
		};
		push_merged(target, node);
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::component::{
		ArgumentDefinition, ArgumentRegistrar, Arguments, Children, Component,
	};
	use crate::context::RenderingContext;
	use crate::error::{ArgumentContractError, TemplateError};
	use crate::escaping::HtmlEscapingInterceptor;
	use crate::value::Value;
	use rstest::rstest;

	/// `value` followed by `suffix`
	struct Echo;

	impl Component for Echo {
		fn register_arguments(
			&self,
			arguments: &mut ArgumentRegistrar,
		) -> Result<(), ArgumentContractError> {
			arguments
				.register(ArgumentDefinition::new("value", "mixed", "Echoed value"))?
				.register(ArgumentDefinition::new("suffix", "string", "Appended text"))?;
			Ok(())
		}

		fn render(
			&self,
			arguments: &Arguments,
			children: &Children<'_>,
			context: &mut RenderingContext,
		) -> TemplateResult<Value> {
			let value = arguments.content_or_children("value", children, context)?;
			Ok(Value::String(format!(
				"{}{}",
				value.to_output_string(),
				arguments.string("suffix")
			)))
		}
	}

	/// Renders its children unescaped
	struct Raw;

	impl Component for Raw {
		fn render(
			&self,
			_arguments: &Arguments,
			children: &Children<'_>,
			context: &mut RenderingContext,
		) -> TemplateResult<Value> {
			children.render(context)
		}

		fn escape_output(&self) -> bool {
			false
		}

		fn escape_children(&self) -> Option<bool> {
			Some(false)
		}
	}

	fn resolver() -> Resolver {
		let resolver = Resolver::default();
		resolver.register_namespace("t", "t");
		resolver.register_component("t::EchoComponent", Echo);
		resolver.register_component("t::RawComponent", Raw);
		resolver
	}

	/// Run `body` against a parse context with the `t` namespace registered
	pub(crate) fn with_context<T>(body: impl FnOnce(&ParseContext<'_>) -> T) -> T {
		let resolver = resolver();
		let source = Source::new("");
		let context = ParseContext {
			source: &source,
			resolver: &resolver,
			namespaces: NamespaceScope::new(&resolver),
			escaping: true,
		};
		body(&context)
	}

	fn parse(text: &str) -> TemplateResult<Node> {
		let resolver = resolver();
		sequence(
			Source::new(text),
			&resolver,
			true,
			crate::config::DEFAULT_NAMESPACE_URI_PREFIX,
			vec![Box::new(HtmlEscapingInterceptor::new())],
		)
	}

	#[rstest]
	fn test_empty_input_yields_empty_root() {
		let root = parse("").unwrap();

		assert!(matches!(root, Node::Root(ref children) if children.is_empty()));
	}

	#[rstest]
	fn test_tag_with_attribute_and_text_child() {
		// Act
		let root = parse(r#"<t:echo suffix="foo">x</t:echo>"#).unwrap();

		// Assert
		let [Node::Escaping(inner)] = root.children() else {
			panic!("expected one escaped invocation, got {root:?}");
		};
		let invocation = inner.as_invocation().unwrap();
		assert!(matches!(
			invocation.arguments.get("suffix"),
			Some(Node::Text(text)) if text == "foo"
		));
		assert!(matches!(invocation.children.as_slice(), [Node::Text(text)] if text == "x"));
	}

	#[rstest]
	#[case("{1+1}", "{1+1}")]
	#[case("a { b } c", "a { b } c")]
	#[case("<p>{name: 1}</p>", "<p>{name: 1}</p>")]
	#[case("<![CDATA[{x}]]>", "<![CDATA[{x}]]>")]
	fn test_foreign_syntax_stays_text(#[case] input: &str, #[case] expected: &str) {
		let root = parse(input).unwrap();

		assert!(matches!(root.children(), [Node::Text(text)] if text == expected));
	}

	#[rstest]
	fn test_accessors_are_escaped_except_inside_raw_components() {
		// Act
		let root = parse("{a}<t:raw>{b}</t:raw>").unwrap();

		// Assert
		let [Node::Escaping(first), Node::Invocation(raw)] = root.children() else {
			panic!("unexpected tree {root:?}");
		};
		assert!(matches!(**first, Node::ObjectAccessor(_)));
		assert!(matches!(raw.children.as_slice(), [Node::ObjectAccessor(_)]));
	}

	#[rstest]
	fn test_self_closing_tag_has_no_children() {
		let root = parse("<t:echo value='1' />after").unwrap();

		let [Node::Escaping(inner), Node::Text(after)] = root.children() else {
			panic!("unexpected tree {root:?}");
		};
		assert!(inner.as_invocation().unwrap().children.is_empty());
		assert_eq!(after, "after");
	}

	#[rstest]
	#[case("<t:echo>", "is never closed")]
	#[case("</t:echo>", "has no open tag")]
	#[case("<t:echo><t:raw></t:echo></t:raw>", "does not match")]
	fn test_tag_structure_errors(#[case] input: &str, #[case] message: &str) {
		let error = parse(input).unwrap_err();

		assert!(matches!(error, TemplateError::Sequencing(_)));
		assert!(error.to_string().contains(message), "{error}");
	}

	#[rstest]
	fn test_unknown_alias_in_tag_is_a_resolution_error() {
		let error = parse("<x:thing />").unwrap_err();

		assert!(matches!(error, TemplateError::Resolution(_)));
		assert_eq!(error.location().map(|location| location.column), Some(1));
	}

	#[rstest]
	fn test_ignored_namespace_tag_is_text() {
		let root = parse("{namespace svg}<svg:rect width=\"1\"/>").unwrap();

		assert!(matches!(
			root.children(),
			[Node::Text(text)] if text == "<svg:rect width=\"1\"/>"
		));
	}

	#[rstest]
	fn test_template_namespace_declaration_does_not_leak() {
		// Arrange
		let resolver = resolver();
		let declared = "{namespace u=t}<u:echo value='1'/>";

		// Act
		let first = sequence(
			Source::new(declared),
			&resolver,
			true,
			crate::config::DEFAULT_NAMESPACE_URI_PREFIX,
			Vec::new(),
		);
		let second = sequence(
			Source::new("<u:echo value='1'/>"),
			&resolver,
			true,
			crate::config::DEFAULT_NAMESPACE_URI_PREFIX,
			Vec::new(),
		);

		// Assert
		assert!(first.is_ok());
		assert!(matches!(second, Err(TemplateError::Resolution(_))));
	}

	#[rstest]
	fn test_error_offsets_refer_to_original_text() {
		let error = parse("{namespace svg}\n  <t:echo").unwrap_err();

		let location = error.location().unwrap();
		assert_eq!((location.line, location.column), (2, 3));
	}
}
