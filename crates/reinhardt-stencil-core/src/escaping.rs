//! HTML escaping and the escaping interceptor pipeline
//!
//! Interceptors run at parse time, while the sequencer attaches finished nodes to
//! the body of a template or of an invocation. Argument values are never
//! intercepted.
//!
//! The default [`HtmlEscapingInterceptor`] wraps object accessors and the
//! output of components in [`Node::Escaping`] unless an enclosing component
//! disabled children escaping, or the component disabled output escaping.
//! A component that escapes its own output disables children escaping, so a
//! value reaching output below it is escaped exactly once. Literal template
//! text is left untouched.
//!
//! Escaped characters:
//! - `<` → `&lt;`
//! - `>` → `&gt;`
//! - `&` → `&amp;`
//! - `"` → `&quot;`
//! - `'` → `&#x27;`

use std::sync::Arc;

use crate::node::{Invocation, Node};
use crate::value::Value;

/// Escape HTML special characters
///
/// # Examples
///
/// ```
/// use reinhardt_stencil_core::escape_html;
///
/// assert_eq!(escape_html("<script>alert('XSS')</script>"),
///            "&lt;script&gt;alert(&#x27;XSS&#x27;)&lt;/script&gt;");
/// assert_eq!(escape_html("Hello & goodbye"), "Hello &amp; goodbye");
/// ```
pub fn escape_html(s: &str) -> String {
	let mut escaped = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'&' => escaped.push_str("&amp;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#x27;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

/// Escape a value if it is a string; other values pass through unchanged
pub fn escape_value(value: Value) -> Value {
	match value {
		Value::String(s) => Value::String(escape_html(&s)),
		other => other,
	}
}

/// Points at which the sequencer consults interceptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterceptorPosition {
	/// An invocation was opened; its children are not parsed yet
	OpeningComponent,
	/// An invocation is complete and about to be attached to its parent
	ClosingComponent,
	Text,
	ObjectAccessor,
}

/// Parse-time node transform
///
/// A fresh instance is created for every parse, so interceptors may keep state.
pub trait Interceptor: Send {
	/// Positions at which [`Interceptor::process`] is called
	fn positions(&self) -> &[InterceptorPosition];

	/// Observe an opened invocation before its children are parsed
	fn open_component(&mut self, _invocation: &Invocation) {}

	/// Transform a finished node
	fn process(&mut self, node: Node, position: InterceptorPosition) -> Node;
}

/// Creates one interceptor per parse
pub type InterceptorFactory = Arc<dyn Fn() -> Box<dyn Interceptor> + Send + Sync>;

/// Default interceptor enforcing HTML escaping
#[derive(Debug, Default)]
pub struct HtmlEscapingInterceptor {
	/// One entry per open invocation: whether it disables children escaping
	open: Vec<bool>,
}

impl HtmlEscapingInterceptor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Factory suitable for [`crate::EngineBuilder::interceptor`]
	pub fn factory() -> InterceptorFactory {
		Arc::new(|| Box::new(Self::new()))
	}

	fn children_escaping_enabled(&self) -> bool {
		!self.open.iter().any(|disables| *disables)
	}
}

impl Interceptor for HtmlEscapingInterceptor {
	fn positions(&self) -> &[InterceptorPosition] {
		&[
			InterceptorPosition::OpeningComponent,
			InterceptorPosition::ClosingComponent,
			InterceptorPosition::ObjectAccessor,
		]
	}

	fn open_component(&mut self, invocation: &Invocation) {
		self.open.push(!invocation.component.escapes_children());
	}

	fn process(&mut self, node: Node, position: InterceptorPosition) -> Node {
		match position {
			InterceptorPosition::ClosingComponent => {
				self.open.pop();
				let escapes_output = node
					.as_invocation()
					.is_some_and(|invocation| invocation.component.component().escape_output());
				if self.children_escaping_enabled() && escapes_output {
					Node::escaping(node)
				} else {
					node
				}
			}
			InterceptorPosition::ObjectAccessor if self.children_escaping_enabled() => {
				Node::escaping(node)
			}
			_ => node,
		}
	}
}
