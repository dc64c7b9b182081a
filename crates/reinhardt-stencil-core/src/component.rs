//! Component contract
//!
//! A component is a named template extension invoked either as a tag
//! (`<f:if condition="...">`) or inline (`{f:count(subject: items)}`). Each
//! component declares an argument contract once; the contract is cached per
//! component type by the resolver and enforced by the invoker on every call.
//!
//! Shared behavior is composed from helpers rather than inherited:
//! [`Children::render`] renders children and [`Arguments::content_or_children`]
//! handles content arguments.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::compiler::CompiledChild;
use crate::context::RenderingContext;
use crate::error::{ArgumentContractError, TemplateResult};
use crate::node::Node;
use crate::value::{Value, ValueMap};

static NULL: Value = Value::Null;

/// Argument type that disables type inspection entirely
pub const MIXED: &str = "mixed";

/// Declaration of a single component argument
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
	name: String,
	type_name: String,
	description: String,
	required: bool,
	default: Value,
	escape: bool,
}

impl ArgumentDefinition {
	/// Declare an optional argument whose default is `null`
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_core::{ArgumentDefinition, Value};
	///
	/// let definition = ArgumentDefinition::new("reverse", "boolean", "Iterate backwards")
	///     .with_default(false);
	/// assert!(!definition.is_required());
	/// assert_eq!(definition.default_value(), &Value::Bool(false));
	/// ```
	pub fn new(
		name: impl Into<String>,
		type_name: impl Into<String>,
		description: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			type_name: type_name.into(),
			description: description.into(),
			required: false,
			default: Value::Null,
			escape: false,
		}
	}

	/// Mark the argument as required
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn with_default(mut self, default: impl Into<Value>) -> Self {
		self.default = default.into();
		self
	}

	/// Escape the argument value when output escaping is active
	pub fn escaped(mut self) -> Self {
		self.escape = true;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	pub fn is_required(&self) -> bool {
		self.required
	}

	pub fn default_value(&self) -> &Value {
		&self.default
	}

	pub fn is_escaped(&self) -> bool {
		self.escape
	}

	/// Boolean arguments are parsed with the condition sub-language
	pub fn is_boolean(&self) -> bool {
		matches!(self.type_name.as_str(), "boolean" | "bool")
	}
}

/// Collects argument definitions while a component registers them
#[derive(Debug)]
pub struct ArgumentRegistrar {
	component: String,
	definitions: IndexMap<String, ArgumentDefinition>,
}

impl ArgumentRegistrar {
	pub(crate) fn new(component: impl Into<String>) -> Self {
		Self {
			component: component.into(),
			definitions: IndexMap::new(),
		}
	}

	/// Register one definition; registering the same name twice is an error
	pub fn register(
		&mut self,
		definition: ArgumentDefinition,
	) -> Result<&mut Self, ArgumentContractError> {
		if self.definitions.contains_key(definition.name()) {
			return Err(ArgumentContractError::DuplicateDefinition {
				component: self.component.clone(),
				argument: definition.name().to_string(),
			});
		}
		self.definitions
			.insert(definition.name().to_string(), definition);
		Ok(self)
	}

	pub(crate) fn into_contract(self) -> ArgumentContract {
		ArgumentContract {
			definitions: self.definitions,
		}
	}
}

/// The complete, immutable argument contract of a component type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentContract {
	definitions: IndexMap<String, ArgumentDefinition>,
}

impl ArgumentContract {
	pub fn get(&self, name: &str) -> Option<&ArgumentDefinition> {
		self.definitions.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.definitions.contains_key(name)
	}

	/// Definitions in registration order
	pub fn iter(&self) -> impl Iterator<Item = &ArgumentDefinition> {
		self.definitions.values()
	}

	pub fn names(&self) -> Vec<&str> {
		self.definitions.keys().map(String::as_str).collect()
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

/// Capability contract every component implements
pub trait Component: Send + Sync {
	/// Declare the argument contract; called once per component type
	fn register_arguments(
		&self,
		_arguments: &mut ArgumentRegistrar,
	) -> Result<(), ArgumentContractError> {
		Ok(())
	}

	/// Produce output from evaluated arguments, children and the rendering context
	fn render(
		&self,
		arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value>;

	/// Whether the component's own output is HTML-escaped
	fn escape_output(&self) -> bool {
		true
	}

	/// Whether accessors among the children are HTML-escaped
	///
	/// `None` follows [`Component::escape_output`]. Children of a component whose
	/// output is escaped are covered by that escaping and never escaped twice.
	fn escape_children(&self) -> Option<bool> {
		None
	}

	fn accepts_undeclared_arguments(&self) -> bool {
		false
	}

	/// Argument that receives piped values and falls back to the children
	fn content_argument_name(&self) -> Option<&str> {
		None
	}

	/// Whether invocations may be compiled into closures
	fn compilable(&self) -> bool {
		true
	}
}

/// A component together with its resolved type name and cached contract
pub struct ResolvedComponent {
	type_name: String,
	component: Arc<dyn Component>,
	contract: Arc<ArgumentContract>,
}

impl ResolvedComponent {
	pub(crate) fn new(
		type_name: impl Into<String>,
		component: Arc<dyn Component>,
		contract: Arc<ArgumentContract>,
	) -> Self {
		Self {
			type_name: type_name.into(),
			component,
			contract,
		}
	}

	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	pub fn component(&self) -> &dyn Component {
		self.component.as_ref()
	}

	pub fn contract(&self) -> &ArgumentContract {
		&self.contract
	}

	/// Whether accessors among the children are wrapped for escaping at parse time
	///
	/// False whenever the component escapes its own output, since that escaping
	/// already applies to everything the children render.
	pub fn escapes_children(&self) -> bool {
		let output = self.component.escape_output();
		!output && self.component.escape_children().unwrap_or(output)
	}
}

impl fmt::Debug for ResolvedComponent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolvedComponent")
			.field("type_name", &self.type_name)
			.field("arguments", &self.contract.names())
			.finish()
	}
}

/// Evaluated arguments handed to [`Component::render`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
	declared: ValueMap,
	undeclared: ValueMap,
}

impl Arguments {
	pub(crate) fn new(declared: ValueMap, undeclared: ValueMap) -> Self {
		Self {
			declared,
			undeclared,
		}
	}

	/// Value of a declared or undeclared argument
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.declared
			.get(name)
			.or_else(|| self.undeclared.get(name))
	}

	/// Value of an argument, `null` when absent
	pub fn value(&self, name: &str) -> &Value {
		self.get(name).unwrap_or(&NULL)
	}

	pub fn string(&self, name: &str) -> String {
		self.value(name).to_output_string()
	}

	pub fn bool(&self, name: &str) -> bool {
		self.value(name).is_truthy()
	}

	/// Arguments declared in the contract, defaults applied
	pub fn declared(&self) -> &ValueMap {
		&self.declared
	}

	/// Arguments accepted without a declaration
	pub fn undeclared(&self) -> &ValueMap {
		&self.undeclared
	}

	/// The named argument if it is non-null, the rendered children otherwise
	pub fn content_or_children(
		&self,
		name: &str,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		match self.get(name) {
			Some(value) if !value.is_null() => Ok(value.clone()),
			_ => children.render(context),
		}
	}
}

/// Child nodes of an invocation, in tree-walk or compiled form
#[derive(Debug, Clone, Copy)]
pub enum Children<'a> {
	Empty,
	Nodes(&'a [Node]),
	Compiled(&'a [CompiledChild]),
}

impl<'a> Children<'a> {
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Empty => true,
			Self::Nodes(nodes) => nodes.is_empty(),
			Self::Compiled(children) => children.is_empty(),
		}
	}

	/// Evaluate every child; a single child keeps its raw value, several are concatenated
	pub fn render(&self, context: &mut RenderingContext) -> TemplateResult<Value> {
		match self {
			Self::Empty => Ok(Value::Null),
			Self::Nodes(nodes) => crate::node::evaluate_sequence(nodes, context),
			Self::Compiled(children) => crate::compiler::execute_children(children, context),
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = ChildRef<'a>> + 'a {
		let (nodes, compiled): (&'a [Node], &'a [CompiledChild]) = match *self {
			Self::Empty => (&[], &[]),
			Self::Nodes(nodes) => (nodes, &[]),
			Self::Compiled(children) => (&[], children),
		};
		nodes
			.iter()
			.map(ChildRef::Node)
			.chain(compiled.iter().map(ChildRef::Compiled))
	}
}

/// One child of an invocation
#[derive(Debug, Clone, Copy)]
pub enum ChildRef<'a> {
	Node(&'a Node),
	Compiled(&'a CompiledChild),
}

impl<'a> ChildRef<'a> {
	/// Resolved type name when the child is a component invocation
	pub fn component_type(&self) -> Option<&'a str> {
		match *self {
			Self::Node(node) => node
				.as_invocation()
				.map(|invocation| invocation.component.type_name()),
			Self::Compiled(child) => child.component_type(),
		}
	}

	pub fn is_component(&self, type_name: &str) -> bool {
		self.component_type() == Some(type_name)
	}

	pub fn render(&self, context: &mut RenderingContext) -> TemplateResult<Value> {
		match *self {
			Self::Node(node) => node.evaluate(context),
			Self::Compiled(child) => child.execute(context),
		}
	}

	/// Evaluate one supplied argument of a child invocation
	pub fn argument(
		&self,
		name: &str,
		context: &mut RenderingContext,
	) -> TemplateResult<Option<Value>> {
		match *self {
			Self::Node(node) => node
				.as_invocation()
				.and_then(|invocation| invocation.arguments.get(name))
				.map(|argument| argument.evaluate(context))
				.transpose(),
			Self::Compiled(child) => child.argument(name, context),
		}
	}
}
