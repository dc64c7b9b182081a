//! Component invocation nodes

use std::sync::Arc;

use indexmap::IndexMap;

use crate::component::ResolvedComponent;
use crate::context::RenderingContext;
use crate::error::{SourceLocation, TemplateResult};
use crate::value::Value;

use super::Node;

/// Argument whose name is only known at render time
#[derive(Debug, Clone)]
pub enum DynamicArgument {
	/// `{nameAccessor}="value"`
	Named { name: Node, value: Node },
	/// `{map}` spreads every entry of a map
	Spread(Node),
}

/// A call to a resolved component
#[derive(Debug, Clone)]
pub struct Invocation {
	/// Namespace alias as written, e.g. `f`
	pub alias: String,
	/// Dotted call name as written, e.g. `format.raw`
	pub name: String,
	pub component: Arc<ResolvedComponent>,
	/// Statically named arguments, unevaluated
	pub arguments: IndexMap<String, Node>,
	pub dynamic_arguments: Vec<DynamicArgument>,
	pub children: Vec<Node>,
	pub location: SourceLocation,
}

impl Invocation {
	pub fn new(
		alias: impl Into<String>,
		name: impl Into<String>,
		component: Arc<ResolvedComponent>,
		location: SourceLocation,
	) -> Self {
		Self {
			alias: alias.into(),
			name: name.into(),
			component,
			arguments: IndexMap::new(),
			dynamic_arguments: Vec::new(),
			children: Vec::new(),
			location,
		}
	}

	/// `alias:name` as written in the template
	pub fn call_name(&self) -> String {
		format!("{}:{}", self.alias, self.name)
	}

	pub fn evaluate(&self, context: &mut RenderingContext) -> TemplateResult<Value> {
		let invoker = Arc::clone(context.invoker());
		invoker.invoke(self, context)
	}
}
