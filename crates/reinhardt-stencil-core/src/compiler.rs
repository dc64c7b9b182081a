//! Compilation of parsed templates into closure trees
//!
//! A [`CompiledUnit`] is built once from a parsed tree and can be rendered any
//! number of times, from any thread. Text and literals become constants, constant
//! subtrees are folded, and everything else becomes a closure. Invocations of
//! components that decline compilation keep their parsed subtree and are
//! interpreted; rendering output is identical either way.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::boolean::{self, BooleanNode, OperandSource};
use crate::component::{Children, ResolvedComponent};
use crate::context::RenderingContext;
use crate::error::TemplateResult;
use crate::escaping::escape_value;
use crate::invoker::spread_into;
use crate::node::{DynamicArgument, Invocation, Node, assemble};
use crate::value::{Value, ValueMap};

/// Closure produced for a dynamic node
pub type RenderFn = Arc<dyn Fn(&mut RenderingContext) -> TemplateResult<Value> + Send + Sync>;

/// Compiled form of a single node
#[derive(Clone)]
pub enum Executable {
	Constant(Value),
	Dynamic(RenderFn),
}

impl Executable {
	pub fn execute(&self, context: &mut RenderingContext) -> TemplateResult<Value> {
		match self {
			Self::Constant(value) => Ok(value.clone()),
			Self::Dynamic(render) => render(context),
		}
	}

	pub fn as_constant(&self) -> Option<&Value> {
		match self {
			Self::Constant(value) => Some(value),
			Self::Dynamic(_) => None,
		}
	}

	fn dynamic(
		render: impl Fn(&mut RenderingContext) -> TemplateResult<Value> + Send + Sync + 'static,
	) -> Self {
		Self::Dynamic(Arc::new(render))
	}
}

impl fmt::Debug for Executable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
			Self::Dynamic(_) => f.write_str("Dynamic(..)"),
		}
	}
}

/// Child of a compiled invocation
///
/// Keeps the arguments of a child invocation reachable so that parents such as
/// conditionals can inspect them before deciding what to render.
#[derive(Debug, Clone)]
pub struct CompiledChild {
	executable: Executable,
	component_type: Option<String>,
	arguments: IndexMap<String, Executable>,
}

impl CompiledChild {
	pub fn component_type(&self) -> Option<&str> {
		self.component_type.as_deref()
	}

	pub fn execute(&self, context: &mut RenderingContext) -> TemplateResult<Value> {
		self.executable.execute(context)
	}

	/// Evaluate one supplied argument of the child invocation
	pub fn argument(
		&self,
		name: &str,
		context: &mut RenderingContext,
	) -> TemplateResult<Option<Value>> {
		self.arguments
			.get(name)
			.map(|argument| argument.execute(context))
			.transpose()
	}
}

/// Render children with sequence semantics
pub(crate) fn execute_children(
	children: &[CompiledChild],
	context: &mut RenderingContext,
) -> TemplateResult<Value> {
	match children {
		[] => Ok(Value::Null),
		[single] => single.execute(context),
		_ => {
			let mut output = String::new();
			for child in children {
				output.push_str(&child.execute(context)?.to_output_string());
			}
			Ok(Value::String(output))
		}
	}
}

enum CompiledDynamicArgument {
	Named { name: Executable, value: Executable },
	Spread(Executable),
}

struct CompiledInvocation {
	component: Arc<ResolvedComponent>,
	arguments: IndexMap<String, Executable>,
	dynamic_arguments: Vec<CompiledDynamicArgument>,
	children: Vec<CompiledChild>,
}

impl CompiledInvocation {
	fn execute(&self, context: &mut RenderingContext) -> TemplateResult<Value> {
		let mut supplied = ValueMap::with_capacity(self.arguments.len());
		for dynamic in &self.dynamic_arguments {
			match dynamic {
				CompiledDynamicArgument::Named { name, value } => {
					let name = name.execute(context)?.to_output_string();
					let value = value.execute(context)?;
					supplied.insert(name, value);
				}
				CompiledDynamicArgument::Spread(map) => {
					spread_into(&mut supplied, map.execute(context)?);
				}
			}
		}
		for (name, argument) in &self.arguments {
			let value = argument.execute(context)?;
			supplied.insert(name.clone(), value);
		}

		let invoker = Arc::clone(context.invoker());
		invoker.call(
			&self.component,
			supplied,
			Children::Compiled(&self.children),
			context,
		)
	}
}

struct ExecutableOperands<'a> {
	operands: &'a [Executable],
	context: &'a mut RenderingContext,
}

impl OperandSource for ExecutableOperands<'_> {
	fn operand(&mut self, index: usize) -> TemplateResult<Value> {
		match self.operands.get(index) {
			Some(operand) => operand.execute(self.context),
			None => Ok(Value::Null),
		}
	}
}

/// Counters collected while compiling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilationStats {
	pub compiled_nodes: usize,
	/// Invocations left to tree-walk evaluation
	pub fallback_nodes: usize,
}

#[derive(Default)]
struct Compiler {
	stats: CompilationStats,
}

impl Compiler {
	fn node(&mut self, node: &Node) -> Executable {
		self.stats.compiled_nodes += 1;
		match node {
			Node::Root(children) => self.sequence(children),
			Node::Text(text) => Executable::Constant(Value::String(text.clone())),
			Node::Literal(value) => Executable::Constant(value.clone()),
			Node::ObjectAccessor(accessor) => {
				let accessor = accessor.clone();
				Executable::dynamic(move |context| Ok(accessor.resolve(context.variables())))
			}
			Node::Array(array) => {
				let entries: Vec<(Option<String>, Executable)> = array
					.entries()
					.iter()
					.map(|entry| (entry.key.clone(), self.node(&entry.value)))
					.collect();
				if entries.iter().all(|(_, value)| value.as_constant().is_some()) {
					return Executable::Constant(assemble(entries.iter().filter_map(
						|(key, value)| value.as_constant().map(|v| (key.as_deref(), v.clone())),
					)));
				}
				Executable::dynamic(move |context| {
					let mut values = Vec::with_capacity(entries.len());
					for (key, value) in &entries {
						values.push((key.as_deref(), value.execute(context)?));
					}
					Ok(assemble(values))
				})
			}
			Node::Boolean(condition) => self.boolean(condition),
			Node::Escaping(inner) if matches!(**inner, Node::Escaping(_)) => self.node(inner),
			Node::Escaping(inner) => escaped(self.node(inner)),
			Node::Invocation(invocation) => self.invocation(node, invocation, false).0,
		}
	}

	fn sequence(&mut self, nodes: &[Node]) -> Executable {
		let mut parts: Vec<Executable> = nodes.iter().map(|node| self.node(node)).collect();
		match parts.len() {
			0 => return Executable::Constant(Value::Null),
			1 => return parts.remove(0),
			_ => {}
		}

		if parts.iter().all(|part| part.as_constant().is_some()) {
			let folded: String = parts
				.iter()
				.filter_map(Executable::as_constant)
				.map(Value::to_output_string)
				.collect();
			return Executable::Constant(Value::String(folded));
		}
		Executable::dynamic(move |context| {
			let mut output = String::new();
			for part in &parts {
				output.push_str(&part.execute(context)?.to_output_string());
			}
			Ok(Value::String(output))
		})
	}

	fn boolean(&mut self, condition: &BooleanNode) -> Executable {
		match condition {
			BooleanNode::Truthiness(inner) => match self.node(inner) {
				Executable::Constant(value) => Executable::Constant(Value::Bool(value.is_truthy())),
				Executable::Dynamic(render) => Executable::dynamic(move |context| {
					Ok(Value::Bool(render(context)?.is_truthy()))
				}),
			},
			BooleanNode::Expression {
				expression,
				operands,
			} => {
				let compiled = boolean::compile(expression);
				let operands: Vec<Executable> =
					operands.iter().map(|operand| self.node(operand)).collect();
				Executable::dynamic(move |context| {
					let mut source = ExecutableOperands {
						operands: &operands,
						context,
					};
					Ok(Value::Bool(compiled(&mut source)?.is_truthy()))
				})
			}
		}
	}

	/// Compile an invocation together with its supplied arguments
	///
	/// The argument executables are shared between the invocation closure and the
	/// returned map. A fallback invocation only compiles its arguments when
	/// `inspectable` asks for them.
	fn invocation(
		&mut self,
		node: &Node,
		invocation: &Invocation,
		inspectable: bool,
	) -> (Executable, IndexMap<String, Executable>) {
		if !invocation.component.component().compilable() {
			self.stats.fallback_nodes += 1;
			tracing::debug!(
				component = invocation.component.type_name(),
				location = %invocation.location,
				"component declines compilation, falling back to tree-walk evaluation"
			);
			let arguments = if inspectable {
				self.arguments(invocation)
			} else {
				IndexMap::new()
			};
			let node = Arc::new(node.clone());
			return (Executable::dynamic(move |context| node.evaluate(context)), arguments);
		}

		let arguments = self.arguments(invocation);
		let compiled = CompiledInvocation {
			component: Arc::clone(&invocation.component),
			arguments: arguments.clone(),
			dynamic_arguments: invocation
				.dynamic_arguments
				.iter()
				.map(|dynamic| match dynamic {
					DynamicArgument::Named { name, value } => CompiledDynamicArgument::Named {
						name: self.node(name),
						value: self.node(value),
					},
					DynamicArgument::Spread(map) => CompiledDynamicArgument::Spread(self.node(map)),
				})
				.collect(),
			children: invocation
				.children
				.iter()
				.map(|child| self.child(child))
				.collect(),
		};
		(
			Executable::dynamic(move |context| compiled.execute(context)),
			arguments,
		)
	}

	fn arguments(&mut self, invocation: &Invocation) -> IndexMap<String, Executable> {
		invocation
			.arguments
			.iter()
			.map(|(name, argument)| (name.clone(), self.node(argument)))
			.collect()
	}

	fn child(&mut self, node: &Node) -> CompiledChild {
		let (executable, arguments) = match node {
			Node::Invocation(invocation) => {
				self.stats.compiled_nodes += 1;
				self.invocation(node, invocation, true)
			}
			Node::Escaping(inner) => match inner.as_ref() {
				Node::Invocation(invocation) => {
					self.stats.compiled_nodes += 2;
					let (executable, arguments) = self.invocation(inner, invocation, true);
					(escaped(executable), arguments)
				}
				_ => (self.node(node), IndexMap::new()),
			},
			_ => (self.node(node), IndexMap::new()),
		};
		CompiledChild {
			executable,
			component_type: node
				.as_invocation()
				.map(|invocation| invocation.component.type_name().to_string()),
			arguments,
		}
	}
}

fn escaped(executable: Executable) -> Executable {
	match executable {
		Executable::Constant(value) => Executable::Constant(escape_value(value)),
		Executable::Dynamic(render) => {
			Executable::dynamic(move |context| render(context).map(escape_value))
		}
	}
}

/// Re-entrant compiled form of a template
#[derive(Debug, Clone)]
pub struct CompiledUnit {
	name: Option<String>,
	root: Executable,
	stats: CompilationStats,
}

impl CompiledUnit {
	/// Compile a parsed tree
	pub fn compile(name: Option<&str>, root: &Node) -> Self {
		let mut compiler = Compiler::default();
		let root = compiler.node(root);
		tracing::debug!(
			template = name.unwrap_or("<inline>"),
			compiled_nodes = compiler.stats.compiled_nodes,
			fallback_nodes = compiler.stats.fallback_nodes,
			"compiled template"
		);
		Self {
			name: name.map(str::to_string),
			root,
			stats: compiler.stats,
		}
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn stats(&self) -> CompilationStats {
		self.stats
	}

	pub fn render(&self, context: &mut RenderingContext) -> TemplateResult<String> {
		Ok(self.root.execute(context)?.to_output_string())
	}
}
