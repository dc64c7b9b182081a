//! Engine entry point
//!
//! An [`Engine`] owns the shared, read-mostly state of the template system:
//! configuration, resolver (namespaces, components, delegates, contract cache),
//! invoker and interceptor factories. Parsing produces a [`ParsedTemplate`]
//! that can be rendered directly or compiled into a [`CompiledUnit`].
//!
//! ## Example
//!
//! ```
//! use reinhardt_stencil_core::Engine;
//!
//! let engine = Engine::new();
//! let template = engine.parse("Hello {name}!").unwrap();
//!
//! let mut context = engine.context();
//! context.set("name", "<Ada>");
//! assert_eq!(template.render(&mut context).unwrap(), "Hello &lt;Ada&gt;!");
//! ```

use std::sync::Arc;

use crate::cache::{CompiledUnitStore, TemplateIdentity};
use crate::compiler::CompiledUnit;
use crate::component::Component;
use crate::config::{ArgumentProcessing, ConfigError, EngineConfig};
use crate::context::RenderingContext;
use crate::error::TemplateResult;
use crate::escaping::{HtmlEscapingInterceptor, InterceptorFactory};
use crate::invoker::Invoker;
use crate::node::Node;
use crate::processor::ArgumentProcessor;
use crate::resolver::{ContractCache, Resolver, ResolverDelegate, conventional_type_name};
use crate::sequencer;
use crate::source::Source;

/// Parses, compiles and renders templates
#[derive(Clone)]
pub struct Engine {
	config: EngineConfig,
	resolver: Arc<Resolver>,
	invoker: Arc<Invoker>,
	interceptors: Vec<InterceptorFactory>,
}

impl Default for Engine {
	fn default() -> Self {
		Self::new()
	}
}

impl Engine {
	/// Engine with the default configuration and no registered namespaces
	pub fn new() -> Self {
		let config = EngineConfig::default();
		Self {
			resolver: Arc::new(Resolver::from_config(&config, Arc::new(ContractCache::new()))),
			invoker: Arc::new(Invoker::with_policy(config.argument_processing)),
			interceptors: vec![HtmlEscapingInterceptor::factory()],
			config,
		}
	}

	pub fn builder() -> EngineBuilder {
		EngineBuilder::new()
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	pub fn resolver(&self) -> &Arc<Resolver> {
		&self.resolver
	}

	pub fn invoker(&self) -> &Arc<Invoker> {
		&self.invoker
	}

	/// Fresh rendering context bound to this engine
	pub fn context(&self) -> RenderingContext {
		RenderingContext::new(Arc::clone(&self.resolver), Arc::clone(&self.invoker))
	}

	pub fn parse(&self, text: &str) -> TemplateResult<ParsedTemplate> {
		self.parse_source(Source::new(text))
	}

	/// Parse with a name that appears in diagnostics and logs
	pub fn parse_named(&self, name: &str, text: &str) -> TemplateResult<ParsedTemplate> {
		self.parse_source(Source::new(text).with_name(name))
	}

	pub fn parse_source(&self, source: Source) -> TemplateResult<ParsedTemplate> {
		let name = source.name().map(str::to_string);
		let source = source.with_excerpt_width(self.config.excerpt_width);
		let interceptors = self.interceptors.iter().map(|factory| factory()).collect();
		let root = sequencer::sequence(
			source,
			&self.resolver,
			self.config.escaping,
			&self.config.namespace_uri_prefix,
			interceptors,
		)?;
		Ok(ParsedTemplate { name, root })
	}

	pub fn compile(&self, template: &ParsedTemplate) -> CompiledUnit {
		CompiledUnit::compile(template.name(), &template.root)
	}

	/// Parse and interpret `text` in one step
	pub fn render_source(&self, text: &str, context: &mut RenderingContext) -> TemplateResult<String> {
		self.parse(text)?.render(context)
	}

	/// Render through a compiled-unit store, compiling and storing on a miss
	pub fn render_cached(
		&self,
		store: &dyn CompiledUnitStore,
		identity: &TemplateIdentity,
		text: &str,
		context: &mut RenderingContext,
	) -> TemplateResult<String> {
		if let Some(unit) = store.get(identity) {
			tracing::debug!(identity = %identity, "compiled unit cache hit");
			return unit.render(context);
		}

		tracing::debug!(identity = %identity, "compiled unit cache miss");
		let parsed = self.parse_source(Source::new(text).with_name(identity.as_str()))?;
		let unit = Arc::new(self.compile(&parsed));
		store.put(identity, Arc::clone(&unit));
		unit.render(context)
	}
}

impl std::fmt::Debug for Engine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Engine")
			.field("config", &self.config)
			.field("interceptors", &self.interceptors.len())
			.finish_non_exhaustive()
	}
}

/// A parsed template, renderable any number of times
#[derive(Debug, Clone)]
pub struct ParsedTemplate {
	name: Option<String>,
	root: Node,
}

impl ParsedTemplate {
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn root(&self) -> &Node {
		&self.root
	}

	/// Interpret the tree against `context`
	pub fn render(&self, context: &mut RenderingContext) -> TemplateResult<String> {
		self.root.render(context)
	}
}

enum Registration {
	TypeName(String),
	Conventional { target: String, call_name: String },
}

/// Assembles an [`Engine`]
///
/// # Examples
///
/// ```
/// use reinhardt_stencil_core::{ArgumentProcessing, Engine};
///
/// let engine = Engine::builder()
///     .namespace("app", "app::components")
///     .argument_processing(ArgumentProcessing::Strict)
///     .build()
///     .unwrap();
/// assert_eq!(engine.resolver().targets("app"), vec!["app::components".to_string()]);
/// ```
pub struct EngineBuilder {
	config: EngineConfig,
	components: Vec<(Registration, Arc<dyn Component>)>,
	delegates: Vec<Arc<dyn ResolverDelegate>>,
	interceptors: Vec<InterceptorFactory>,
	processor: Option<Arc<dyn ArgumentProcessor>>,
	contracts: Option<Arc<ContractCache>>,
}

impl Default for EngineBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl EngineBuilder {
	pub fn new() -> Self {
		Self {
			config: EngineConfig::default(),
			components: Vec::new(),
			delegates: Vec::new(),
			interceptors: Vec::new(),
			processor: None,
			contracts: None,
		}
	}

	/// Replace the configuration; namespaces added so far are discarded
	pub fn config(mut self, config: EngineConfig) -> Self {
		self.config = config;
		self
	}

	pub fn namespace(mut self, alias: &str, target: &str) -> Self {
		self.config
			.namespaces
			.entry(alias.to_string())
			.or_default()
			.push(target.to_string());
		self
	}

	pub fn ignore_namespace(mut self, pattern: &str) -> Self {
		self.config.ignored_namespaces.push(pattern.to_string());
		self
	}

	pub fn escaping(mut self, enabled: bool) -> Self {
		self.config.escaping = enabled;
		self
	}

	/// Register a component under a fully qualified type name
	pub fn component(mut self, type_name: &str, component: impl Component + 'static) -> Self {
		self.components
			.push((Registration::TypeName(type_name.to_string()), Arc::new(component)));
		self
	}

	/// Register a component under the conventional type name of `call_name` in `target`
	pub fn component_in(
		mut self,
		target: &str,
		call_name: &str,
		component: impl Component + 'static,
	) -> Self {
		self.components.push((
			Registration::Conventional {
				target: target.to_string(),
				call_name: call_name.to_string(),
			},
			Arc::new(component),
		));
		self
	}

	pub fn delegate(self, delegate: impl ResolverDelegate + 'static) -> Self {
		self.shared_delegate(Arc::new(delegate))
	}

	pub fn shared_delegate(mut self, delegate: Arc<dyn ResolverDelegate>) -> Self {
		self.delegates.push(delegate);
		self
	}

	/// Add an interceptor; it runs after the escaping interceptor
	pub fn interceptor(mut self, factory: InterceptorFactory) -> Self {
		self.interceptors.push(factory);
		self
	}

	pub fn argument_processing(mut self, policy: ArgumentProcessing) -> Self {
		self.config.argument_processing = policy;
		self.processor = None;
		self
	}

	/// Use a custom processor instead of the configured policy
	pub fn argument_processor(mut self, processor: Arc<dyn ArgumentProcessor>) -> Self {
		self.processor = Some(processor);
		self
	}

	/// Share a contract cache between engines
	pub fn contract_cache(mut self, contracts: Arc<ContractCache>) -> Self {
		self.contracts = Some(contracts);
		self
	}

	pub fn build(self) -> Result<Engine, ConfigError> {
		self.config.validate()?;

		let contracts = self
			.contracts
			.unwrap_or_else(|| Arc::new(ContractCache::new()));
		let resolver = Resolver::from_config(&self.config, contracts);
		for (registration, component) in self.components {
			let type_name = match registration {
				Registration::TypeName(type_name) => type_name,
				Registration::Conventional { target, call_name } => {
					conventional_type_name(&target, &call_name, resolver.suffix())
				}
			};
			resolver.registry().register(type_name, component);
		}
		for delegate in self.delegates {
			resolver.register_shared_delegate(delegate);
		}

		let invoker = match self.processor {
			Some(processor) => Invoker::new(processor),
			None => Invoker::with_policy(self.config.argument_processing),
		};
		let mut interceptors = Vec::with_capacity(self.interceptors.len() + 1);
		if self.config.escaping {
			interceptors.push(HtmlEscapingInterceptor::factory());
		}
		interceptors.extend(self.interceptors);

		tracing::debug!(
			namespaces = self.config.namespaces.len(),
			components = resolver.registry().type_names().len(),
			interceptors = interceptors.len(),
			"built template engine"
		);
		Ok(Engine {
			config: self.config,
			resolver: Arc::new(resolver),
			invoker: Arc::new(invoker),
			interceptors,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::{Arguments, Children};
	use crate::error::TemplateError;
	use crate::escaping::{Interceptor, InterceptorPosition};
	use crate::value::Value;
	use parking_lot::Mutex;
	use rstest::{fixture, rstest};
	use std::collections::HashMap;

	struct Shout;

	impl Component for Shout {
		fn render(
			&self,
			_arguments: &Arguments,
			children: &Children<'_>,
			context: &mut RenderingContext,
		) -> TemplateResult<Value> {
			Ok(Value::String(
				children.render(context)?.to_output_string().to_uppercase(),
			))
		}

		fn escape_output(&self) -> bool {
			false
		}

		fn escape_children(&self) -> Option<bool> {
			Some(true)
		}
	}

	#[derive(Default)]
	struct MapStore {
		units: Mutex<HashMap<String, Arc<CompiledUnit>>>,
	}

	impl CompiledUnitStore for MapStore {
		fn get(&self, identity: &TemplateIdentity) -> Option<Arc<CompiledUnit>> {
			self.units.lock().get(identity.as_str()).cloned()
		}

		fn put(&self, identity: &TemplateIdentity, unit: Arc<CompiledUnit>) {
			self.units.lock().insert(identity.as_str().to_string(), unit);
		}
	}

	#[fixture]
	fn engine() -> Engine {
		Engine::builder()
			.namespace("app", "app")
			.component_in("app", "shout", Shout)
			.build()
			.unwrap()
	}

	#[rstest]
	fn test_parse_and_render(engine: Engine) {
		// Arrange
		let template = engine.parse("<app:shout>hi {who}</app:shout>").unwrap();
		let mut context = engine.context();
		context.set("who", "<you>");

		// Act
		let output = template.render(&mut context).unwrap();

		// Assert
		assert_eq!(output, "HI &LT;YOU&GT;");
	}

	#[rstest]
	fn test_escaping_can_be_disabled() {
		let engine = Engine::builder().escaping(false).build().unwrap();
		let mut context = engine.context();
		context.set("x", "<b>");

		let output = engine.render_source("{x}", &mut context).unwrap();

		assert_eq!(output, "<b>");
	}

	#[rstest]
	fn test_named_parse_errors_mention_the_template(engine: Engine) {
		let error = engine.parse_named("page.html", "<app:shout>").unwrap_err();

		assert!(matches!(error, TemplateError::Sequencing(_)));
		assert!(error.to_string().contains("page.html"));
	}

	#[rstest]
	fn test_render_cached_compiles_once(engine: Engine) {
		// Arrange
		let store = MapStore::default();
		let identity = TemplateIdentity::new("greeting");
		let mut context = engine.context();
		context.set("who", "ada");

		// Act
		let first = engine
			.render_cached(&store, &identity, "<app:shout>{who}</app:shout>", &mut context)
			.unwrap();
		let second = engine
			.render_cached(&store, &identity, "ignored on a hit", &mut context)
			.unwrap();

		// Assert
		assert_eq!(first, "ADA");
		assert_eq!(second, "ADA");
		assert_eq!(store.units.lock().len(), 1);
	}

	#[rstest]
	fn test_build_rejects_invalid_configuration() {
		let result = Engine::builder().namespace("1bad", "x").build();

		assert!(matches!(result, Err(ConfigError::Invalid(_))));
	}

	#[rstest]
	fn test_custom_interceptors_run_after_escaping() {
		// Arrange
		struct Upper;
		impl Interceptor for Upper {
			fn positions(&self) -> &[InterceptorPosition] {
				&[InterceptorPosition::Text]
			}

			fn process(&mut self, node: Node, _position: InterceptorPosition) -> Node {
				match node {
					Node::Text(text) => Node::Text(text.to_uppercase()),
					other => other,
				}
			}
		}
		let engine = Engine::builder()
			.interceptor(Arc::new(|| Box::new(Upper)))
			.build()
			.unwrap();

		// Act
		let output = engine.render_source("abc", &mut engine.context()).unwrap();

		// Assert
		assert_eq!(output, "ABC");
	}
}
