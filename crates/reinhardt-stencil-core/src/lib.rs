//! # Reinhardt Stencil Core
//!
//! Component-oriented template engine. Templates mix literal markup with
//! inline expressions and namespaced component tags:
//!
//! ```text
//! {namespace app=app::components}
//! <h1>{page.title}</h1>
//! <app:card title="{user.name}" highlighted="{user.admin} && !{user.banned}">
//!     {user.bio | app:format.excerpt(length: 80)}
//! </app:card>
//! ```
//!
//! ## Pipeline
//!
//! 1. the scanner splits the source into text, expression, tag and CDATA captures
//! 2. the sequencer builds a [`Node`] tree, resolving every component through the
//!    [`Resolver`] and running parse-time escaping interceptors
//! 3. the tree is either interpreted directly or compiled into a [`CompiledUnit`]
//! 4. the [`Invoker`] checks arguments against each component's contract and
//!    calls it with its children and the [`RenderingContext`]
//!
//! ## Example
//!
//! ```
//! use reinhardt_stencil_core::{Engine, Value};
//!
//! let engine = Engine::new();
//! let template = engine.parse("{greeting}, {users.0.name}!").unwrap();
//!
//! let mut context = engine.context();
//! context.set("greeting", "Hello");
//! context
//!     .assign("users", &serde_json::json!([{"name": "Ada"}]))
//!     .unwrap();
//!
//! assert_eq!(template.render(&mut context).unwrap(), "Hello, Ada!");
//! assert_eq!(engine.compile(&template).render(&mut context).unwrap(), "Hello, Ada!");
//! ```

pub mod boolean;
pub mod cache;
pub mod compiler;
pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod escaping;
pub mod invoker;
pub mod node;
pub mod processor;
pub mod resolver;
mod scanner;
mod sequencer;
pub mod source;
mod suggest;
pub mod template;
pub mod value;

pub use cache::{CompiledUnitStore, TemplateIdentity};
pub use compiler::{CompilationStats, CompiledChild, CompiledUnit, Executable};
pub use component::{
	ArgumentContract, ArgumentDefinition, ArgumentRegistrar, Arguments, ChildRef, Children,
	Component, MIXED, ResolvedComponent,
};
pub use config::{
	ArgumentProcessing, ConfigError, DEFAULT_COMPONENT_SUFFIX, DEFAULT_NAMESPACE_URI_PREFIX,
	EngineConfig,
};
pub use context::{RenderingContext, VariableScopes, scope};
pub use error::{
	ArgumentContractError, ResolutionError, SequencingError, SourceLocation, TemplateError,
	TemplateResult,
};
pub use escaping::{
	HtmlEscapingInterceptor, Interceptor, InterceptorFactory, InterceptorPosition, escape_html,
	escape_value,
};
pub use invoker::Invoker;
pub use node::{
	ALL_VARIABLES, ArrayEntry, ArrayNode, BooleanNode, DynamicArgument, Invocation, Node,
	ObjectAccessor, PathSegment,
};
pub use processor::{
	ArgumentProcessor, LenientArgumentProcessor, StrictArgumentProcessor, processor_for,
};
pub use resolver::{
	ComponentRegistry, ComponentType, ContractCache, Resolver, ResolverDelegate,
	conventional_type_name,
};
pub use source::Source;
pub use suggest::suggest_similar;
pub use template::{Engine, EngineBuilder, ParsedTemplate};
pub use value::{Value, ValueMap};

/// Types needed to write and register components
pub mod prelude {
	pub use crate::component::{
		ArgumentDefinition, ArgumentRegistrar, Arguments, ChildRef, Children, Component,
	};
	pub use crate::context::RenderingContext;
	pub use crate::error::{ArgumentContractError, TemplateError, TemplateResult};
	pub use crate::resolver::{ComponentType, ResolverDelegate};
	pub use crate::template::{Engine, EngineBuilder};
	pub use crate::value::{Value, ValueMap};
}
