//! # Reinhardt Stencil
//!
//! Component-oriented template engine for Reinhardt.
//!
//! Templates combine literal markup, inline expressions and namespaced component
//! tags. A parsed template can be interpreted directly or compiled once into a
//! re-entrant unit; both produce identical output.
//!
//! ## Feature Flags
//!
//! - `components` (default) - the `f:` control flow/formatting library and `h:` HTML tags
//! - `cache` (default) - in-memory compiled-unit cache with single-flight compilation
//! - `full` - all of the above
//!
//! ## Quick Example
//!
//! ```rust
//! use reinhardt_stencil::prelude::*;
//!
//! let engine = Engine::builder().with_default_components().build().unwrap();
//! let template = engine
//!     .parse(concat!(
//!         r#"<f:if condition="{user.admin}">"#,
//!         r#"<f:then><h:a href="/admin">Admin</h:a></f:then>"#,
//!         "<f:else>{user.name}</f:else>",
//!         "</f:if>",
//!     ))
//!     .unwrap();
//!
//! let mut context = engine.context();
//! context
//!     .assign("user", &serde_json::json!({"name": "<Ada>", "admin": false}))
//!     .unwrap();
//!
//! assert_eq!(template.render(&mut context).unwrap(), "&lt;Ada&gt;");
//! ```
//!
//! ## Writing a Component
//!
//! ```rust
//! use reinhardt_stencil::prelude::*;
//!
//! struct Shout;
//!
//! impl Component for Shout {
//!     fn register_arguments(
//!         &self,
//!         arguments: &mut ArgumentRegistrar,
//!     ) -> Result<(), ArgumentContractError> {
//!         arguments.register(ArgumentDefinition::new("text", "string", "Text to shout"))?;
//!         Ok(())
//!     }
//!
//!     fn render(
//!         &self,
//!         arguments: &Arguments,
//!         children: &Children<'_>,
//!         context: &mut RenderingContext,
//!     ) -> TemplateResult<Value> {
//!         let text = arguments.content_or_children("text", children, context)?;
//!         Ok(Value::String(text.to_output_string().to_uppercase()))
//!     }
//!
//!     fn content_argument_name(&self) -> Option<&str> {
//!         Some("text")
//!     }
//! }
//!
//! let engine = Engine::builder()
//!     .namespace("my", "my::components")
//!     .component_in("my::components", "shout", Shout)
//!     .build()
//!     .unwrap();
//!
//! let mut context = engine.context();
//! context.set("word", "hey");
//! assert_eq!(engine.render_source("{word -> my:shout()}", &mut context).unwrap(), "HEY");
//! ```

pub use reinhardt_stencil_core::*;

#[cfg(feature = "cache")]
pub mod cache;
#[cfg(feature = "components")]
pub mod components;

/// Re-exports for templates, components and the optional library crates
pub mod prelude {
	pub use reinhardt_stencil_core::prelude::*;

	pub use reinhardt_stencil_core::{
		ArgumentProcessing, EngineConfig, ParsedTemplate, ResolutionError, TemplateIdentity,
	};

	#[cfg(feature = "components")]
	pub use reinhardt_stencil_components::{DefaultComponents, TagBuilder};

	#[cfg(feature = "cache")]
	pub use reinhardt_stencil_cache::{InMemoryTemplateCache, identity_for};
}
