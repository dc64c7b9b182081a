//! # Reinhardt Stencil Components
//!
//! Control flow, variable, formatting and HTML tag components for stencil
//! templates.
//!
//! Components live in [`COMPONENTS_NAMESPACE`] under the alias `f`; element
//! components are produced on demand by [`HtmlTagDelegate`] in
//! [`HTML_NAMESPACE`] under the alias `h`. Templates may also declare them
//! through `xmlns:f="https://reinhardt.rs/ns/reinhardt/stencil/components"`.
//!
//! | call                        | component                          |
//! |-----------------------------|------------------------------------|
//! | `f:if`, `f:then`, `f:else`  | [`IfComponent`], [`ThenComponent`], [`ElseComponent`] |
//! | `f:for`                     | [`ForComponent`]                   |
//! | `f:alias`, `f:variable`     | [`AliasComponent`], [`VariableComponent`] |
//! | `f:format.raw`              | [`FormatRawComponent`]             |
//! | `f:format.htmlspecialchars` | [`FormatHtmlspecialcharsComponent`] |
//! | `f:format.json`             | [`FormatJsonComponent`]            |
//! | `f:count`                   | [`CountComponent`]                 |
//! | `f:comment`                 | [`CommentComponent`]               |
//! | `f:debug`                   | [`DebugComponent`]                 |
//! | `h:<element>`               | [`HtmlTagComponent`]               |
//!
//! ## Example
//!
//! ```
//! use reinhardt_stencil_components::DefaultComponents;
//! use reinhardt_stencil_core::Engine;
//!
//! let engine = Engine::builder().with_default_components().build().unwrap();
//! let template = engine
//!     .parse(r#"<f:for each="{tags}" as="tag"><h:li>{tag}</h:li></f:for>"#)
//!     .unwrap();
//!
//! let mut context = engine.context();
//! context.assign("tags", &["a", "<b>"]).unwrap();
//!
//! assert_eq!(
//!     template.render(&mut context).unwrap(),
//!     "<li>a</li><li>&lt;b&gt;</li>"
//! );
//! ```

mod condition;
mod format;
mod html;
mod iteration;
mod tag_builder;
mod utility;
mod variables;

pub use condition::{ElseComponent, IfComponent, ThenComponent};
pub use format::{
	FormatHtmlspecialcharsComponent, FormatJsonComponent, FormatRawComponent, html_special_chars,
};
pub use html::{HtmlTagComponent, HtmlTagDelegate};
pub use iteration::ForComponent;
pub use tag_builder::{TagBuilder, is_void_element};
pub use utility::{CommentComponent, CountComponent, DebugComponent};
pub use variables::{AliasComponent, VariableComponent};

use reinhardt_stencil_core::EngineBuilder;

/// Target of the `f` components
pub const COMPONENTS_NAMESPACE: &str = "reinhardt::stencil::components";

/// Target served by [`HtmlTagDelegate`]
pub const HTML_NAMESPACE: &str = "reinhardt::stencil::html";

pub const COMPONENTS_ALIAS: &str = "f";

pub const HTML_ALIAS: &str = "h";

/// Registers the component library on an [`EngineBuilder`]
pub trait DefaultComponents {
	/// Register every component, the HTML delegate and the `f`/`h` aliases
	fn with_default_components(self) -> Self;
}

impl DefaultComponents for EngineBuilder {
	fn with_default_components(self) -> Self {
		tracing::debug!(
			namespace = COMPONENTS_NAMESPACE,
			html_namespace = HTML_NAMESPACE,
			"registering default stencil components"
		);
		self.namespace(COMPONENTS_ALIAS, COMPONENTS_NAMESPACE)
			.namespace(HTML_ALIAS, HTML_NAMESPACE)
			.component_in(COMPONENTS_NAMESPACE, "if", IfComponent)
			.component_in(COMPONENTS_NAMESPACE, "then", ThenComponent)
			.component_in(COMPONENTS_NAMESPACE, "else", ElseComponent)
			.component_in(COMPONENTS_NAMESPACE, "for", ForComponent)
			.component_in(COMPONENTS_NAMESPACE, "alias", AliasComponent)
			.component_in(COMPONENTS_NAMESPACE, "variable", VariableComponent)
			.component_in(COMPONENTS_NAMESPACE, "format.raw", FormatRawComponent)
			.component_in(
				COMPONENTS_NAMESPACE,
				"format.htmlspecialchars",
				FormatHtmlspecialcharsComponent,
			)
			.component_in(COMPONENTS_NAMESPACE, "format.json", FormatJsonComponent)
			.component_in(COMPONENTS_NAMESPACE, "count", CountComponent)
			.component_in(COMPONENTS_NAMESPACE, "comment", CommentComponent)
			.component_in(COMPONENTS_NAMESPACE, "debug", DebugComponent)
			.delegate(HtmlTagDelegate::new())
	}
}
