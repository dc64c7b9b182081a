//! Component library module.
//!
//! Control flow (`f:if`, `f:for`), variables, formatting and HTML tag
//! components.
//!
//! # Examples
//!
//! ```rust
//! use reinhardt_stencil::Engine;
//! use reinhardt_stencil::components::DefaultComponents;
//!
//! let engine = Engine::builder().with_default_components().build().unwrap();
//! assert_eq!(engine.resolver().targets("f"), vec!["reinhardt::stencil::components".to_string()]);
//! ```

#[cfg(feature = "components")]
pub use reinhardt_stencil_components::*;
