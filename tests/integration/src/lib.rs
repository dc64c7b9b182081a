//! Integration test utilities for Reinhardt Stencil
//!
//! Shared fixture components, engine construction and the golden-case runner
//! used by the conformance suite.

pub mod fixtures;
pub mod golden;

use reinhardt_stencil::{Engine, RenderingContext, TemplateResult};

/// Rendering context of `engine` holding the entries of a JSON object
pub fn context_with(engine: &Engine, variables: &serde_json::Value) -> TemplateResult<RenderingContext> {
	let mut context = engine.context();
	if let serde_json::Value::Object(entries) = variables {
		for (name, value) in entries {
			context.assign(name.clone(), value)?;
		}
	}
	Ok(context)
}

/// Output of both evaluation paths for one template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BothPaths {
	pub interpreted: String,
	pub compiled: String,
}

/// Parse `template` once, then render it interpreted and compiled in fresh contexts
pub fn render_both(
	engine: &Engine,
	template: &str,
	variables: &serde_json::Value,
) -> TemplateResult<BothPaths> {
	let parsed = engine.parse(template)?;
	let interpreted = parsed.render(&mut context_with(engine, variables)?)?;
	let compiled = engine
		.compile(&parsed)
		.render(&mut context_with(engine, variables)?)?;
	Ok(BothPaths {
		interpreted,
		compiled,
	})
}
