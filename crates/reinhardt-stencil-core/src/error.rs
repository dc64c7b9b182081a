//! Error types for the stencil template engine
//!
//! Errors fall into three families that map onto the stages of the pipeline:
//!
//! - [`SequencingError`]: malformed template syntax, always positioned
//! - [`ResolutionError`]: a namespace alias or component name that cannot be resolved
//! - [`ArgumentContractError`]: an invocation that violates a component's argument contract
//!
//! All of them are aggregated into [`TemplateError`], which is what `parse` and
//! `render` return.

use std::fmt;

use crate::config::ConfigError;

/// Position of a construct inside a template source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
	/// Byte offset from the start of the template
	pub offset: usize,
	/// 1-based line number
	pub line: usize,
	/// 1-based column number, counted in characters
	pub column: usize,
}

impl fmt::Display for SourceLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "line {}, column {}", self.line, self.column)
	}
}

fn at(location: &Option<SourceLocation>) -> String {
	match location {
		Some(location) => format!(" at {}", location),
		None => String::new(),
	}
}

fn hint(suggestion: &Option<String>) -> String {
	match suggestion {
		Some(suggestion) => format!(" (did you mean `{}`?)", suggestion),
		None => String::new(),
	}
}

/// Malformed template syntax
///
/// Carries the byte offset of the offending construct and a rendered excerpt of the
/// surrounding source with a caret marker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at {location} (offset {offset})\n{excerpt}", offset = .location.offset)]
pub struct SequencingError {
	/// Human readable description of the violation
	pub message: String,
	/// Where the violation was detected
	pub location: SourceLocation,
	/// Source excerpt with a caret under the offending column
	pub excerpt: String,
}

impl SequencingError {
	/// Byte offset of the violation
	pub fn offset(&self) -> usize {
		self.location.offset
	}
}

/// A namespace alias or component call that could not be mapped to a component
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ResolutionError {
	/// The alias is neither registered nor ignored
	#[error("unknown namespace alias `{alias}`{}{}", hint(.suggestion), at(.location))]
	UnknownNamespace {
		alias: String,
		suggestion: Option<String>,
		location: Option<SourceLocation>,
	},

	/// No delegate and no registered component matched the call name
	#[error(
		"component `{alias}:{name}` could not be resolved (searched {}){}{}",
		.searched.join(", "),
		hint(.suggestion),
		at(.location)
	)]
	UnknownComponent {
		alias: String,
		name: String,
		/// Fully qualified type names that were looked up
		searched: Vec<String>,
		suggestion: Option<String>,
		location: Option<SourceLocation>,
	},

	/// A delegate claimed the call name but refused to resolve it
	#[error("delegate for `{namespace}` cannot resolve `{name}`: {reason}{}", at(.location))]
	Unresolvable {
		namespace: String,
		name: String,
		reason: String,
		location: Option<SourceLocation>,
	},

	/// The component's argument contract could not be computed
	#[error("component `{type_name}` has an invalid argument contract: {source}")]
	Contract {
		type_name: String,
		#[source]
		source: ArgumentContractError,
	},
}

impl ResolutionError {
	/// Attach a source location if the error does not carry one yet
	pub fn with_location(mut self, new_location: SourceLocation) -> Self {
		match &mut self {
			Self::UnknownNamespace { location, .. }
			| Self::UnknownComponent { location, .. }
			| Self::Unresolvable { location, .. } => {
				location.get_or_insert(new_location);
			}
			Self::Contract { .. } => {}
		}
		self
	}

	/// Source location of the failing construct, when known
	pub fn location(&self) -> Option<SourceLocation> {
		match self {
			Self::UnknownNamespace { location, .. }
			| Self::UnknownComponent { location, .. }
			| Self::Unresolvable { location, .. } => *location,
			Self::Contract { .. } => None,
		}
	}
}

/// Violation of a component's declared argument contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ArgumentContractError {
	#[error("argument `{argument}` is not declared by component `{component}`{}", hint(.suggestion))]
	UnknownArgument {
		component: String,
		argument: String,
		suggestion: Option<String>,
	},

	#[error("required argument `{argument}` of component `{component}` was not supplied")]
	MissingRequired { component: String, argument: String },

	#[error(
		"argument `{argument}` of component `{component}` expects type `{expected}`, got `{actual}`"
	)]
	InvalidType {
		component: String,
		argument: String,
		expected: String,
		actual: String,
	},

	#[error("argument `{argument}` is registered twice by component `{component}`")]
	DuplicateDefinition { component: String, argument: String },
}

/// Top-level error returned by parsing and rendering
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TemplateError {
	#[error(transparent)]
	Sequencing(#[from] SequencingError),

	#[error(transparent)]
	Resolution(#[from] ResolutionError),

	#[error(transparent)]
	ArgumentContract(#[from] ArgumentContractError),

	/// A component reported a failure while rendering
	#[error("component `{component}` failed: {message}")]
	Component { component: String, message: String },

	/// A value could not be converted into the template value model
	#[error("value conversion failed: {0}")]
	Value(#[from] serde_json::Error),

	#[error(transparent)]
	Config(#[from] ConfigError),
}

impl TemplateError {
	/// Convenience constructor for component failures
	pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Component {
			component: component.into(),
			message: message.into(),
		}
	}

	/// Source location of the failing construct, when the error carries one
	pub fn location(&self) -> Option<SourceLocation> {
		match self {
			Self::Sequencing(error) => Some(error.location),
			Self::Resolution(error) => error.location(),
			_ => None,
		}
	}
}

/// Result alias used throughout the engine
pub type TemplateResult<T> = Result<T, TemplateError>;
