//! Engine configuration
//!
//! [`EngineConfig`] can be built in code or loaded from TOML:
//!
//! ```toml
//! argument_processing = "strict"
//! escaping = true
//! ignored_namespaces = ["xsl*"]
//!
//! [namespaces]
//! f = ["reinhardt::stencil::components"]
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::source::DEFAULT_EXCERPT_WIDTH;

/// URI prefix recognized in `xmlns:alias="..."` declarations
pub const DEFAULT_NAMESPACE_URI_PREFIX: &str = "https://reinhardt.rs/ns/";

/// Suffix appended to conventional component type names
pub const DEFAULT_COMPONENT_SUFFIX: &str = "Component";

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
	#[error("failed to parse engine configuration: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("invalid engine configuration: {0}")]
	Invalid(String),
}

/// How invocation arguments are checked against their declared types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentProcessing {
	/// Structural checks only, values are never coerced
	#[default]
	Lenient,
	/// Scalars are coerced to the declared type and type aliases are recognized
	Strict,
}

/// Settings shared by every parse and render of an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	pub argument_processing: ArgumentProcessing,
	/// Install the HTML escaping interceptor
	pub escaping: bool,
	pub namespace_uri_prefix: String,
	pub component_suffix: String,
	/// Global namespace aliases, each mapped to one or more targets
	pub namespaces: IndexMap<String, Vec<String>>,
	/// Ignored aliases; a trailing `*` ignores every alias with that prefix
	pub ignored_namespaces: Vec<String>,
	/// Characters shown on each side of an error position
	pub excerpt_width: usize,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			argument_processing: ArgumentProcessing::default(),
			escaping: true,
			namespace_uri_prefix: DEFAULT_NAMESPACE_URI_PREFIX.to_string(),
			component_suffix: DEFAULT_COMPONENT_SUFFIX.to_string(),
			namespaces: IndexMap::new(),
			ignored_namespaces: Vec::new(),
			excerpt_width: DEFAULT_EXCERPT_WIDTH,
		}
	}
}

impl EngineConfig {
	/// Parse and validate a TOML document
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_core::{ArgumentProcessing, EngineConfig};
	///
	/// let config = EngineConfig::from_toml_str(r#"argument_processing = "strict""#).unwrap();
	/// assert_eq!(config.argument_processing, ArgumentProcessing::Strict);
	/// assert!(config.escaping);
	/// ```
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Check aliases, targets and prefixes for obvious mistakes
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.namespace_uri_prefix.is_empty() {
			return Err(ConfigError::Invalid(
				"namespace_uri_prefix must not be empty".to_string(),
			));
		}
		for (alias, targets) in &self.namespaces {
			if !is_alias(alias) {
				return Err(ConfigError::Invalid(format!(
					"`{}` is not a valid namespace alias",
					alias
				)));
			}
			if targets.is_empty() || targets.iter().any(|target| target.trim().is_empty()) {
				return Err(ConfigError::Invalid(format!(
					"namespace `{}` needs at least one non-empty target",
					alias
				)));
			}
		}
		if let Some(pattern) = self
			.ignored_namespaces
			.iter()
			.find(|pattern| !is_alias(pattern.trim_end_matches('*')))
		{
			return Err(ConfigError::Invalid(format!(
				"`{}` is not a valid ignored namespace pattern",
				pattern
			)));
		}
		Ok(())
	}
}

/// Whether `alias` is usable as a namespace alias
pub(crate) fn is_alias(alias: &str) -> bool {
	let mut chars = alias.chars();
	chars.next().is_some_and(|c| c.is_ascii_alphabetic())
		&& chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_default_config() {
		let config = EngineConfig::default();

		assert_eq!(config.argument_processing, ArgumentProcessing::Lenient);
		assert!(config.escaping);
		assert_eq!(config.namespace_uri_prefix, "https://reinhardt.rs/ns/");
		assert_eq!(config.component_suffix, "Component");
		assert!(config.validate().is_ok());
	}

	#[rstest]
	fn test_from_toml_str_reads_all_sections() {
		// Arrange
		let input = r#"
argument_processing = "strict"
escaping = false
ignored_namespaces = ["xsl*", "svg"]
excerpt_width = 10

[namespaces]
f = ["reinhardt::stencil::components"]
app = ["app::base", "app::overrides"]
"#;

		// Act
		let config = EngineConfig::from_toml_str(input).unwrap();

		// Assert
		assert_eq!(config.argument_processing, ArgumentProcessing::Strict);
		assert!(!config.escaping);
		assert_eq!(config.ignored_namespaces, vec!["xsl*", "svg"]);
		assert_eq!(config.excerpt_width, 10);
		assert_eq!(config.namespaces["app"], vec!["app::base", "app::overrides"]);
	}

	#[rstest]
	#[case("argument_processing = \"loose\"")]
	#[case("[namespaces]\n\"1x\" = [\"a\"]")]
	#[case("[namespaces]\nf = []")]
	#[case("ignored_namespaces = [\"*\"]")]
	#[case("namespace_uri_prefix = \"\"")]
	fn test_from_toml_str_rejects_invalid_input(#[case] input: &str) {
		assert!(EngineConfig::from_toml_str(input).is_err());
	}
}
