//! Golden cases loaded from TOML
//!
//! Each `[[case]]` table names a template, the variables it renders with and
//! either the expected output or a fragment of the expected error message.

use std::path::Path;

use anyhow::{Context, bail};
use reinhardt_stencil::{ArgumentProcessing, Engine};
use serde::Deserialize;

use crate::render_both;

#[derive(Debug, Clone, Deserialize)]
pub struct GoldenCase {
	pub name: String,
	pub template: String,
	#[serde(default)]
	pub variables: serde_json::Value,
	#[serde(default)]
	pub policy: ArgumentProcessing,
	pub expected: Option<String>,
	/// Substring of the rendered error message
	pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoldenFile {
	#[serde(rename = "case", default)]
	cases: Vec<GoldenCase>,
}

/// Parse golden cases from TOML text
pub fn parse_cases(input: &str) -> anyhow::Result<Vec<GoldenCase>> {
	let file: GoldenFile = toml::from_str(input).context("malformed golden case file")?;
	for case in &file.cases {
		if case.expected.is_some() == case.error.is_some() {
			bail!(
				"golden case `{}` must set exactly one of `expected` and `error`",
				case.name
			);
		}
	}
	Ok(file.cases)
}

/// Load golden cases from a TOML file
pub fn load_cases(path: impl AsRef<Path>) -> anyhow::Result<Vec<GoldenCase>> {
	let path = path.as_ref();
	let input = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read golden cases from {}", path.display()))?;
	parse_cases(&input).with_context(|| format!("in {}", path.display()))
}

impl GoldenCase {
	/// Render through both paths and compare with the expectation
	pub fn check(&self, engine: &Engine) -> anyhow::Result<()> {
		let outcome = render_both(engine, &self.template, &self.variables);
		match (&self.expected, &self.error, outcome) {
			(Some(expected), _, Ok(output)) => {
				if output.interpreted != output.compiled {
					bail!(
						"`{}`: interpreted {:?} and compiled {:?} disagree",
						self.name,
						output.interpreted,
						output.compiled
					);
				}
				if &output.interpreted != expected {
					bail!(
						"`{}`: expected {:?}, rendered {:?}",
						self.name,
						expected,
						output.interpreted
					);
				}
				Ok(())
			}
			(Some(_), _, Err(error)) => {
				Err(anyhow::Error::new(error).context(format!("`{}` failed to render", self.name)))
			}
			(None, Some(fragment), Err(error)) => {
				let message = error.to_string();
				if !message.contains(fragment.as_str()) {
					bail!(
						"`{}`: error {:?} does not mention {:?}",
						self.name,
						message,
						fragment
					);
				}
				Ok(())
			}
			(None, _, Ok(output)) => bail!(
				"`{}`: expected an error, rendered {:?}",
				self.name,
				output.interpreted
			),
			(None, None, Err(error)) => Err(anyhow::Error::new(error)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parse_cases_reads_tables_in_order() {
		// Arrange
		let input = r#"
			[[case]]
			name = "first"
			template = "{a}"
			variables = { a = 1 }
			expected = "1"

			[[case]]
			name = "second"
			template = "{b"
			policy = "strict"
			error = "unterminated"
		"#;

		// Act
		let cases = parse_cases(input).unwrap();

		// Assert
		assert_eq!(cases.len(), 2);
		assert_eq!(cases[0].variables, serde_json::json!({"a": 1}));
		assert_eq!(cases[1].policy, ArgumentProcessing::Strict);
		assert!(cases[1].variables.is_null());
	}

	#[rstest]
	fn test_parse_cases_requires_one_expectation() {
		let input = r#"
			[[case]]
			name = "ambiguous"
			template = ""
		"#;

		let error = parse_cases(input).unwrap_err();

		assert!(error.to_string().contains("exactly one"), "{error}");
	}
}
