//! Golden conformance suite
//!
//! Renders every case in `fixtures/golden.toml` through the interpreter and the
//! compiler and checks both against the recorded expectation.

use std::path::PathBuf;

use reinhardt_stencil::ArgumentProcessing;
use reinhardt_stencil_integration_tests::fixtures;
use reinhardt_stencil_integration_tests::golden::{GoldenCase, load_cases};
use rstest::*;

#[fixture]
fn cases() -> Vec<GoldenCase> {
	let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("integration/fixtures/golden.toml");
	load_cases(path).unwrap()
}

#[rstest]
fn test_golden_cases(cases: Vec<GoldenCase>) {
	// Arrange
	let lenient = fixtures::engine(ArgumentProcessing::Lenient).unwrap();
	let strict = fixtures::engine(ArgumentProcessing::Strict).unwrap();

	// Act
	let failures: Vec<String> = cases
		.iter()
		.filter_map(|case| {
			let engine = match case.policy {
				ArgumentProcessing::Strict => &strict,
				_ => &lenient,
			};
			case.check(engine).err().map(|error| format!("{error:#}"))
		})
		.collect();

	// Assert
	assert!(
		failures.is_empty(),
		"{} of {} golden cases failed:\n{}",
		failures.len(),
		cases.len(),
		failures.join("\n")
	);
}

#[rstest]
fn test_golden_file_is_not_empty(cases: Vec<GoldenCase>) {
	assert!(cases.len() > 20);
	assert!(cases.iter().any(|case| case.error.is_some()));
}

#[rstest]
fn test_engine_from_toml_configuration() {
	// Arrange
	let config = reinhardt_stencil::EngineConfig::from_toml_str(
		r#"
		argument_processing = "strict"

		[namespaces]
		ui = ["tests::app"]
		"#,
	)
	.unwrap();
	let engine = fixtures::builder().config(config).build().unwrap();

	// Act
	let output = reinhardt_stencil_integration_tests::render_both(
		&engine,
		"{ui:sum(numbers: values)}",
		&serde_json::json!({"values": ["1", "2"]}),
	)
	.unwrap();

	// Assert
	assert_eq!(output.interpreted, "3");
	assert_eq!(output.compiled, "3");
}
