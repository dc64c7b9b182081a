//! Engine-wide properties
//!
//! Tree shape of a simple invocation, variable scope hygiene after failures,
//! argument contracts of every default component and equivalence of boolean
//! evaluation across both paths.

use proptest::prelude::*;
use reinhardt_stencil::components::{COMPONENTS_ALIAS, COMPONENTS_NAMESPACE};
use reinhardt_stencil::prelude::*;
use reinhardt_stencil::{ArgumentProcessing, Node};
use reinhardt_stencil_integration_tests::fixtures::{self, WrapComponent};
use reinhardt_stencil_integration_tests::{context_with, render_both};
use rstest::*;

#[fixture]
fn engine() -> Engine {
	fixtures::engine(ArgumentProcessing::Lenient).unwrap()
}

// ============================================================================
// Tree shape
// ============================================================================

#[rstest]
fn test_invocation_tree_shape() {
	// Arrange
	let engine = fixtures::builder()
		.component_in(COMPONENTS_NAMESPACE, "c", WrapComponent)
		.build()
		.unwrap();

	// Act
	let parsed = engine.parse(r#"<f:c s="foo">x</f:c>"#).unwrap();

	// Assert
	let [node] = parsed.root().children() else {
		panic!("expected a single node, got {:?}", parsed.root());
	};
	let invocation = node.as_invocation().unwrap();
	assert_eq!(invocation.alias, "f");
	assert_eq!(invocation.name, "c");
	assert_eq!(invocation.arguments.len(), 1);
	assert!(matches!(invocation.arguments.get("s"), Some(Node::Text(text)) if text == "foo"));
	assert!(matches!(invocation.children.as_slice(), [Node::Text(text)] if text == "x"));
	assert_eq!(parsed.render(&mut engine.context()).unwrap(), "x");
}

// ============================================================================
// Scope hygiene
// ============================================================================

#[rstest]
#[case::loop_body(r#"<f:for each="{items}" as="item"><app:card /></f:for>"#)]
#[case::alias_body(r#"<f:alias map="{item: items}"><app:sum numbers="{item.0}" /></f:alias>"#)]
fn test_failing_body_leaves_no_scope_behind(engine: Engine, #[case] template: &str) {
	// Arrange
	let parsed = engine.parse(template).unwrap();
	let compiled = engine.compile(&parsed);
	let variables = serde_json::json!({"items": [1, 2]});
	let mut interpreted_context = context_with(&engine, &variables).unwrap();
	let mut compiled_context = context_with(&engine, &variables).unwrap();
	let depth = interpreted_context.variables().depth();

	// Act
	let interpreted = parsed.render(&mut interpreted_context);
	let compiled = compiled.render(&mut compiled_context);

	// Assert
	assert!(interpreted.is_err());
	assert!(compiled.is_err());
	for context in [&interpreted_context, &compiled_context] {
		assert_eq!(context.variables().depth(), depth);
		assert!(context.get("item").is_none());
	}
}

// ============================================================================
// Argument contracts
// ============================================================================

const DEFAULT_CALL_NAMES: &[&str] = &[
	"if",
	"then",
	"else",
	"for",
	"alias",
	"variable",
	"format.raw",
	"format.htmlspecialchars",
	"format.json",
	"count",
	"comment",
	"debug",
];

#[rstest]
fn test_every_default_component_has_a_contract(engine: Engine) {
	for call_name in DEFAULT_CALL_NAMES {
		// Act
		let resolved = engine
			.resolver()
			.resolve(COMPONENTS_ALIAS, call_name)
			.unwrap_or_else(|error| panic!("{call_name}: {error}"));

		// Assert
		for definition in resolved.contract().iter() {
			assert!(!definition.name().is_empty(), "{call_name}");
			assert!(!definition.type_name().is_empty(), "{call_name}");
			assert!(
				!(definition.is_required() && !definition.default_value().is_null()),
				"{call_name}.{} is required and has a default",
				definition.name()
			);
		}
	}
}

#[rstest]
fn test_contracts_are_computed_once(engine: Engine) {
	// Arrange
	let resolver = engine.resolver();
	resolver.resolve(COMPONENTS_ALIAS, "for").unwrap();
	let computed = resolver.contracts().computations();

	// Act
	for _ in 0..5 {
		resolver.resolve(COMPONENTS_ALIAS, "for").unwrap();
	}

	// Assert
	assert_eq!(resolver.contracts().computations(), computed);
}

#[rstest]
#[case::all_arguments(r#"<app:card title="t" highlighted="1" />"#, true)]
#[case::optional_omitted(r#"<app:card title="t" />"#, true)]
#[case::required_missing(r#"<app:card highlighted="1" />"#, false)]
#[case::undeclared(r#"<app:card title="t" subtitle="s" />"#, false)]
#[case::undeclared_accepted(r#"<app:wrap anything="goes" />"#, true)]
fn test_invocation_succeeds_exactly_when_the_contract_is_met(
	engine: Engine,
	#[case] template: &str,
	#[case] accepted: bool,
) {
	let outcome = render_both(&engine, template, &serde_json::Value::Null);

	match outcome {
		Ok(_) => assert!(accepted, "{template} rendered"),
		Err(error) => {
			assert!(!accepted, "{template}: {error}");
			assert!(matches!(error, TemplateError::ArgumentContract(_)), "{error}");
		}
	}
}

// ============================================================================
// Boolean evaluation
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Comparison {
	Equal,
	NotEqual,
	Less,
	LessOrEqual,
	Greater,
	GreaterOrEqual,
}

impl Comparison {
	fn symbol(self) -> &'static str {
		match self {
			Self::Equal => "==",
			Self::NotEqual => "!=",
			Self::Less => "<",
			Self::LessOrEqual => "<=",
			Self::Greater => ">",
			Self::GreaterOrEqual => ">=",
		}
	}

	fn apply(self, left: i64, right: i64) -> bool {
		match self {
			Self::Equal => left == right,
			Self::NotEqual => left != right,
			Self::Less => left < right,
			Self::LessOrEqual => left <= right,
			Self::Greater => left > right,
			Self::GreaterOrEqual => left >= right,
		}
	}
}

#[derive(Debug, Clone)]
enum Operand {
	Number(i64),
	Variable(&'static str),
}

#[derive(Debug, Clone)]
enum Condition {
	Operand(Operand),
	Compare(Operand, Comparison, Operand),
	Not(Box<Condition>),
	And(Box<Condition>, Box<Condition>),
	Or(Box<Condition>, Box<Condition>),
}

impl Operand {
	fn source(&self) -> String {
		match self {
			Self::Number(n) => n.to_string(),
			Self::Variable(name) => format!("{{{name}}}"),
		}
	}

	fn value(&self, a: i64, b: i64) -> i64 {
		match self {
			Self::Number(n) => *n,
			Self::Variable("a") => a,
			Self::Variable(_) => b,
		}
	}
}

impl Condition {
	fn source(&self) -> String {
		match self {
			Self::Operand(operand) => operand.source(),
			Self::Compare(left, comparison, right) => {
				format!("{} {} {}", left.source(), comparison.symbol(), right.source())
			}
			Self::Not(inner) => format!("!({})", inner.source()),
			Self::And(left, right) => format!("({}) && ({})", left.source(), right.source()),
			Self::Or(left, right) => format!("({}) || ({})", left.source(), right.source()),
		}
	}

	fn evaluate(&self, a: i64, b: i64) -> bool {
		match self {
			Self::Operand(operand) => operand.value(a, b) != 0,
			Self::Compare(left, comparison, right) => {
				comparison.apply(left.value(a, b), right.value(a, b))
			}
			Self::Not(inner) => !inner.evaluate(a, b),
			Self::And(left, right) => left.evaluate(a, b) && right.evaluate(a, b),
			Self::Or(left, right) => left.evaluate(a, b) || right.evaluate(a, b),
		}
	}
}

fn operand() -> impl Strategy<Value = Operand> {
	prop_oneof![
		(0i64..4).prop_map(Operand::Number),
		prop_oneof![Just("a"), Just("b")].prop_map(Operand::Variable),
	]
}

fn comparison() -> impl Strategy<Value = Comparison> {
	prop_oneof![
		Just(Comparison::Equal),
		Just(Comparison::NotEqual),
		Just(Comparison::Less),
		Just(Comparison::LessOrEqual),
		Just(Comparison::Greater),
		Just(Comparison::GreaterOrEqual),
	]
}

fn condition() -> impl Strategy<Value = Condition> {
	let leaf = prop_oneof![
		operand().prop_map(Condition::Operand),
		(operand(), comparison(), operand())
			.prop_map(|(left, comparison, right)| Condition::Compare(left, comparison, right)),
	];
	leaf.prop_recursive(4, 24, 2, |inner| {
		prop_oneof![
			inner.clone().prop_map(|c| Condition::Not(Box::new(c))),
			(inner.clone(), inner.clone())
				.prop_map(|(l, r)| Condition::And(Box::new(l), Box::new(r))),
			(inner.clone(), inner).prop_map(|(l, r)| Condition::Or(Box::new(l), Box::new(r))),
		]
	})
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn prop_conditions_match_reference_evaluation(
		condition in condition(),
		a in 0i64..4,
		b in 0i64..4,
	) {
		let engine = fixtures::engine(ArgumentProcessing::Lenient).unwrap();
		let template = format!(
			r#"<f:if condition="{}" then="1" else="0" />"#,
			condition.source()
		);
		let expected = if condition.evaluate(a, b) { "1" } else { "0" };

		let output = render_both(&engine, &template, &serde_json::json!({"a": a, "b": b})).unwrap();

		prop_assert_eq!(&output.interpreted, expected, "{}", template);
		prop_assert_eq!(&output.compiled, expected, "{}", template);
	}
}
