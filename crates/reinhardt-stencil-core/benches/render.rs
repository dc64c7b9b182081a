//! Benchmark: parsing, interpretation and compiled rendering

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use reinhardt_stencil_core::prelude::*;

// Benchmark fixture: wraps its children in a paragraph
struct Paragraph;

impl Component for Paragraph {
	fn render(
		&self,
		_arguments: &Arguments,
		children: &Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		Ok(Value::String(format!(
			"<p>{}</p>",
			children.render(context)?.to_output_string()
		)))
	}

	fn escape_output(&self) -> bool {
		false
	}

	fn escape_children(&self) -> Option<bool> {
		Some(true)
	}
}

const TEMPLATE: &str = concat!(
	"<h1>{page.title}</h1>\n",
	"<b:p>{page.intro} by {page.author.name}</b:p>\n",
	"<b:p>{page.body}</b:p>\n",
	"<footer>{page.footer}</footer>\n",
);

fn engine() -> Engine {
	Engine::builder()
		.namespace("b", "bench")
		.component_in("bench", "p", Paragraph)
		.build()
		.unwrap()
}

fn context(engine: &Engine) -> RenderingContext {
	let mut context = engine.context();
	context
		.assign(
			"page",
			&serde_json::json!({
				"title": "Benchmarks <all>",
				"intro": "Short intro",
				"author": {"name": "Ada"},
				"body": "Body text & more",
				"footer": "(c) stencil",
			}),
		)
		.unwrap();
	context
}

fn benchmark_parse(c: &mut Criterion) {
	let engine = engine();

	c.bench_function("parse", |b| {
		b.iter(|| black_box(engine.parse(black_box(TEMPLATE)).unwrap()));
	});
}

fn benchmark_interpret(c: &mut Criterion) {
	let engine = engine();
	let template = engine.parse(TEMPLATE).unwrap();
	let mut context = context(&engine);

	c.bench_function("render_interpreted", |b| {
		b.iter(|| black_box(template.render(&mut context).unwrap()));
	});
}

fn benchmark_compiled(c: &mut Criterion) {
	let engine = engine();
	let unit = engine.compile(&engine.parse(TEMPLATE).unwrap());
	let mut context = context(&engine);

	c.bench_function("render_compiled", |b| {
		b.iter(|| black_box(unit.render(&mut context).unwrap()));
	});
}

criterion_group!(benches, benchmark_parse, benchmark_interpret, benchmark_compiled);
criterion_main!(benches);
