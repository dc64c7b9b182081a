//! Namespace declaration extraction
//!
//! Runs before scanning. Declarations are collected into a [`NamespaceScope`]
//! that lives for one parse and overlays the resolver's global table; the
//! declaring spans are elided from the source.
//!
//! Recognized forms:
//!
//! ```text
//! {namespace app=app::components}     register `app`
//! {namespace svg}                     ignore `svg`
//! {namespace x*}                      ignore every alias starting with `x`
//! xmlns:app="https://reinhardt.rs/ns/app/components"
//! <div data-stencil-namespace="true" ...>...</div>   wrapper removed from output
//! ```

use std::ops::Range;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::ResolutionError;
use crate::resolver::{Resolver, matches_pattern};
use crate::source::Source;

fn directive_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(
			r"\{namespace\s+([A-Za-z][A-Za-z0-9_.\-]*\*?)\s*(?:=\s*([A-Za-z0-9_\\:.]+)\s*)?\}",
		)
		.expect("namespace directive pattern is valid")
	})
}

fn xmlns_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(r#"xmlns:([A-Za-z][A-Za-z0-9_.\-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
			.expect("xmlns pattern is valid")
	})
}

fn wrapper_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(
			r#"<([A-Za-z][A-Za-z0-9_:\-]*)\s[^>]*\bdata-stencil-namespace\s*=\s*["']true["'][^>]*>"#,
		)
		.expect("namespace wrapper pattern is valid")
	})
}

/// How an alias is treated within one parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AliasStatus {
	/// Registered; targets in search order
	Known(Vec<String>),
	Ignored,
}

/// Namespace declarations of a single parse, layered over the resolver
pub(crate) struct NamespaceScope<'r> {
	resolver: &'r Resolver,
	local: IndexMap<String, Vec<String>>,
	ignored: Vec<String>,
}

impl<'r> NamespaceScope<'r> {
	pub(crate) fn new(resolver: &'r Resolver) -> Self {
		Self {
			resolver,
			local: IndexMap::new(),
			ignored: Vec::new(),
		}
	}

	pub(crate) fn register(&mut self, alias: &str, target: &str) {
		tracing::debug!(alias, target, "template declares namespace");
		let targets = self.local.entry(alias.to_string()).or_default();
		targets.retain(|existing| existing != target);
		targets.push(target.to_string());
	}

	pub(crate) fn ignore(&mut self, pattern: &str) {
		tracing::debug!(pattern, "template ignores namespace");
		if !self.ignored.iter().any(|existing| existing == pattern) {
			self.ignored.push(pattern.to_string());
		}
	}

	/// Registered aliases win over ignore patterns; template declarations win over
	/// global ones
	pub(crate) fn status(&self, alias: &str) -> Result<AliasStatus, ResolutionError> {
		if let Some(local) = self.local.get(alias) {
			let mut targets: Vec<String> = local.iter().rev().cloned().collect();
			for target in self.resolver.targets(alias) {
				if !targets.contains(&target) {
					targets.push(target);
				}
			}
			return Ok(AliasStatus::Known(targets));
		}
		if self
			.ignored
			.iter()
			.any(|pattern| matches_pattern(pattern, alias))
		{
			return Ok(AliasStatus::Ignored);
		}

		match self.resolver.is_namespace_valid(alias) {
			Ok(true) => Ok(AliasStatus::Known(self.resolver.targets(alias))),
			Ok(false) => Ok(AliasStatus::Ignored),
			Err(_) => {
				let declared: Vec<&str> = self.local.keys().map(String::as_str).collect();
				Err(self.resolver.unknown_namespace(alias, &declared))
			}
		}
	}
}

/// Convert a namespace URI into a target, `None` when it lacks the prefix
fn target_from_uri(uri: &str, prefix: &str) -> Option<String> {
	let path = uri.trim().strip_prefix(prefix)?.trim_matches('/');
	if path.is_empty() {
		return None;
	}
	Some(path.split('/').collect::<Vec<_>>().join("::"))
}

/// Collect declarations from `source` into `scope` and elide their spans
pub(crate) fn extract(source: &mut Source, scope: &mut NamespaceScope<'_>, uri_prefix: &str) {
	let text = source.as_str();
	let mut elided: Vec<Range<usize>> = Vec::new();

	for captures in directive_pattern().captures_iter(text) {
		let (Some(whole), Some(alias)) = (captures.get(0), captures.get(1)) else {
			continue;
		};
		match captures.get(2) {
			Some(target) if !alias.as_str().ends_with('*') => {
				scope.register(alias.as_str(), &target.as_str().replace('\\', "::"))
			}
			_ => scope.ignore(alias.as_str()),
		}
		elided.push(whole.range());
	}

	for captures in xmlns_pattern().captures_iter(text) {
		let Some(alias) = captures.get(1) else {
			continue;
		};
		let uri = captures
			.get(2)
			.or_else(|| captures.get(3))
			.map_or("", |uri| uri.as_str());
		match target_from_uri(uri, uri_prefix) {
			Some(target) => scope.register(alias.as_str(), &target),
			None => {
				tracing::warn!(
					alias = alias.as_str(),
					uri,
					"xmlns declaration outside the component namespace prefix, alias ignored"
				);
				scope.ignore(alias.as_str());
			}
		}
	}

	let wrapper = wrapper_pattern()
		.captures(text)
		.and_then(|captures| Some((captures.get(0)?, captures.get(1)?)));
	if let Some((open, tag)) = wrapper {
		elided.push(open.range());
		let closing = format!("</{}", tag.as_str());
		if let Some(close_start) = text[open.end()..].rfind(&closing).map(|i| open.end() + i) {
			let close_end = text[close_start..]
				.find('>')
				.map_or(text.len(), |i| close_start + i + 1);
			elided.push(close_start..close_end);
		}
	}

	source.set_elided(elided);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::DEFAULT_NAMESPACE_URI_PREFIX;
	use rstest::{fixture, rstest};

	#[fixture]
	fn resolver() -> Resolver {
		let resolver = Resolver::default();
		resolver.register_namespace("f", "reinhardt::stencil::components");
		resolver
	}

	fn visible(source: &Source) -> String {
		let mut output = String::new();
		let mut cursor = 0;
		for range in source.elided() {
			output.push_str(&source.as_str()[cursor..range.start]);
			cursor = range.end;
		}
		output.push_str(&source.as_str()[cursor..]);
		output
	}

	#[rstest]
	fn test_directives_register_ignore_and_are_elided(resolver: Resolver) {
		// Arrange
		let mut source = Source::new("{namespace app=app::ui}{namespace svg}{namespace x*}<p/>");
		let mut scope = NamespaceScope::new(&resolver);

		// Act
		extract(&mut source, &mut scope, DEFAULT_NAMESPACE_URI_PREFIX);

		// Assert
		assert_eq!(visible(&source), "<p/>");
		assert_eq!(
			scope.status("app").unwrap(),
			AliasStatus::Known(vec!["app::ui".to_string()])
		);
		assert_eq!(scope.status("svg").unwrap(), AliasStatus::Ignored);
		assert_eq!(scope.status("xlink").unwrap(), AliasStatus::Ignored);
	}

	#[rstest]
	fn test_xmlns_declarations(resolver: Resolver) {
		let mut source = Source::new(concat!(
			r#"<html xmlns:app="https://reinhardt.rs/ns/app/ui/widgets" "#,
			r#"xmlns:xsl="http://www.w3.org/1999/XSL/Transform">"#
		));
		let mut scope = NamespaceScope::new(&resolver);

		extract(&mut source, &mut scope, DEFAULT_NAMESPACE_URI_PREFIX);

		assert_eq!(
			scope.status("app").unwrap(),
			AliasStatus::Known(vec!["app::ui::widgets".to_string()])
		);
		assert_eq!(scope.status("xsl").unwrap(), AliasStatus::Ignored);
		assert!(source.elided().is_empty());
	}

	#[rstest]
	fn test_wrapper_tag_is_elided(resolver: Resolver) {
		let mut source = Source::new(concat!(
			r#"<html xmlns:f="https://reinhardt.rs/ns/reinhardt/stencil/components" "#,
			r#"data-stencil-namespace="true"><b>x</b></html>"#
		));
		let mut scope = NamespaceScope::new(&resolver);

		extract(&mut source, &mut scope, DEFAULT_NAMESPACE_URI_PREFIX);

		assert_eq!(visible(&source), "<b>x</b>");
	}

	#[rstest]
	fn test_local_targets_are_searched_before_global_ones(resolver: Resolver) {
		let mut scope = NamespaceScope::new(&resolver);

		scope.register("f", "app::overrides");

		assert_eq!(
			scope.status("f").unwrap(),
			AliasStatus::Known(vec![
				"app::overrides".to_string(),
				"reinhardt::stencil::components".to_string(),
			])
		);
	}

	#[rstest]
	fn test_unknown_alias_suggests_declared_aliases(resolver: Resolver) {
		let mut scope = NamespaceScope::new(&resolver);
		scope.register("widgets", "app::widgets");

		let error = scope.status("widget").unwrap_err();

		assert!(matches!(
			error,
			ResolutionError::UnknownNamespace { suggestion: Some(ref s), .. } if s == "widgets"
		));
	}
}
