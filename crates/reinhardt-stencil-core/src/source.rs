//! Template source text with byte-indexed access
//!
//! A [`Source`] is created once per parse. Besides the raw text it records the
//! byte ranges removed by namespace extraction, so the scanner can skip them while
//! every reported offset still refers to the original text.

use std::ops::Range;

use crate::error::{SequencingError, SourceLocation};

/// Default number of characters shown on each side of an error position
pub const DEFAULT_EXCERPT_WIDTH: usize = 40;

/// Immutable template text
#[derive(Debug, Clone)]
pub struct Source {
	name: Option<String>,
	text: String,
	elided: Vec<Range<usize>>,
	excerpt_width: usize,
}

impl Source {
	/// Wrap template text
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_core::Source;
	///
	/// let source = Source::new("Hello {name}");
	/// assert_eq!(source.len(), 12);
	/// assert_eq!(source.bytes()[6], b'{');
	/// ```
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			name: None,
			text: text.into(),
			elided: Vec::new(),
			excerpt_width: DEFAULT_EXCERPT_WIDTH,
		}
	}

	/// Attach a template name used in diagnostics
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Set the excerpt width used by [`Source::error`]
	pub fn with_excerpt_width(mut self, width: usize) -> Self {
		self.excerpt_width = width;
		self
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn as_str(&self) -> &str {
		&self.text
	}

	pub fn bytes(&self) -> &[u8] {
		self.text.as_bytes()
	}

	pub fn len(&self) -> usize {
		self.text.len()
	}

	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}

	/// Byte ranges hidden from the scanner, sorted and non-overlapping
	pub fn elided(&self) -> &[Range<usize>] {
		&self.elided
	}

	/// Replace the elided ranges, normalizing them to a sorted, merged list
	pub(crate) fn set_elided(&mut self, mut ranges: Vec<Range<usize>>) {
		ranges.retain(|range| range.start < range.end && range.end <= self.text.len());
		ranges.sort_by_key(|range| range.start);
		let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
		for range in ranges {
			match merged.last_mut() {
				Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
				_ => merged.push(range),
			}
		}
		self.elided = merged;
	}

	/// Line and column of a byte offset
	pub fn location(&self, offset: usize) -> SourceLocation {
		let offset = self.floor_boundary(offset.min(self.text.len()));
		let before = &self.text[..offset];
		let line = before.matches('\n').count() + 1;
		let line_start = before.rfind('\n').map_or(0, |index| index + 1);
		let column = self.text[line_start..offset].chars().count() + 1;
		SourceLocation {
			offset,
			line,
			column,
		}
	}

	/// One-line excerpt around `offset` with a caret marker underneath
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_stencil_core::Source;
	///
	/// let source = Source::new("a\n<f:if condition=\"x\"");
	/// let excerpt = source.excerpt(2);
	/// assert!(excerpt.contains("   2 | <f:if"));
	/// assert!(excerpt.ends_with("| ^"));
	/// ```
	pub fn excerpt(&self, offset: usize) -> String {
		let location = self.location(offset);
		let offset = location.offset;
		let line_start = self.text[..offset].rfind('\n').map_or(0, |index| index + 1);
		let line_end = self.text[offset..]
			.find('\n')
			.map_or(self.text.len(), |index| offset + index);
		let line = &self.text[line_start..line_end];

		let column = location.column - 1;
		let skip = column.saturating_sub(self.excerpt_width);
		let shown: String = line
			.chars()
			.skip(skip)
			.take(self.excerpt_width * 2)
			.collect();
		let prefix = if skip > 0 { "..." } else { "" };
		let marker = column - skip + prefix.len();

		format!(
			"  {:4} | {}{}\n       | {}^",
			location.line,
			prefix,
			shown,
			" ".repeat(marker)
		)
	}

	/// Build a positioned [`SequencingError`]
	pub fn error(&self, offset: usize, message: impl Into<String>) -> SequencingError {
		let message = match &self.name {
			Some(name) => format!("{} in template `{}`", message.into(), name),
			None => message.into(),
		};
		SequencingError {
			message,
			location: self.location(offset),
			excerpt: self.excerpt(offset),
		}
	}

	fn floor_boundary(&self, mut offset: usize) -> usize {
		while !self.text.is_char_boundary(offset) {
			offset -= 1;
		}
		offset
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(0, 1, 1)]
	#[case(3, 1, 4)]
	#[case(5, 2, 1)]
	#[case(8, 2, 4)]
	fn test_location_reports_line_and_column(
		#[case] offset: usize,
		#[case] line: usize,
		#[case] column: usize,
	) {
		// Arrange
		let source = Source::new("abcd\nefgh");

		// Act
		let location = source.location(offset);

		// Assert
		assert_eq!(location.line, line);
		assert_eq!(location.column, column);
		assert_eq!(location.offset, offset);
	}

	#[rstest]
	fn test_location_counts_columns_in_characters() {
		let source = Source::new("äö{x}");

		let location = source.location(4);

		assert_eq!(location.column, 3);
	}

	#[rstest]
	fn test_excerpt_truncates_long_lines() {
		// Arrange
		let text = format!("{}{{broken", "x".repeat(100));
		let source = Source::new(text).with_excerpt_width(5);

		// Act
		let excerpt = source.excerpt(100);

		// Assert
		assert!(excerpt.contains("...xxxxx{brok"));
		let caret_line = excerpt.lines().last().unwrap();
		assert_eq!(caret_line.find('^'), Some("       | ".len() + 8));
	}

	#[rstest]
	fn test_error_includes_template_name() {
		let source = Source::new("<f:if").with_name("page.html");

		let error = source.error(0, "unterminated tag");

		assert_eq!(error.message, "unterminated tag in template `page.html`");
		assert_eq!(error.location.line, 1);
	}

	#[rstest]
	fn test_set_elided_sorts_and_merges_ranges() {
		let mut source = Source::new("0123456789");

		source.set_elided(vec![5..7, 0..2, 1..3, 6..9, 4..4]);

		assert_eq!(source.elided(), &[0..3, 5..9]);
	}
}
