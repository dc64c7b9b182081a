//! Single-pass scanner over template text
//!
//! The scanner does not build a tree. It walks the bytes once and reports
//! positioned captures to the sequencer: literal text runs, inline expressions,
//! namespaced tag headers and CDATA sections. Quoted spans inside expressions and
//! tags are skipped as a whole so their content is never mistaken for markup.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::SequencingError;
use crate::source::Source;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

fn call_head_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(r"^\s*[A-Za-z][A-Za-z0-9_\-]*:[A-Za-z][A-Za-z0-9_.\-]*\(")
			.expect("call head pattern is valid")
	})
}

/// A positioned piece of template text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Capture<'s> {
	/// Literal text with escapes already resolved
	Text { value: String, offset: usize },
	/// An inline expression; `inner` excludes the braces
	Expression {
		inner: &'s str,
		raw: &'s str,
		offset: usize,
	},
	/// `<alias:name` or `</alias:name`; the cursor stops right after the name
	TagStart {
		alias: &'s str,
		name: &'s str,
		closing: bool,
		raw: &'s str,
		offset: usize,
	},
	/// A complete CDATA section including its markers
	Cdata { value: &'s str, offset: usize },
	End,
}

/// Attribute area of an opening tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TagBody<'s> {
	pub attributes: &'s str,
	pub attributes_offset: usize,
	pub self_closing: bool,
}

/// Cursor over a template or over a fragment of one
pub(crate) struct Scanner<'s> {
	source: &'s Source,
	text: &'s str,
	base: usize,
	pos: usize,
	elided: &'s [Range<usize>],
	elided_index: usize,
	tags: bool,
	queued: Option<(Capture<'s>, usize)>,
}

impl<'s> Scanner<'s> {
	/// Scan a whole template, recognizing tags and skipping elided ranges
	pub fn new(source: &'s Source) -> Self {
		Self {
			source,
			text: source.as_str(),
			base: 0,
			pos: 0,
			elided: source.elided(),
			elided_index: 0,
			tags: true,
			queued: None,
		}
	}

	/// Scan an attribute value or other fragment for text and expressions only
	pub fn fragment(source: &'s Source, text: &'s str, base: usize) -> Self {
		Self {
			source,
			text,
			base,
			pos: 0,
			elided: &[],
			elided_index: 0,
			tags: false,
			queued: None,
		}
	}

	pub fn source(&self) -> &'s Source {
		self.source
	}

	/// Absolute source offset of the cursor
	pub fn offset(&self) -> usize {
		self.base + self.pos
	}

	fn error(&self, local: usize, message: impl Into<String>) -> SequencingError {
		self.source.error(self.base + local, message)
	}

	fn bytes(&self) -> &'s [u8] {
		self.text.as_bytes()
	}

	/// Advance to the next capture
	pub fn next_capture(&mut self) -> Result<Capture<'s>, SequencingError> {
		if let Some((capture, resume)) = self.queued.take() {
			self.pos = resume;
			return Ok(capture);
		}

		let bytes = self.bytes();
		let mut text = String::new();
		let mut text_offset = None;
		let mut run_start = self.pos;

		loop {
			if self.skip_elided(&mut text, &mut text_offset, &mut run_start) {
				continue;
			}
			if self.pos >= bytes.len() {
				self.flush(&mut text, &mut text_offset, run_start, self.pos);
				return Ok(match text_offset {
					Some(offset) => Capture::Text {
						value: text,
						offset,
					},
					None => Capture::End,
				});
			}

			let special = match bytes[self.pos] {
				b'{' => match self.match_expression(self.pos)? {
					Some(end) => Some((
						Capture::Expression {
							inner: &self.text[self.pos + 1..end - 1],
							raw: &self.text[self.pos..end],
							offset: self.base + self.pos + 1,
						},
						end,
					)),
					None => None,
				},
				b'\\' => {
					let run_end = self.pos
						+ bytes[self.pos..]
							.iter()
							.take_while(|byte| **byte == b'\\')
							.count();
					if bytes.get(run_end) == Some(&b'{') {
						self.flush(&mut text, &mut text_offset, run_start, run_end - 1);
						text_offset.get_or_insert(self.base + self.pos);
						text.push('{');
						self.pos = run_end + 1;
						run_start = self.pos;
					} else {
						self.pos = run_end;
					}
					continue;
				}
				b'<' if self.tags => self.match_markup(self.pos)?,
				_ => None,
			};

			match special {
				Some((capture, resume)) => {
					self.flush(&mut text, &mut text_offset, run_start, self.pos);
					if let Some(offset) = text_offset {
						self.queued = Some((capture, resume));
						return Ok(Capture::Text {
							value: text,
							offset,
						});
					}
					self.pos = resume;
					return Ok(capture);
				}
				None => self.pos += 1,
			}
		}
	}

	fn flush(
		&self,
		text: &mut String,
		text_offset: &mut Option<usize>,
		run_start: usize,
		run_end: usize,
	) {
		if run_start < run_end {
			text_offset.get_or_insert(self.base + run_start);
			text.push_str(&self.text[run_start..run_end]);
		}
	}

	fn skip_elided(
		&mut self,
		text: &mut String,
		text_offset: &mut Option<usize>,
		run_start: &mut usize,
	) -> bool {
		while let Some(range) = self.elided.get(self.elided_index) {
			if range.end <= self.pos {
				self.elided_index += 1;
				continue;
			}
			if range.start <= self.pos {
				self.flush(text, text_offset, *run_start, self.pos);
				self.pos = range.end;
				*run_start = self.pos;
				self.elided_index += 1;
				return true;
			}
			break;
		}
		false
	}

	/// Find the end (exclusive) of an inline expression starting at `open`
	///
	/// Returns `None` when the brace does not start an expression; such braces are
	/// literal text.
	fn match_expression(&self, open: usize) -> Result<Option<usize>, SequencingError> {
		let bytes = self.bytes();
		let starts_expression = bytes.get(open + 1).is_some_and(|byte| {
			byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'\'' | b'"' | b'-')
		});
		if !starts_expression {
			return Ok(None);
		}

		let mut depth = 0usize;
		let mut index = open;
		while index < bytes.len() {
			match bytes[index] {
				quote @ (b'\'' | b'"') => match self.skip_quoted(index, quote) {
					Some(end) => index = end,
					None => return self.unterminated_expression(open),
				},
				b'{' => {
					depth += 1;
					index += 1;
				}
				b'}' => {
					depth -= 1;
					index += 1;
					if depth == 0 {
						return Ok(Some(index));
					}
				}
				_ => index += 1,
			}
		}
		self.unterminated_expression(open)
	}

	fn unterminated_expression(&self, open: usize) -> Result<Option<usize>, SequencingError> {
		if call_head_pattern().is_match(&self.text[open + 1..]) {
			Err(self.error(open, "unterminated inline expression"))
		} else {
			Ok(None)
		}
	}

	/// Index just past the closing quote matching the one at `open`
	fn skip_quoted(&self, open: usize, quote: u8) -> Option<usize> {
		let bytes = self.bytes();
		let mut index = open + 1;
		while index < bytes.len() {
			match bytes[index] {
				b'\\' => index += 2,
				byte if byte == quote => return Some(index + 1),
				_ => index += 1,
			}
		}
		None
	}

	fn match_markup(&self, open: usize) -> Result<Option<(Capture<'s>, usize)>, SequencingError> {
		let rest = &self.text[open..];
		if rest.starts_with(CDATA_OPEN) {
			let Some(close) = rest.find(CDATA_CLOSE) else {
				return Err(self.error(open, "unterminated CDATA section"));
			};
			let end = open + close + CDATA_CLOSE.len();
			return Ok(Some((
				Capture::Cdata {
					value: &self.text[open..end],
					offset: self.base + open,
				},
				end,
			)));
		}
		Ok(self.match_tag_start(open))
	}

	fn match_tag_start(&self, open: usize) -> Option<(Capture<'s>, usize)> {
		let bytes = self.bytes();
		let mut index = open + 1;
		let closing = bytes.get(index) == Some(&b'/');
		if closing {
			index += 1;
		}

		let alias_start = index;
		index = scan_identifier(bytes, index, |byte| {
			byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.')
		})?;
		let alias_end = index;
		if bytes.get(index) != Some(&b':') {
			return None;
		}
		index += 1;

		let name_start = index;
		index = scan_identifier(bytes, index, |byte| {
			byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.')
		})?;
		let name_end = index;

		let terminates = match bytes.get(index) {
			Some(byte) if byte.is_ascii_whitespace() => true,
			Some(b'>') => true,
			Some(b'/') => !closing,
			_ => false,
		};
		if !terminates {
			return None;
		}

		Some((
			Capture::TagStart {
				alias: &self.text[alias_start..alias_end],
				name: &self.text[name_start..name_end],
				closing,
				raw: &self.text[open..name_end],
				offset: self.base + open,
			},
			name_end,
		))
	}

	/// Consume the attribute area of an opening tag up to and including `>`
	pub fn finish_open_tag(&mut self, tag_offset: usize) -> Result<TagBody<'s>, SequencingError> {
		let bytes = self.bytes();
		let start = self.pos;
		let mut depth = 0usize;
		let mut index = start;
		while index < bytes.len() {
			match bytes[index] {
				quote @ (b'\'' | b'"') => match self.skip_quoted(index, quote) {
					Some(end) => index = end,
					None => return Err(self.error(index, "unterminated quoted attribute value")),
				},
				b'{' => {
					depth += 1;
					index += 1;
				}
				b'}' => {
					depth = depth.saturating_sub(1);
					index += 1;
				}
				b'>' if depth == 0 => {
					let self_closing = index > start && bytes[index - 1] == b'/';
					let end = if self_closing { index - 1 } else { index };
					self.pos = index + 1;
					return Ok(TagBody {
						attributes: &self.text[start..end],
						attributes_offset: self.base + start,
						self_closing,
					});
				}
				_ => index += 1,
			}
		}
		Err(self
			.source
			.error(tag_offset, "unterminated tag, expected `>`"))
	}

	/// Consume the remainder of a closing tag
	pub fn finish_close_tag(&mut self, tag_offset: usize) -> Result<(), SequencingError> {
		let bytes = self.bytes();
		let mut index = self.pos;
		while bytes.get(index).is_some_and(u8::is_ascii_whitespace) {
			index += 1;
		}
		match bytes.get(index) {
			Some(b'>') => {
				self.pos = index + 1;
				Ok(())
			}
			Some(_) => Err(self.error(index, "malformed closing tag, expected `>`")),
			None => Err(self.source.error(tag_offset, "unterminated closing tag")),
		}
	}
}

fn scan_identifier(bytes: &[u8], start: usize, continues: impl Fn(u8) -> bool) -> Option<usize> {
	if !bytes.get(start).is_some_and(u8::is_ascii_alphabetic) {
		return None;
	}
	let length = bytes[start..]
		.iter()
		.take_while(|byte| continues(**byte))
		.count();
	Some(start + length)
}
