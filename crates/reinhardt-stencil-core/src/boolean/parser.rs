//! Lexer and recursive-descent parser for conditions

use crate::node::Node;
use crate::value::{Value, parse_numeric};

use super::{BoolExpr, Comparator, TemplatePiece};

/// Malformed condition text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid condition: {0}")]
pub struct ConditionSyntaxError(pub String);

fn syntax_error<T>(message: impl Into<String>) -> Result<T, ConditionSyntaxError> {
	Err(ConditionSyntaxError(message.into()))
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Item {
	Char(char),
	Operand(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
	Open,
	Close,
	Not,
	And,
	Or,
	Compare(Comparator),
	Atom(BoolExpr),
}

fn is_operator_start(c: char) -> bool {
	matches!(c, '(' | ')' | '!' | '=' | '<' | '>' | '%' | '&' | '|' | '\'' | '"')
}

struct Lexer {
	items: Vec<Item>,
	index: usize,
}

impl Lexer {
	fn new(parts: Vec<Node>) -> (Self, Vec<Node>) {
		let mut items = Vec::new();
		let mut operands = Vec::new();
		for part in parts {
			match part {
				Node::Text(text) => items.extend(text.chars().map(Item::Char)),
				node => {
					items.push(Item::Operand(operands.len()));
					operands.push(node);
				}
			}
		}
		(Self { items, index: 0 }, operands)
	}

	fn peek_char(&self, offset: usize) -> Option<char> {
		match self.items.get(self.index + offset) {
			Some(Item::Char(c)) => Some(*c),
			_ => None,
		}
	}

	fn tokens(mut self) -> Result<Vec<Token>, ConditionSyntaxError> {
		let mut tokens = Vec::new();
		while let Some(item) = self.items.get(self.index).copied() {
			let token = match item {
				Item::Char(c) if c.is_whitespace() => {
					self.index += 1;
					continue;
				}
				Item::Char(quote @ ('\'' | '"')) => self.quoted(quote)?,
				Item::Char(c) if is_operator_start(c) => self.operator(c)?,
				_ => self.atom(),
			};
			tokens.push(token);
		}
		Ok(tokens)
	}

	fn operator(&mut self, c: char) -> Result<Token, ConditionSyntaxError> {
		let next = self.peek_char(1);
		let third = self.peek_char(2);
		let (token, width) = match (c, next, third) {
			('(', _, _) => (Token::Open, 1),
			(')', _, _) => (Token::Close, 1),
			('&', Some('&'), _) => (Token::And, 2),
			('|', Some('|'), _) => (Token::Or, 2),
			('=', Some('='), Some('=')) => (Token::Compare(Comparator::Identical), 3),
			('=', Some('='), _) => (Token::Compare(Comparator::Equal), 2),
			('!', Some('='), Some('=')) => (Token::Compare(Comparator::NotIdentical), 3),
			('!', Some('='), _) => (Token::Compare(Comparator::NotEqual), 2),
			('!', _, _) => (Token::Not, 1),
			('<', Some('='), _) => (Token::Compare(Comparator::LessOrEqual), 2),
			('<', _, _) => (Token::Compare(Comparator::Less), 1),
			('>', Some('='), _) => (Token::Compare(Comparator::GreaterOrEqual), 2),
			('>', _, _) => (Token::Compare(Comparator::Greater), 1),
			('%', _, _) => (Token::Compare(Comparator::Modulo), 1),
			(other, _, _) => return syntax_error(format!("unexpected `{}`", other)),
		};
		self.index += width;
		Ok(token)
	}

	fn quoted(&mut self, quote: char) -> Result<Token, ConditionSyntaxError> {
		self.index += 1;
		let mut pieces = Vec::new();
		let mut text = String::new();
		loop {
			match self.items.get(self.index).copied() {
				None => return syntax_error(format!("unterminated string, expected `{}`", quote)),
				Some(Item::Char(c)) if c == quote => {
					self.index += 1;
					break;
				}
				Some(Item::Char('\\')) if matches!(self.peek_char(1), Some(c) if c == quote || c == '\\') => {
					text.extend(self.peek_char(1));
					self.index += 2;
				}
				Some(Item::Char(c)) => {
					text.push(c);
					self.index += 1;
				}
				Some(Item::Operand(index)) => {
					if !text.is_empty() {
						pieces.push(TemplatePiece::Text(std::mem::take(&mut text)));
					}
					pieces.push(TemplatePiece::Operand(index));
					self.index += 1;
				}
			}
		}
		if pieces.is_empty() {
			return Ok(Token::Atom(BoolExpr::Literal(Value::String(text))));
		}
		if !text.is_empty() {
			pieces.push(TemplatePiece::Text(text));
		}
		Ok(Token::Atom(BoolExpr::Template(pieces)))
	}

	/// Bare word, operand, or both glued together
	fn atom(&mut self) -> Token {
		let mut pieces = Vec::new();
		let mut word = String::new();
		while let Some(item) = self.items.get(self.index).copied() {
			match item {
				Item::Char(c) if c.is_whitespace() || is_operator_start(c) => break,
				Item::Char(c) => word.push(c),
				Item::Operand(index) => {
					if !word.is_empty() {
						pieces.push(TemplatePiece::Text(std::mem::take(&mut word)));
					}
					pieces.push(TemplatePiece::Operand(index));
				}
			}
			self.index += 1;
		}

		match pieces.as_slice() {
			[] => word_token(word),
			[TemplatePiece::Operand(index)] if word.is_empty() => {
				Token::Atom(BoolExpr::Operand(*index))
			}
			_ => {
				if !word.is_empty() {
					pieces.push(TemplatePiece::Text(word));
				}
				Token::Atom(BoolExpr::Template(pieces))
			}
		}
	}
}

fn word_token(word: String) -> Token {
	let lowered = word.to_ascii_lowercase();
	let literal = match lowered.as_str() {
		"and" => return Token::And,
		"or" => return Token::Or,
		"true" => Value::Bool(true),
		"false" => Value::Bool(false),
		"null" => Value::Null,
		_ => match word.parse::<i64>() {
			Ok(integer) => Value::Int(integer),
			Err(_) => parse_numeric(&word)
				.map(Value::Float)
				.unwrap_or(Value::String(word)),
		},
	};
	Token::Atom(BoolExpr::Literal(literal))
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
	tokens: Vec<Token>,
	index: usize,
}

impl Parser {
	fn next_if(&mut self, expected: &Token) -> bool {
		if self.tokens.get(self.index) == Some(expected) {
			self.index += 1;
			true
		} else {
			false
		}
	}

	fn or(&mut self) -> Result<BoolExpr, ConditionSyntaxError> {
		let mut left = self.and()?;
		while self.next_if(&Token::Or) {
			let right = self.and()?;
			left = BoolExpr::Or(Box::new(left), Box::new(right));
		}
		Ok(left)
	}

	fn and(&mut self) -> Result<BoolExpr, ConditionSyntaxError> {
		let mut left = self.comparison()?;
		while self.next_if(&Token::And) {
			let right = self.comparison()?;
			left = BoolExpr::And(Box::new(left), Box::new(right));
		}
		Ok(left)
	}

	fn comparison(&mut self) -> Result<BoolExpr, ConditionSyntaxError> {
		let mut left = self.unary()?;
		while let Some(Token::Compare(comparator)) = self.tokens.get(self.index) {
			let comparator = *comparator;
			self.index += 1;
			let right = self.unary()?;
			left = BoolExpr::Compare(comparator, Box::new(left), Box::new(right));
		}
		Ok(left)
	}

	fn unary(&mut self) -> Result<BoolExpr, ConditionSyntaxError> {
		if self.next_if(&Token::Not) {
			return Ok(BoolExpr::Not(Box::new(self.unary()?)));
		}
		self.primary()
	}

	fn primary(&mut self) -> Result<BoolExpr, ConditionSyntaxError> {
		let Some(token) = self.tokens.get(self.index).cloned() else {
			return syntax_error("unexpected end of condition");
		};
		self.index += 1;
		match token {
			Token::Open => {
				let inner = self.or()?;
				if !self.next_if(&Token::Close) {
					return syntax_error("expected `)`");
				}
				Ok(inner)
			}
			Token::Atom(expression) => Ok(expression),
			Token::Close => syntax_error("unexpected `)`"),
			Token::Compare(comparator) => {
				syntax_error(format!("unexpected `{}`", comparator.symbol()))
			}
			Token::And | Token::Or | Token::Not => syntax_error("unexpected logical operator"),
		}
	}
}

/// Parse condition parts into an expression and its operand nodes
pub(super) fn parse(parts: Vec<Node>) -> Result<(BoolExpr, Vec<Node>), ConditionSyntaxError> {
	let (lexer, operands) = Lexer::new(parts);
	let tokens = lexer.tokens()?;
	if tokens.is_empty() {
		return Ok((BoolExpr::Literal(Value::Bool(false)), operands));
	}

	let mut parser = Parser { tokens, index: 0 };
	let expression = parser.or()?;
	if parser.index < parser.tokens.len() {
		return syntax_error("unexpected trailing input");
	}
	Ok((expression, operands))
}
