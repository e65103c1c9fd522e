// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Splits a query string into terms and `OR` keywords.
//!
//! Positions are byte offsets into the input.

use std::fmt::Display;
use std::fmt::Formatter;

use crate::error::ErrorReport;
use crate::query::ast::Operator;
use crate::query::ast::Term;
use crate::query::ast::is_identifier_char;
use crate::query::ast::is_identifier_start;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParseErrorKind {
    /// A quoted literal with no closing quote.
    UnterminatedQuote,
    /// An operator with nothing after it.
    MissingValue,
    /// A `-` with no term after it.
    DanglingNegation,
    /// An `OR` without a term on both sides.
    DanglingOr,
    /// A closing quote followed by something other than whitespace.
    TextAfterQuote,
}

impl Display for ParseErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            ParseErrorKind::UnterminatedQuote => "unterminated quote",
            ParseErrorKind::MissingValue => "operator without a value",
            ParseErrorKind::DanglingNegation => "'-' without a term",
            ParseErrorKind::DanglingOr => "'OR' without a term on both sides",
            ParseErrorKind::TextAfterQuote => "text directly after a closing quote",
        };
        write!(f, "{message}")
    }
}

/// A malformed query.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Where the offending token starts.
    pub position: usize,
    /// The offending token.
    pub token: String,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at position {}: {}",
            self.kind, self.position, self.token
        )
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for ErrorReport {
    fn from(value: ParseError) -> Self {
        ErrorReport::new(format!("invalid query: {value}"))
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    Term(Term),
    Or,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_boundary(&self) -> bool {
        self.peek().is_none_or(char::is_whitespace)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consume a run of characters up to the next whitespace.
    fn run(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Consume a quoted literal. The cursor is on the opening quote. The
    /// closing quote must end the term.
    fn quoted(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let body = &self.input[start + 1..];
        match body.find('"') {
            Some(end) => {
                self.pos = start + 1 + end + 1;
                if !self.at_boundary() {
                    self.run();
                    return Err(ParseError {
                        kind: ParseErrorKind::TextAfterQuote,
                        position: start,
                        token: self.input[start..self.pos].to_string(),
                    });
                }
                Ok(&body[..end])
            }
            None => Err(ParseError {
                kind: ParseErrorKind::UnterminatedQuote,
                position: start,
                token: self.input[start..].to_string(),
            }),
        }
    }

    /// Consume an identifier followed directly by an operator, if there is
    /// one here. Otherwise leave the cursor where it was.
    fn field(&mut self) -> Option<(&'a str, Operator)> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if is_identifier_start(c) => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, c)| !is_identifier_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let operator = Operator::at_start_of(&rest[end..])?;
        self.pos += end + operator.symbol().len();
        Some((&rest[..end], operator))
    }

    fn value(&mut self) -> Result<&'a str, ParseError> {
        if self.peek() == Some('"') {
            self.quoted()
        } else {
            Ok(self.run())
        }
    }

    fn next_token(&mut self) -> Result<Option<Spanned>, ParseError> {
        self.skip_whitespace();
        let position = self.pos;
        if self.peek().is_none() {
            return Ok(None);
        }

        let mut negated = false;
        while self.peek() == Some('-') {
            negated = !negated;
            self.pos += 1;
        }
        if self.pos > position && self.at_boundary() {
            return Err(ParseError {
                kind: ParseErrorKind::DanglingNegation,
                position,
                token: self.input[position..self.pos].to_string(),
            });
        }
        let negation_len = self.pos - position;

        let term = if self.peek() == Some('"') {
            Term::bare(self.quoted()?)
        } else if let Some((field, operator)) = self.field() {
            if self.at_boundary() {
                return Err(ParseError {
                    kind: ParseErrorKind::MissingValue,
                    position,
                    token: self.input[position..self.pos].to_string(),
                });
            }
            Term::fielded(field, operator, self.value()?)
        } else {
            let word = self.run();
            if word == "OR" && negation_len == 0 {
                return Ok(Some(Spanned {
                    token: Token::Or,
                    position,
                }));
            }
            Term::bare(word)
        };

        let term = if negated { term.negate() } else { term };
        Ok(Some(Spanned {
            token: Token::Term(term),
            position,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_empty() {
        assert!(terms("").is_empty());
        assert!(terms("  \t ").is_empty());
    }

    #[test]
    fn test_bare_terms() {
        assert_eq!(
            terms("你好  world"),
            vec![
                Token::Term(Term::bare("你好")),
                Token::Term(Term::bare("world"))
            ]
        );
    }

    #[test]
    fn test_field_terms() {
        assert_eq!(
            terms("tag:hsk3 level>=2 english=\"to be\""),
            vec![
                Token::Term(Term::fielded("tag", Operator::Matches, "hsk3")),
                Token::Term(Term::fielded("level", Operator::GreaterOrEqual, "2")),
                Token::Term(Term::fielded("english", Operator::Equals, "to be")),
            ]
        );
    }

    #[test]
    fn test_value_keeps_later_operators() {
        assert_eq!(
            terms("entry:a:b"),
            vec![Token::Term(Term::fielded("entry", Operator::Matches, "a:b"))]
        );
    }

    #[test]
    fn test_quoted_literal_is_verbatim() {
        assert_eq!(
            terms("\"tag:x  -y\""),
            vec![Token::Term(Term::bare("tag:x  -y"))]
        );
    }

    #[test]
    fn test_negation() {
        assert_eq!(
            terms("-level:1 --keep -\"a b\""),
            vec![
                Token::Term(Term::fielded("level", Operator::Matches, "1").negate()),
                Token::Term(Term::bare("keep")),
                Token::Term(Term::bare("a b").negate()),
            ]
        );
    }

    #[test]
    fn test_or_keyword() {
        let tokens = tokenize("a OR b or -OR").unwrap();
        assert_eq!(tokens[1], Spanned { token: Token::Or, position: 2 });
        assert_eq!(tokens[3].token, Token::Term(Term::bare("or")));
        assert_eq!(tokens[4].token, Token::Term(Term::bare("OR").negate()));
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let tokens = tokenize("学习 tag:x").unwrap();
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].position, "学习 ".len());
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            tokenize("hello \"good bye"),
            Err(ParseError {
                kind: ParseErrorKind::UnterminatedQuote,
                position: 6,
                token: "\"good bye".to_string(),
            })
        );
        assert_eq!(
            tokenize("english:\"x").unwrap_err().kind,
            ParseErrorKind::UnterminatedQuote
        );
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(
            tokenize("a -tag: b"),
            Err(ParseError {
                kind: ParseErrorKind::MissingValue,
                position: 2,
                token: "-tag:".to_string(),
            })
        );
        assert_eq!(
            tokenize("level<=").unwrap_err().kind,
            ParseErrorKind::MissingValue
        );
    }

    #[test]
    fn test_text_after_quote() {
        assert_eq!(
            tokenize("\"a\"b"),
            Err(ParseError {
                kind: ParseErrorKind::TextAfterQuote,
                position: 0,
                token: "\"a\"b".to_string(),
            })
        );
        assert_eq!(
            tokenize("x english:\"to be\"x y"),
            Err(ParseError {
                kind: ParseErrorKind::TextAfterQuote,
                position: 10,
                token: "\"to be\"x".to_string(),
            })
        );
        assert!(tokenize("\"a\" \"b\"").is_ok());
        assert!(tokenize("-\"a\"").is_ok());
    }

    #[test]
    fn test_dangling_negation() {
        assert_eq!(
            tokenize("a - b"),
            Err(ParseError {
                kind: ParseErrorKind::DanglingNegation,
                position: 2,
                token: "-".to_string(),
            })
        );
    }

    #[test]
    fn test_error_message() {
        let err = tokenize("x \"y").unwrap_err();
        let report: ErrorReport = err.into();
        assert_eq!(
            report.message(),
            "invalid query: unterminated quote at position 2: \"y"
        );
    }
}
