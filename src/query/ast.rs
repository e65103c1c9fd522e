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

//! The condition tree produced by the parser.

use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Operator {
    /// `:`, matches or contains.
    Matches,
    /// `=`
    Equals,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
}

impl Operator {
    /// Every operator, longer symbols before their prefixes.
    pub const ALL: [Operator; 6] = [
        Operator::LessOrEqual,
        Operator::GreaterOrEqual,
        Operator::Matches,
        Operator::Equals,
        Operator::Less,
        Operator::Greater,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Matches => ":",
            Operator::Equals => "=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
        }
    }

    /// The operator whose symbol starts `s`, preferring the longest.
    pub fn at_start_of(s: &str) -> Option<Operator> {
        Self::ALL.into_iter().find(|op| s.starts_with(op.symbol()))
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single filter. A term without a field is matched against the default
/// fields of whatever is being searched.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Term {
    pub field: Option<String>,
    pub operator: Operator,
    pub value: String,
    pub negated: bool,
}

impl Term {
    pub fn bare(value: impl Into<String>) -> Self {
        Self {
            field: None,
            operator: Operator::Matches,
            value: value.into(),
            negated: false,
        }
    }

    pub fn fielded(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            operator,
            value: value.into(),
            negated: false,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Node {
    Term(Term),
    /// All children hold. Never empty.
    And(Vec<Node>),
    /// Any child holds. Never empty.
    Or(Vec<Node>),
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Would this text lex as a field term?
fn looks_fielded(s: &str) -> bool {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if is_identifier_start(c) => {}
        _ => return false,
    }
    let end = chars
        .find(|(_, c)| !is_identifier_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    Operator::at_start_of(&s[end..]).is_some()
}

fn needs_quotes(value: &str, fielded: bool) -> bool {
    value.is_empty()
        || value.starts_with('"')
        || value.chars().any(char::is_whitespace)
        || (!fielded && (value.starts_with('-') || value == "OR" || looks_fielded(value)))
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "-")?;
        }
        if let Some(field) = &self.field {
            write!(f, "{field}{}", self.operator)?;
        }
        if needs_quotes(&self.value, self.field.is_some()) {
            write!(f, "\"{}\"", self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (children, separator) = match self {
            Node::Term(term) => return write!(f, "{term}"),
            Node::And(children) => (children, " "),
            Node::Or(children) => (children, " OR "),
        };
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                write!(f, "{separator}")?;
            }
            write!(f, "{child}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(Operator::at_start_of("<=3"), Some(Operator::LessOrEqual));
        assert_eq!(Operator::at_start_of("<3"), Some(Operator::Less));
        assert_eq!(Operator::at_start_of(">=3"), Some(Operator::GreaterOrEqual));
        assert_eq!(Operator::at_start_of("3"), None);
    }

    #[test]
    fn test_display_term() {
        assert_eq!(Term::bare("你好").to_string(), "你好");
        assert_eq!(
            Term::fielded("level", Operator::GreaterOrEqual, "3").to_string(),
            "level>=3"
        );
        assert_eq!(
            Term::fielded("tag", Operator::Matches, "hsk3").negate().to_string(),
            "-tag:hsk3"
        );
    }

    #[test]
    fn test_display_quotes_when_needed() {
        assert_eq!(Term::bare("good morning").to_string(), "\"good morning\"");
        assert_eq!(Term::bare("OR").to_string(), "\"OR\"");
        assert_eq!(Term::bare("-1").to_string(), "\"-1\"");
        assert_eq!(Term::bare("tag:x").to_string(), "\"tag:x\"");
        assert_eq!(Term::bare("").to_string(), "\"\"");
        assert_eq!(
            Term::fielded("english", Operator::Matches, "to be").to_string(),
            "english:\"to be\""
        );
        assert_eq!(
            Term::fielded("level", Operator::Equals, "-1").to_string(),
            "level=-1"
        );
    }

    #[test]
    fn test_display_node() {
        let node = Node::And(vec![
            Node::Term(Term::bare("a")),
            Node::Or(vec![Node::Term(Term::bare("b")), Node::Term(Term::bare("c"))]),
        ]);
        assert_eq!(node.to_string(), "a b OR c");
    }
}
