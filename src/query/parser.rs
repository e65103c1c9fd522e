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

use crate::query::ast::Node;
use crate::query::lexer::ParseError;
use crate::query::lexer::ParseErrorKind;
use crate::query::lexer::Token;
use crate::query::lexer::tokenize;

/// Parse a query into a condition tree.
///
/// Terms separated by whitespace must all hold. Terms joined by the `OR`
/// keyword form a group of which any may hold:
///
/// ```text
/// tag:hsk3 你 OR 好 -level:0   =>   tag:hsk3 AND (你 OR 好) AND NOT level:0
/// ```
///
/// Returns `None` for a blank query. A single term is returned as is,
/// without a wrapping `And`.
pub fn parse(query: &str) -> Result<Option<Node>, ParseError> {
    let tokens = tokenize(query)?;

    let mut children: Vec<Node> = Vec::new();
    // The position of an `OR` still waiting for its right-hand term.
    let mut pending_or: Option<usize> = None;

    for spanned in tokens {
        match spanned.token {
            Token::Or => {
                if children.is_empty() || pending_or.is_some() {
                    return Err(dangling_or(spanned.position));
                }
                pending_or = Some(spanned.position);
            }
            Token::Term(term) => {
                let node = Node::Term(term);
                if pending_or.take().is_some() {
                    match children.pop() {
                        Some(Node::Or(mut alternatives)) => {
                            alternatives.push(node);
                            children.push(Node::Or(alternatives));
                        }
                        Some(previous) => children.push(Node::Or(vec![previous, node])),
                        None => unreachable!("an OR always follows a term"),
                    }
                } else {
                    children.push(node);
                }
            }
        }
    }

    if let Some(position) = pending_or {
        return Err(dangling_or(position));
    }

    Ok(match children.len() {
        0 => None,
        1 => children.pop(),
        _ => Some(Node::And(children)),
    })
}

fn dangling_or(position: usize) -> ParseError {
    ParseError {
        kind: ParseErrorKind::DanglingOr,
        position,
        token: "OR".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::Operator;
    use crate::query::ast::Term;

    fn term(t: Term) -> Node {
        Node::Term(t)
    }

    #[test]
    fn test_blank_queries() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   "), Ok(None));
        assert_eq!(parse("\n\t"), Ok(None));
    }

    #[test]
    fn test_single_term_is_the_root() {
        assert_eq!(parse("  hello "), Ok(Some(term(Term::bare("hello")))));
    }

    #[test]
    fn test_terms_are_anded() {
        assert_eq!(
            parse("tag:hsk3 -level:1"),
            Ok(Some(Node::And(vec![
                term(Term::fielded("tag", Operator::Matches, "hsk3")),
                term(Term::fielded("level", Operator::Matches, "1").negate()),
            ])))
        );
    }

    #[test]
    fn test_or_groups_nest_inside_and() {
        assert_eq!(
            parse("tag:hsk3 你 OR 好 OR hello level<2"),
            Ok(Some(Node::And(vec![
                term(Term::fielded("tag", Operator::Matches, "hsk3")),
                Node::Or(vec![
                    term(Term::bare("你")),
                    term(Term::bare("好")),
                    term(Term::bare("hello")),
                ]),
                term(Term::fielded("level", Operator::Less, "2")),
            ])))
        );
    }

    #[test]
    fn test_lone_or_group_is_the_root() {
        assert_eq!(
            parse("a OR b"),
            Ok(Some(Node::Or(vec![term(Term::bare("a")), term(Term::bare("b"))])))
        );
    }

    #[test]
    fn test_adjacent_or_groups_stay_separate() {
        assert_eq!(
            parse("a OR b c OR d"),
            Ok(Some(Node::And(vec![
                Node::Or(vec![term(Term::bare("a")), term(Term::bare("b"))]),
                Node::Or(vec![term(Term::bare("c")), term(Term::bare("d"))]),
            ])))
        );
    }

    #[test]
    fn test_dangling_or() {
        for (query, position) in [("OR a", 0), ("a OR", 2), ("a OR OR b", 5)] {
            assert_eq!(
                parse(query),
                Err(ParseError {
                    kind: ParseErrorKind::DanglingOr,
                    position,
                    token: "OR".to_string(),
                }),
                "{query}"
            );
        }
    }

    #[test]
    fn test_no_partial_recovery() {
        assert_eq!(
            parse("tag:hsk3 \"oops").unwrap_err().kind,
            ParseErrorKind::UnterminatedQuote
        );
    }

    #[test]
    fn test_canonical_forms_reparse_to_the_same_tree() {
        for query in [
            "hello",
            "-tag:hsk3",
            "level>=3 english:\"to be\"",
            "\"good morning\" -\"tag:x\"",
            "a OR b -c OR level<=2 is:due",
            "\"OR\" \"-1\" entry=学习",
        ] {
            let tree = parse(query).unwrap().unwrap();
            let printed = tree.to_string();
            assert_eq!(printed, query);
            assert_eq!(parse(&printed), Ok(Some(tree)));
        }
    }
}
