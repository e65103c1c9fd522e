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

//! Searching cards: the card fields and their SQL.
//!
//! Fragments are written against `cards c left outer join quiz q`, so they
//! can refer to both the card and its quiz record. A card that was never
//! reviewed has no quiz record; it counts as level zero and due. Every
//! fragment evaluates to true or false, never null, so negation is exact.

use rusqlite::types::Value;

use crate::query::ast::Operator;
use crate::query::compile::Predicate;
use crate::query::compile::Schema;
use crate::types::card::CardType;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CardField {
    Entry,
    English,
    Tag,
    Type,
    Level,
    Is,
    Right,
    Wrong,
}

/// A piece of SQL with its parameters, in order.
#[derive(Clone, PartialEq, Debug)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlFragment {
    fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

pub struct CardSchema {
    /// The time `is:due` is evaluated at.
    pub now: Timestamp,
}

const DEFAULT_FIELDS: [CardField; 2] = [CardField::Entry, CardField::English];

impl Schema for CardSchema {
    type Field = CardField;
    type Atom = SqlFragment;

    fn field(&self, name: &str) -> Option<CardField> {
        match name {
            "entry" => Some(CardField::Entry),
            "english" => Some(CardField::English),
            "tag" => Some(CardField::Tag),
            "type" => Some(CardField::Type),
            "level" | "srsLevel" => Some(CardField::Level),
            "is" => Some(CardField::Is),
            "right" => Some(CardField::Right),
            "wrong" => Some(CardField::Wrong),
            _ => None,
        }
    }

    fn default_fields(&self) -> &[CardField] {
        &DEFAULT_FIELDS
    }

    fn compile_term(
        &self,
        field: CardField,
        operator: Operator,
        value: &str,
    ) -> Option<SqlFragment> {
        let text = || Value::Text(value.to_string());
        match (field, operator) {
            (CardField::Entry, Operator::Matches) => Some(SqlFragment::new(
                r"c.item like ? escape '\'",
                vec![contains(value)],
            )),
            (CardField::Entry, Operator::Equals) => {
                Some(SqlFragment::new("c.item = ?", vec![text()]))
            }
            (CardField::English, Operator::Matches) => Some(SqlFragment::new(
                r"coalesce(c.english, '') like ? escape '\'",
                vec![contains(value)],
            )),
            (CardField::English, Operator::Equals) => {
                Some(SqlFragment::new("coalesce(c.english, '') = ?", vec![text()]))
            }
            (CardField::Tag, Operator::Matches | Operator::Equals) => Some(SqlFragment::new(
                "exists (select 1 from card_tags t where t.card_id = c.card_id and t.tag = ?)",
                vec![text()],
            )),
            (CardField::Type, Operator::Matches | Operator::Equals) => {
                let card_type: CardType = value.parse().ok()?;
                Some(SqlFragment::new(
                    "c.card_type = ?",
                    vec![Value::Text(card_type.as_str().to_string())],
                ))
            }
            (CardField::Is, Operator::Matches | Operator::Equals) => match value {
                "due" => Some(SqlFragment::new(
                    "(q.card_id is null or q.next_review <= ?)",
                    vec![Value::Text(self.now.to_string())],
                )),
                "new" => Some(SqlFragment::new("q.card_id is null", Vec::new())),
                _ => None,
            },
            (CardField::Level, _) => compare("coalesce(q.srs_level, 0)", operator, value),
            (CardField::Right, _) => compare(
                "coalesce(json_extract(q.stat, '$.streak.right'), 0)",
                operator,
                value,
            ),
            (CardField::Wrong, _) => compare(
                "coalesce(json_extract(q.stat, '$.streak.wrong'), 0)",
                operator,
                value,
            ),
            (
                CardField::Entry
                | CardField::English
                | CardField::Tag
                | CardField::Type
                | CardField::Is,
                _,
            ) => None,
        }
    }
}

/// A `like` pattern matching any text containing `value`.
fn contains(value: &str) -> Value {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Value::Text(pattern)
}

fn compare(column: &str, operator: Operator, value: &str) -> Option<SqlFragment> {
    let number: i64 = value.parse().ok()?;
    let symbol = match operator {
        Operator::Matches | Operator::Equals => "=",
        other => other.symbol(),
    };
    Some(SqlFragment::new(
        format!("{column} {symbol} ?"),
        vec![Value::Integer(number)],
    ))
}

impl Predicate<SqlFragment> {
    /// Render as an SQL boolean expression and its parameters.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.write_sql(&mut sql, &mut params);
        (sql, params)
    }

    fn write_sql(&self, sql: &mut String, params: &mut Vec<Value>) {
        let (children, separator) = match self {
            Predicate::Atom(fragment) => {
                sql.push('(');
                sql.push_str(&fragment.sql);
                sql.push(')');
                params.extend(fragment.params.iter().cloned());
                return;
            }
            Predicate::Not(inner) => {
                sql.push_str("not ");
                inner.write_sql(sql, params);
                return;
            }
            Predicate::Nothing => {
                sql.push_str("(0)");
                return;
            }
            Predicate::All(children) => (children, " and "),
            Predicate::Any(children) => (children, " or "),
        };
        sql.push('(');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                sql.push_str(separator);
            }
            child.write_sql(sql, params);
        }
        sql.push(')');
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::query::compile::compile;
    use crate::query::parser::parse;

    fn schema() -> CardSchema {
        CardSchema {
            now: Timestamp::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
        }
    }

    fn sql(query: &str) -> (String, Vec<Value>) {
        compile(&parse(query).unwrap().unwrap(), &schema()).to_sql()
    }

    #[test]
    fn test_bare_term() {
        let (sql, params) = sql("hello");
        assert_eq!(
            sql,
            r"((c.item like ? escape '\') or (coalesce(c.english, '') like ? escape '\'))"
        );
        assert_eq!(
            params,
            vec![
                Value::Text("%hello%".to_string()),
                Value::Text("%hello%".to_string())
            ]
        );
    }

    #[test]
    fn test_tag_and_negated_level() {
        let (sql, params) = sql("tag:hsk3 -level:1");
        assert_eq!(
            sql,
            "((exists (select 1 from card_tags t where t.card_id = c.card_id and t.tag = ?)) and not (coalesce(q.srs_level, 0) = ?))"
        );
        assert_eq!(
            params,
            vec![Value::Text("hsk3".to_string()), Value::Integer(1)]
        );
    }

    #[test]
    fn test_comparisons() {
        let (sql, params) = sql("level>=2 right<3");
        assert_eq!(
            sql,
            "((coalesce(q.srs_level, 0) >= ?) and (coalesce(json_extract(q.stat, '$.streak.right'), 0) < ?))"
        );
        assert_eq!(params, vec![Value::Integer(2), Value::Integer(3)]);
    }

    #[test]
    fn test_is_due() {
        let (sql, params) = sql("is:due");
        assert_eq!(sql, "((q.card_id is null or q.next_review <= ?))");
        assert_eq!(
            params,
            vec![Value::Text("2024-06-01T00:00:00.000Z".to_string())]
        );
    }

    #[test]
    fn test_like_escaping() {
        let (_, params) = sql("english:100%_off");
        assert_eq!(params, vec![Value::Text(r"%100\%\_off%".to_string())]);
    }

    #[test]
    fn test_vacuous_filters() {
        assert_eq!(sql("is:hard"), ("(0)".to_string(), Vec::new()));
        assert_eq!(sql("type:radical"), ("(0)".to_string(), Vec::new()));
        assert_eq!(sql("level:high"), ("(0)".to_string(), Vec::new()));
        assert_eq!(sql("tag>3"), ("(0)".to_string(), Vec::new()));
        assert_eq!(sql("-pinyin:ni3"), ("not (0)".to_string(), Vec::new()));
    }

    #[test]
    fn test_srs_level_alias() {
        assert_eq!(sql("srsLevel:3"), sql("level:3"));
    }
}
