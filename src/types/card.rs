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

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;
use crate::types::card_id::CardId;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    /// A single character.
    Hanzi,
    /// A word.
    Vocab,
    /// A sentence.
    Sentence,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Hanzi => "hanzi",
            CardType::Vocab => "vocab",
            CardType::Sentence => "sentence",
        }
    }
}

impl FromStr for CardType {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hanzi" => Ok(CardType::Hanzi),
            "vocab" => Ok(CardType::Vocab),
            "sentence" => Ok(CardType::Sentence),
            _ => fail(format!("Invalid card type: {s}")),
        }
    }
}

impl Display for CardType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for CardType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CardType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        string
            .parse()
            .map_err(|e: ErrorReport| FromSqlError::Other(Box::new(e)))
    }
}

/// A card, as owned by the card store. Scheduling state lives separately, in
/// the card's quiz record.
#[derive(Clone, Debug, Serialize)]
pub struct Card {
    pub id: CardId,
    pub card_type: CardType,
    pub item: String,
    pub english: Option<String>,
    pub tags: Vec<String>,
}
