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

use crate::auth::Subject;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::card::CardType;

/// Identifies a card. A card is identified by the hash of its owner, its
/// type, and its item, so adding the same card twice yields the same ID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CardId {
    inner: blake3::Hash,
}

impl CardId {
    pub fn for_card(owner: &Subject, card_type: CardType, item: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(owner.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(card_type.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(item.as_bytes());
        Self {
            inner: hasher.finalize(),
        }
    }

    pub fn to_hex(self) -> String {
        self.inner.to_hex().to_string()
    }

    pub fn from_hex(s: &str) -> Fallible<Self> {
        let inner = blake3::Hash::from_hex(s)
            .map_err(|_| ErrorReport::new(format!("invalid card ID: {s}")))?;
        Ok(Self { inner })
    }
}

impl FromStr for CardId {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CardId::from_hex(s)
    }
}

impl ToSql for CardId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_hex()))
    }
}

impl FromSql for CardId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        CardId::from_hex(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for CardId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_card_same_id() {
        let alice = Subject::new("alice");
        let a = CardId::for_card(&alice, CardType::Vocab, "你好");
        let b = CardId::for_card(&alice, CardType::Vocab, "你好");
        assert_eq!(a, b);
    }

    #[test]
    fn test_id_depends_on_owner_and_type() {
        let alice = Subject::new("alice");
        let bob = Subject::new("bob");
        let a = CardId::for_card(&alice, CardType::Vocab, "好");
        assert_ne!(a, CardId::for_card(&bob, CardType::Vocab, "好"));
        assert_ne!(a, CardId::for_card(&alice, CardType::Hanzi, "好"));
    }

    #[test]
    fn test_hex_roundtrip() -> Fallible<()> {
        let id = CardId::for_card(&Subject::new("alice"), CardType::Sentence, "我是学生。");
        let parsed: CardId = id.to_hex().parse()?;
        assert_eq!(parsed, id);
        Ok(())
    }

    #[test]
    fn test_invalid_hex() {
        assert!(CardId::from_hex("not a hash").is_err());
    }
}
