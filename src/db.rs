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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::auth::Subject;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::query::card::SqlFragment;
use crate::query::compile::Predicate;
use crate::review::QuizStore;
use crate::types::card::Card;
use crate::types::card::CardType;
use crate::types::card_id::CardId;
use crate::types::quiz::QuizRecord;
use crate::types::quiz::Stat;
use crate::types::timestamp::Timestamp;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// A card to add.
pub struct NewCard<'a> {
    pub card_type: CardType,
    pub item: &'a str,
    pub english: Option<&'a str>,
    pub tags: &'a [String],
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema in {database_path}");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Add a card, or, if the owner already has it, add the new tags to it
    /// and update its English if one is given.
    pub fn add_card(&self, owner: &Subject, card: NewCard<'_>, now: Timestamp) -> Fallible<Card> {
        let card_id = CardId::for_card(owner, card.card_type, card.item);
        log::debug!("Adding card {card_id}: {}", card.item);
        {
            let mut conn = self.acquire();
            let tx = conn.transaction()?;
            upsert_card(&tx, card_id, owner, &card, now)?;
            for tag in card.tags {
                insert_tag(&tx, card_id, tag)?;
            }
            tx.commit()?;
        }
        self.get_card(owner, card_id)?
            .ok_or_else(|| ErrorReport::new(format!("card {card_id} vanished after insert")))
    }

    /// Find one of the owner's cards.
    pub fn get_card(&self, owner: &Subject, card_id: CardId) -> Fallible<Option<Card>> {
        let conn = self.acquire();
        let sql = "select card_type, item, english from cards where card_id = ? and user_id = ?;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query((card_id, owner.as_str()))?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let card_type: CardType = row.get(0)?;
        let item: String = row.get(1)?;
        let english: Option<String> = row.get(2)?;

        let mut tags = Vec::new();
        let mut stmt = conn.prepare("select tag from card_tags where card_id = ? order by tag;")?;
        let mut rows = stmt.query([card_id])?;
        while let Some(row) = rows.next()? {
            tags.push(row.get(0)?);
        }
        Ok(Some(Card {
            id: card_id,
            card_type,
            item,
            english,
            tags,
        }))
    }

    pub fn card_count(&self, owner: &Subject) -> Fallible<usize> {
        let conn = self.acquire();
        let sql = "select count(*) from cards where user_id = ?;";
        let count: i64 = conn.query_row(sql, [owner.as_str()], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// The IDs of the owner's cards matching the predicate, oldest first.
    pub fn search(
        &self,
        owner: &Subject,
        predicate: &Predicate<SqlFragment>,
        limit: usize,
    ) -> Fallible<Vec<CardId>> {
        let (condition, condition_params) = predicate.to_sql();
        let sql = format!(
            "select c.card_id from cards c left outer join quiz q on q.card_id = c.card_id where c.user_id = ? and {condition} order by c.rowid limit ?;"
        );
        log::debug!("Search: {sql}");
        let mut params = Vec::with_capacity(condition_params.len() + 2);
        params.push(Value::Text(owner.as_str().to_string()));
        params.extend(condition_params);
        params.push(Value::Integer(limit as i64));

        let conn = self.acquire();
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }

    /// Pick, at random, one of the owner's cards that was never reviewed,
    /// optionally of a given type.
    pub fn random_new_card(
        &self,
        owner: &Subject,
        card_type: Option<CardType>,
    ) -> Fallible<Option<Card>> {
        let card_id: Option<CardId> = {
            let conn = self.acquire();
            let sql = "select c.card_id from cards c where c.user_id = ?1 and (?2 is null or c.card_type = ?2) and not exists (select 1 from quiz q where q.card_id = c.card_id) order by random() limit 1;";
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query((owner.as_str(), card_type))?;
            match rows.next()? {
                Some(row) => Some(row.get(0)?),
                None => None,
            }
        };
        match card_id {
            Some(card_id) => self.get_card(owner, card_id),
            None => Ok(None),
        }
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

impl QuizStore for Database {
    fn load(&self, owner: &Subject, card_id: CardId) -> Fallible<Option<QuizRecord>> {
        let conn = self.acquire();
        let sql = "select q.srs_level, q.next_review, q.stat from quiz q join cards c on c.card_id = q.card_id where q.card_id = ? and c.user_id = ?;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query((card_id, owner.as_str()))?;
        if let Some(row) = rows.next()? {
            let srs_level: i64 = row.get(0)?;
            let next_review: Timestamp = row.get(1)?;
            let stat: String = row.get(2)?;
            let stat: Stat = serde_json::from_str(&stat)?;
            Ok(Some(QuizRecord {
                card_id,
                srs_level: srs_level.max(0) as usize,
                next_review,
                stat,
            }))
        } else {
            Ok(None)
        }
    }

    fn save(&self, owner: &Subject, record: &QuizRecord) -> Fallible<()> {
        let stat = serde_json::to_string(&record.stat)?;
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        if !probe_card_owned(&tx, owner, record.card_id)? {
            return fail(format!("no such card: {}", record.card_id));
        }
        let sql = "insert into quiz (card_id, srs_level, next_review, stat) values (?, ?, ?, ?) on conflict (card_id) do update set srs_level = excluded.srs_level, next_review = excluded.next_review, stat = excluded.stat;";
        tx.execute(
            sql,
            (
                record.card_id,
                record.srs_level as i64,
                record.next_review,
                stat,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn upsert_card(
    tx: &Transaction,
    card_id: CardId,
    owner: &Subject,
    card: &NewCard<'_>,
    now: Timestamp,
) -> Fallible<()> {
    let sql = "insert into cards (card_id, user_id, card_type, item, english, created_at) values (?, ?, ?, ?, ?, ?) on conflict (card_id) do update set english = coalesce(excluded.english, cards.english);";
    tx.execute(
        sql,
        (
            card_id,
            owner.as_str(),
            card.card_type,
            card.item,
            card.english,
            now,
        ),
    )?;
    Ok(())
}

fn insert_tag(tx: &Transaction, card_id: CardId, tag: &str) -> Fallible<()> {
    let sql = "insert into card_tags (card_id, tag) values (?, ?) on conflict do nothing;";
    tx.execute(sql, (card_id, tag))?;
    Ok(())
}

fn probe_card_owned(tx: &Transaction, owner: &Subject, card_id: CardId) -> Fallible<bool> {
    let sql = "select count(*) from cards where card_id = ? and user_id = ?;";
    let count: i64 = tx.query_row(sql, (card_id, owner.as_str()), |row| row.get(0))?;
    Ok(count > 0)
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}
