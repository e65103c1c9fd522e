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

use crate::auth::AuthContext;
use crate::auth::require_subject;
use crate::db::Database;
use crate::error::Fallible;
use crate::query::card::CardSchema;
use crate::query::compile::compile;
use crate::query::parser::parse;
use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

/// Search the subject's cards. A blank query finds nothing.
pub fn search_cards(
    auth: &impl AuthContext,
    db: &Database,
    query: &str,
    now: Timestamp,
    limit: usize,
) -> Fallible<Vec<Card>> {
    let subject = require_subject(auth)?;
    let Some(tree) = parse(query)? else {
        return Ok(Vec::new());
    };
    log::debug!("Parsed query: {tree}");
    let predicate = compile(&tree, &CardSchema { now });
    let mut cards = Vec::new();
    for card_id in db.search(subject, &predicate, limit)? {
        if let Some(card) = db.get_card(subject, card_id)? {
            cards.push(card);
        }
    }
    Ok(cards)
}
