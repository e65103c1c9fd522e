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

//! Recording reviews: the quiz record store and the mark operation.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::TimeDelta;

use crate::auth::AuthContext;
use crate::auth::Subject;
use crate::auth::require_subject;
use crate::error::Fallible;
use crate::srs::LevelTable;
use crate::types::card_id::CardId;
use crate::types::quiz::Outcome;
use crate::types::quiz::QuizRecord;
use crate::types::timestamp::Timestamp;

/// Where quiz records live.
///
/// Records are private to the owner of their card: `load` never returns
/// another subject's record, and `save` never overwrites one.
///
/// Implementations need not serialize concurrent `load`/`save` pairs for the
/// same card. Callers that mark the same card concurrently must do that
/// themselves, or lose streak updates.
pub trait QuizStore {
    /// Load the owner's quiz record for a card, or `None` if the owner never
    /// reviewed it.
    fn load(&self, owner: &Subject, card_id: CardId) -> Fallible<Option<QuizRecord>>;

    /// Insert or replace the owner's quiz record for a card.
    fn save(&self, owner: &Subject, record: &QuizRecord) -> Fallible<()>;
}

/// An in-memory store, keeping each subject's records apart.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(Subject, CardId), QuizRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QuizStore for MemoryStore {
    fn load(&self, owner: &Subject, card_id: CardId) -> Fallible<Option<QuizRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(&(owner.clone(), card_id)).cloned())
    }

    fn save(&self, owner: &Subject, record: &QuizRecord) -> Fallible<()> {
        self.records
            .lock()
            .unwrap()
            .insert((owner.clone(), record.card_id), record.clone());
        Ok(())
    }
}

/// The parameters of the scheduler.
#[derive(Clone, Debug)]
pub struct Scheduler {
    pub levels: LevelTable,
    /// How long until a never-reviewed card is first due.
    pub repeat_delay: TimeDelta,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            levels: LevelTable::default(),
            repeat_delay: TimeDelta::minutes(10),
        }
    }
}

impl Scheduler {
    /// Mark a card with the outcome of a review, and persist the result.
    ///
    /// Fails without touching the store if no subject is logged in. The
    /// record is loaded and saved as the logged-in subject's, so the store
    /// refuses cards the subject does not own. Store errors are returned as
    /// they are.
    pub fn mark_card(
        &self,
        auth: &impl AuthContext,
        store: &impl QuizStore,
        card_id: CardId,
        outcome: Outcome,
        now: Timestamp,
    ) -> Fallible<QuizRecord> {
        let subject = require_subject(auth)?;
        log::debug!("{subject} marks card {card_id} {outcome}");
        let mut record = match store.load(subject, card_id)? {
            Some(record) => record,
            None => QuizRecord::new(card_id, now, self.repeat_delay),
        };
        record.mark(outcome, &self.levels, now);
        store.save(subject, &record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::auth::Session;
    use crate::auth::Subject;
    use crate::error::ErrorReport;
    use crate::error::fail;
    use crate::types::card::CardType;

    fn now() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2024, 2, 10, 9, 0, 0).unwrap())
    }

    fn alice() -> Session {
        Session::logged_in(Subject::new("alice"))
    }

    fn card_id() -> CardId {
        CardId::for_card(&Subject::new("alice"), CardType::Hanzi, "学")
    }

    struct BrokenStore;

    impl QuizStore for BrokenStore {
        fn load(&self, _owner: &Subject, _card_id: CardId) -> Fallible<Option<QuizRecord>> {
            Ok(None)
        }

        fn save(&self, _owner: &Subject, _record: &QuizRecord) -> Fallible<()> {
            fail("disk full")
        }
    }

    #[test]
    fn test_first_review_creates_record() -> Fallible<()> {
        let scheduler = Scheduler::default();
        let store = MemoryStore::new();
        let record = scheduler.mark_card(&alice(), &store, card_id(), Outcome::Right, now())?;
        assert_eq!(record.srs_level, 1);
        assert_eq!(record.next_review, now() + TimeDelta::hours(8));
        assert_eq!(store.load(&Subject::new("alice"), card_id())?, Some(record));
        Ok(())
    }

    #[test]
    fn test_first_review_wrong_keeps_default_schedule() -> Fallible<()> {
        let scheduler = Scheduler::default();
        let store = MemoryStore::new();
        let record = scheduler.mark_card(&alice(), &store, card_id(), Outcome::Wrong, now())?;
        assert_eq!(record.srs_level, 0);
        assert_eq!(record.next_review, now() + TimeDelta::minutes(10));
        assert_eq!(record.stat.streak.wrong, 1);
        Ok(())
    }

    #[test]
    fn test_marks_accumulate() -> Fallible<()> {
        let scheduler = Scheduler::default();
        let store = MemoryStore::new();
        for _ in 0..3 {
            scheduler.mark_card(&alice(), &store, card_id(), Outcome::Right, now())?;
        }
        let record = store.load(&Subject::new("alice"), card_id())?;
        assert_eq!(record.map(|r| (r.srs_level, r.stat.streak.right)), Some((3, 3)));
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn test_records_are_kept_per_subject() -> Fallible<()> {
        let scheduler = Scheduler::default();
        let store = MemoryStore::new();
        let record = scheduler.mark_card(&alice(), &store, card_id(), Outcome::Right, now())?;
        let mallory = Session::logged_in(Subject::new("mallory"));
        scheduler.mark_card(&mallory, &store, card_id(), Outcome::Wrong, now())?;
        assert_eq!(store.load(&Subject::new("alice"), card_id())?, Some(record));
        Ok(())
    }

    #[test]
    fn test_unauthenticated_mark_is_rejected() -> Fallible<()> {
        let scheduler = Scheduler::default();
        let store = MemoryStore::new();
        let result = scheduler.mark_card(
            &Session::anonymous(),
            &store,
            card_id(),
            Outcome::Right,
            now(),
        );
        assert_eq!(result, Err(ErrorReport::new("not logged in")));
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn test_store_errors_propagate() {
        let scheduler = Scheduler::default();
        let result = scheduler.mark_card(&alice(), &BrokenStore, card_id(), Outcome::Right, now());
        assert_eq!(result, Err(ErrorReport::new("disk full")));
    }
}
