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

use chrono::TimeDelta;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;
use crate::srs::LevelTable;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

/// The outcome of reviewing a card.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    /// Recalled correctly: promote.
    Right,
    /// Forgotten: demote.
    Wrong,
    /// Ask again later: hold.
    Repeat,
}

impl Outcome {
    pub fn delta(self) -> i64 {
        match self {
            Outcome::Right => 1,
            Outcome::Wrong => -1,
            Outcome::Repeat => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Right => "right",
            Outcome::Wrong => "wrong",
            Outcome::Repeat => "repeat",
        }
    }
}

impl FromStr for Outcome {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "right" => Ok(Outcome::Right),
            "wrong" => Ok(Outcome::Wrong),
            "repeat" => Ok(Outcome::Repeat),
            _ => fail(format!("Invalid outcome: {s}")),
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    #[serde(default)]
    pub right: u32,
    #[serde(default)]
    pub wrong: u32,
    #[serde(default)]
    pub max_right: u32,
    #[serde(default)]
    pub max_wrong: u32,
}

/// Review statistics for a card.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    #[serde(default)]
    pub streak: Streak,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_right: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_wrong: Option<Timestamp>,
}

/// The scheduling state of a card.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRecord {
    pub card_id: CardId,
    pub srs_level: usize,
    pub next_review: Timestamp,
    pub stat: Stat,
}

impl QuizRecord {
    /// The record of a card that has never been reviewed: level zero, no
    /// statistics, and due again after `repeat_delay`.
    pub fn new(card_id: CardId, now: Timestamp, repeat_delay: TimeDelta) -> Self {
        Self {
            card_id,
            srs_level: 0,
            next_review: now + repeat_delay,
            stat: Stat::default(),
        }
    }

    /// Apply a review outcome.
    ///
    /// Only a right answer reschedules the card. A wrong or repeated answer
    /// changes the level but leaves `next_review` where it was.
    pub fn mark(&mut self, outcome: Outcome, levels: &LevelTable, now: Timestamp) {
        let streak = &mut self.stat.streak;
        match outcome {
            Outcome::Right => {
                streak.right += 1;
                streak.wrong = 0;
                streak.max_right = streak.max_right.max(streak.right);
                self.stat.last_right = Some(now);
            }
            Outcome::Wrong => {
                streak.wrong += 1;
                streak.right = 0;
                streak.max_wrong = streak.max_wrong.max(streak.wrong);
                self.stat.last_wrong = Some(now);
            }
            Outcome::Repeat => {}
        }

        // Clamp unconditionally: the stored level may predate a shorter table.
        self.srs_level = levels.clamp(self.srs_level as i64 + outcome.delta());

        if outcome.delta() > 0 {
            self.next_review = levels.next_review_at(self.srs_level, now);
        }
        log::debug!(
            "Marked card {} {outcome}: level {}, next review {}",
            self.card_id,
            self.srs_level,
            self.next_review
        );
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review <= now
    }
}
