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

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use serde::Serialize;

use crate::auth::Session;
use crate::auth::Subject;
use crate::auth::require_subject;
use crate::config::Config;
use crate::config::DEFAULT_CONFIG_PATH;
use crate::db::Database;
use crate::db::NewCard;
use crate::error::Fallible;
use crate::error::fail;
use crate::query::card::CardSchema;
use crate::query::compile::compile;
use crate::query::parser::parse;
use crate::review::QuizStore;
use crate::search::search_cards;
use crate::types::card::Card;
use crate::types::card::CardType;
use crate::types::card_id::CardId;
use crate::types::quiz::Outcome;
use crate::types::quiz::QuizRecord;
use crate::types::timestamp::Timestamp;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to the database, overriding the configuration.
    #[arg(long, global = true)]
    db: Option<String>,
    /// The user to act as.
    #[arg(long, global = true, env = "ZHQUIZ_USER")]
    user: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a card, or add tags to an existing one.
    Add {
        /// The character, word, or sentence.
        item: String,
        /// One of: hanzi, vocab, sentence.
        #[arg(long = "type", default_value = "vocab")]
        card_type: CardType,
        #[arg(long)]
        english: Option<String>,
        /// A tag. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Record the outcome of reviewing a card.
    Mark {
        card_id: CardId,
        /// One of: right, wrong, repeat.
        outcome: Outcome,
    },
    /// Pick a card that was never reviewed.
    Learn {
        /// Only cards of this type: hanzi, vocab, or sentence.
        #[arg(long = "type")]
        card_type: Option<CardType>,
    },
    /// Print a card and its quiz record as JSON.
    Show { card_id: CardId },
    /// Search cards.
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print how a query is parsed and compiled.
    Parse { query: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowCard {
    card: Card,
    quiz: Option<QuizRecord>,
    due: bool,
}

pub fn entrypoint() -> Fallible<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load(&config_path)?;
    let session = match cli.user.or(config.user.clone()) {
        Some(user) => Session::logged_in(Subject::new(user)),
        None => Session::anonymous(),
    };
    let database = cli.db.unwrap_or_else(|| config.database.clone());
    let now = Timestamp::now();

    match cli.command {
        Command::Add {
            item,
            card_type,
            english,
            tags,
        } => {
            let subject = require_subject(&session)?;
            let db = Database::new(&database)?;
            let card = db.add_card(
                subject,
                NewCard {
                    card_type,
                    item: &item,
                    english: english.as_deref(),
                    tags: &tags,
                },
                now,
            )?;
            println!("{}", card.id);
        }
        Command::Mark { card_id, outcome } => {
            let db = Database::new(&database)?;
            let scheduler = config.scheduler()?;
            let record = scheduler.mark_card(&session, &db, card_id, outcome, now)?;
            println!(
                "Level {}, next review at {}.",
                record.srs_level, record.next_review
            );
        }
        Command::Learn { card_type } => {
            let subject = require_subject(&session)?;
            let db = Database::new(&database)?;
            match db.random_new_card(subject, card_type)? {
                Some(card) => match &card.english {
                    Some(english) => println!("{}  {}  {english}", card.id, card.item),
                    None => println!("{}  {}", card.id, card.item),
                },
                None => println!("No new cards."),
            }
        }
        Command::Show { card_id } => {
            let subject = require_subject(&session)?;
            let db = Database::new(&database)?;
            let Some(card) = db.get_card(subject, card_id)? else {
                return fail(format!("no such card: {card_id}"));
            };
            let quiz = db.load(subject, card_id)?;
            let due = quiz.as_ref().is_none_or(|q| q.is_due(now));
            let json = serde_json::to_string_pretty(&ShowCard { card, quiz, due })?;
            println!("{json}");
        }
        Command::Search { query, limit } => {
            let db = Database::new(&database)?;
            for card in search_cards(&session, &db, &query, now, limit)? {
                match &card.english {
                    Some(english) => println!("{}  {}  {english}", card.id, card.item),
                    None => println!("{}  {}", card.id, card.item),
                }
            }
        }
        Command::Parse { query } => match parse(&query)? {
            Some(tree) => {
                println!("{tree}");
                let (sql, params) = compile(&tree, &CardSchema { now }).to_sql();
                println!("{sql}");
                println!("{params:?}");
            }
            None => println!("(empty query)"),
        },
    }
    Ok(())
}
