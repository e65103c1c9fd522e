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

//! zhquiz: spaced repetition scheduling and card search for learning
//! Chinese.
//!
//! - [`srs`]: the level table and the review scheduler.
//! - [`types::quiz`]: quiz records and the mark transition.
//! - [`review`]: the quiz record store and the authenticated mark operation.
//! - [`query`]: the filter language, its parser, and its compiler.
//! - [`db`]: SQLite storage for cards and quiz records, and predicate
//!   evaluation.

pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod query;
pub mod review;
pub mod search;
pub mod srs;
pub mod types;
