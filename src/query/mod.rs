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

//! The query language used to filter cards.
//!
//! A query is a whitespace-separated list of terms, all of which must hold:
//!
//! - `hello`, `"good morning"`: matched against the default fields.
//! - `tag:hsk3`, `level>=2`, `english:"to be"`: a field, an operator (`:`,
//!   `=`, `<`, `<=`, `>`, `>=`), and a value.
//! - `-term`: negation.
//! - `a OR b`: either term.
//!
//! Parsing knows nothing about fields. Whether a field exists, and what its
//! operators mean, is up to the [`compile::Schema`] the tree is compiled
//! against.

pub mod ast;
pub mod card;
pub mod compile;
pub mod lexer;
pub mod parser;
