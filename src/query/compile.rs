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

//! Compiling condition trees into predicates.

use std::fmt::Debug;

use crate::query::ast::Node;
use crate::query::ast::Operator;
use crate::query::ast::Term;

/// A boolean combination of backend-specific atoms.
#[derive(Clone, PartialEq, Debug)]
pub enum Predicate<A> {
    Atom(A),
    All(Vec<Predicate<A>>),
    Any(Vec<Predicate<A>>),
    Not(Box<Predicate<A>>),
    /// Matches nothing.
    Nothing,
}

impl<A> Predicate<A> {
    /// Evaluate the predicate, given a way to evaluate its atoms.
    pub fn matches(&self, atom: &impl Fn(&A) -> bool) -> bool {
        match self {
            Predicate::Atom(a) => atom(a),
            Predicate::All(children) => children.iter().all(|c| c.matches(atom)),
            Predicate::Any(children) => children.iter().any(|c| c.matches(atom)),
            Predicate::Not(inner) => !inner.matches(atom),
            Predicate::Nothing => false,
        }
    }
}

/// The searchable fields of a domain, and how to compile filters on them.
///
/// Implementors enumerate their fields as a type and match on
/// `(field, operator)` in [`Schema::compile_term`], so the compiler checks
/// that every field is handled.
pub trait Schema {
    type Field: Copy + Debug;
    type Atom;

    /// Resolve a field name as written in a query.
    fn field(&self, name: &str) -> Option<Self::Field>;

    /// The fields a term without a field is matched against. Must not be
    /// empty.
    fn default_fields(&self) -> &[Self::Field];

    /// Compile a filter on one field. `None` means the field does not support
    /// the operator, or the value makes no sense for the field.
    fn compile_term(&self, field: Self::Field, operator: Operator, value: &str)
    -> Option<Self::Atom>;
}

/// Compile a condition tree against a schema.
///
/// Filters the schema cannot compile (an unknown field, an unsupported
/// operator, or an invalid value) compile to [`Predicate::Nothing`]: they
/// are not errors, they simply match no entries. Negating such a filter
/// therefore matches every entry.
pub fn compile<S: Schema>(node: &Node, schema: &S) -> Predicate<S::Atom> {
    match node {
        Node::Term(term) => compile_term(term, schema),
        Node::And(children) => {
            Predicate::All(children.iter().map(|c| compile(c, schema)).collect())
        }
        Node::Or(children) => {
            Predicate::Any(children.iter().map(|c| compile(c, schema)).collect())
        }
    }
}

fn compile_term<S: Schema>(term: &Term, schema: &S) -> Predicate<S::Atom> {
    let predicate = match &term.field {
        Some(name) => match schema.field(name) {
            Some(field) => compile_field(schema, field, term),
            None => {
                log::warn!("Unknown field in query: {name}");
                Predicate::Nothing
            }
        },
        None => Predicate::Any(
            schema
                .default_fields()
                .iter()
                .map(|field| compile_field(schema, *field, term))
                .collect(),
        ),
    };
    if term.negated {
        Predicate::Not(Box::new(predicate))
    } else {
        predicate
    }
}

fn compile_field<S: Schema>(schema: &S, field: S::Field, term: &Term) -> Predicate<S::Atom> {
    match schema.compile_term(field, term.operator, &term.value) {
        Some(atom) => Predicate::Atom(atom),
        None => {
            log::warn!(
                "Filter {field:?}{}{} matches nothing",
                term.operator,
                term.value
            );
            Predicate::Nothing
        }
    }
}
