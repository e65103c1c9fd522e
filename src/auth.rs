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

//! The authenticated subject of a request.
//!
//! Authentication itself happens elsewhere. The scheduler and the search only
//! need to know who is asking, and to refuse when nobody is.

use std::fmt::Display;
use std::fmt::Formatter;

use crate::error::ErrorReport;

/// An authenticated user.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Subject(String);

impl Subject {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supplies the subject attached to the current call, if any.
pub trait AuthContext {
    fn subject(&self) -> Option<&Subject>;
}

/// A session: the simplest [`AuthContext`], holding an optional subject.
#[derive(Clone, Debug, Default)]
pub struct Session {
    subject: Option<Subject>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { subject: None }
    }

    pub fn logged_in(subject: Subject) -> Self {
        Self {
            subject: Some(subject),
        }
    }
}

impl AuthContext for Session {
    fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }
}

#[derive(Debug, PartialEq)]
pub struct Unauthenticated;

impl Display for Unauthenticated {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "not logged in")
    }
}

impl std::error::Error for Unauthenticated {}

impl From<Unauthenticated> for ErrorReport {
    fn from(value: Unauthenticated) -> Self {
        ErrorReport::new(value.to_string())
    }
}

/// The guard every state-changing or user-scoped operation goes through.
pub fn require_subject(ctx: &impl AuthContext) -> Result<&Subject, Unauthenticated> {
    ctx.subject().ok_or(Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_is_rejected() {
        let session = Session::anonymous();
        assert_eq!(require_subject(&session), Err(Unauthenticated));
    }

    #[test]
    fn test_logged_in_subject() {
        let session = Session::logged_in(Subject::new("alice"));
        assert_eq!(require_subject(&session), Ok(&Subject::new("alice")));
    }

    #[test]
    fn test_error_message() {
        let report: ErrorReport = Unauthenticated.into();
        assert_eq!(report.message(), "not logged in");
    }
}
