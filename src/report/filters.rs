use std::collections::BTreeSet;

use crate::normalize::canonical_identifier;
use crate::records::{Cell, ClassroomRecord};

/// Allow-lists that scope which classrooms reach a report. Empty lists are inactive.
///
/// Active lists are intersected: a classroom must satisfy every one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    pub programs: BTreeSet<String>,
    pub instructor_ids: BTreeSet<String>,
    pub emails: BTreeSet<String>,
}

impl ReportFilters {
    pub fn with_programs<I, S>(mut self, programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.programs = programs
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    /// Ids are canonicalized like the sheet's, so `"123.0"` selects instructor `123`.
    pub fn with_instructor_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.instructor_ids = ids
            .into_iter()
            .map(|id| canonical_identifier(&Cell::from(id.as_ref().trim())))
            .filter(|id| !id.is_empty())
            .collect();
        self
    }

    pub fn with_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.emails = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty() && self.instructor_ids.is_empty() && self.emails.is_empty()
    }

    pub fn allows_program(&self, program: &str) -> bool {
        self.programs.is_empty() || self.programs.contains(program)
    }

    /// Whether one classroom passes every active list. `instructor_email` is the
    /// e-mail resolved for the classroom's instructor.
    pub fn matches(&self, record: &ClassroomRecord, instructor_email: Option<&str>) -> bool {
        if !self.allows_program(&record.program) {
            return false;
        }
        if !self.instructor_ids.is_empty() && !self.instructor_ids.contains(&record.instructor_id) {
            return false;
        }
        if !self.emails.is_empty() {
            return instructor_email.is_some_and(|email| self.emails.contains(email));
        }
        true
    }
}

/// Caps on how many groups each report granularity processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportLimits {
    pub instructors: Option<usize>,
    pub programs: Option<usize>,
}

pub(crate) fn limit_reached(limit: Option<usize>, processed: usize) -> bool {
    limit.is_some_and(|limit| processed >= limit)
}
