//! Append-only status log and the rule every status change passes through.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use shared::domain::{StatusHistoryItem, SubmissionStatus};

use crate::StoreError;

/// Chronological log of every status a submission has held. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusHistory {
    entries: Vec<StatusHistoryItem>,
}

impl StatusHistory {
    pub fn start(status: SubmissionStatus, date: NaiveDate, notes: Option<String>) -> Self {
        Self {
            entries: vec![StatusHistoryItem {
                status,
                date,
                notes: normalize_notes(notes),
            }],
        }
    }

    /// Rebuilds a log from previously recorded entries. Returns `None` when
    /// `entries` is empty.
    pub fn from_entries(entries: Vec<StatusHistoryItem>) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Self { entries })
    }

    pub fn current(&self) -> SubmissionStatus {
        self.last().status
    }

    pub fn last(&self) -> &StatusHistoryItem {
        // `entries` is non-empty from construction and only ever grows.
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[StatusHistoryItem] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub(crate) fn append(
        &mut self,
        status: SubmissionStatus,
        date: NaiveDate,
        notes: Option<String>,
    ) {
        self.entries.push(StatusHistoryItem {
            status,
            date,
            notes: normalize_notes(notes),
        });
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Which status changes are permitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any status may follow any other.
    #[default]
    Free,
    /// Allowed targets per current status; anything missing is refused.
    Table(BTreeMap<SubmissionStatus, BTreeSet<SubmissionStatus>>),
}

impl TransitionPolicy {
    /// Canonical review workflow: Submitted -> UnderReview -> revision ->
    /// decision, with revisions allowed to go back under review.
    pub fn forward() -> Self {
        use SubmissionStatus::*;

        let edges: [(SubmissionStatus, &[SubmissionStatus]); 4] = [
            (Submitted, &[UnderReview]),
            (UnderReview, &[MinorRevision, MajorRevision]),
            (MinorRevision, &[UnderReview, Accepted, Rejected]),
            (MajorRevision, &[UnderReview, Accepted, Rejected]),
        ];
        let table = edges
            .into_iter()
            .map(|(from, targets)| (from, targets.iter().copied().collect()))
            .collect();
        TransitionPolicy::Table(table)
    }

    pub fn allows(&self, from: SubmissionStatus, to: SubmissionStatus) -> bool {
        match self {
            TransitionPolicy::Free => true,
            TransitionPolicy::Table(table) => table
                .get(&from)
                .is_some_and(|targets| targets.contains(&to)),
        }
    }

    pub fn allowed_targets(&self, from: SubmissionStatus) -> Vec<SubmissionStatus> {
        SubmissionStatus::ALL
            .into_iter()
            .filter(|to| self.allows(from, *to))
            .collect()
    }

    pub fn check(&self, from: SubmissionStatus, to: SubmissionStatus) -> Result<(), StoreError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(StoreError::TransitionRefused { from, to })
        }
    }
}

/// Applies `policy` and appends the entry when permitted.
pub fn record_transition(
    history: &mut StatusHistory,
    policy: &TransitionPolicy,
    to: SubmissionStatus,
    date: NaiveDate,
    notes: Option<String>,
) -> Result<(), StoreError> {
    policy.check(history.current(), to)?;
    history.append(to, date, notes);
    Ok(())
}
