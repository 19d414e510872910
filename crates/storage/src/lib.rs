use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{
    domain::{SubmissionId, SubmissionRecord, SubmissionStatus},
    error::{ApiError, ErrorCode},
    protocol::NewSubmission,
};
use thiserror::Error;
use tracing::debug;

pub mod clock;
pub mod history;
pub mod seed;

pub use clock::{Clock, FixedClock, SystemClock};
pub use history::{StatusHistory, TransitionPolicy};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("missing required field(s): {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },
    #[error("tracking_link is not a valid url: {0}")]
    InvalidTrackingLink(String),
    #[error("unknown status '{0}'")]
    InvalidStatus(String),
    #[error("transition from {from} to {to} is not allowed")]
    TransitionRefused {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },
    #[error("submission {0} not found")]
    NotFound(SubmissionId),
    #[error("submission {0} already exists")]
    DuplicateId(SubmissionId),
    #[error("inconsistent record {id}: {reason}")]
    InconsistentRecord { id: SubmissionId, reason: String },
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::MissingFields { .. } | StoreError::InvalidTrackingLink(_) => {
                ErrorCode::Validation
            }
            StoreError::InvalidStatus(_) | StoreError::TransitionRefused { .. } => {
                ErrorCode::InvalidStatus
            }
            StoreError::NotFound(_) => ErrorCode::NotFound,
            StoreError::DuplicateId(_) | StoreError::InconsistentRecord { .. } => {
                ErrorCode::Internal
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}

/// A tracked manuscript. Fields are only reachable through accessors so that
/// status can change solely via [`SubmissionCommands::change_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    id: SubmissionId,
    title: String,
    authors: Vec<String>,
    journal: String,
    submission_id: Option<String>,
    tracking_link: Option<String>,
    history: StatusHistory,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn id(&self) -> &SubmissionId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn journal(&self) -> &str {
        &self.journal
    }

    pub fn submission_id(&self) -> Option<&str> {
        self.submission_id.as_deref()
    }

    pub fn tracking_link(&self) -> Option<&str> {
        self.tracking_link.as_deref()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.history.current()
    }

    pub fn history(&self) -> &StatusHistory {
        &self.history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn to_record(&self) -> SubmissionRecord {
        SubmissionRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            authors: self.authors.clone(),
            journal: self.journal.clone(),
            submission_id: self.submission_id.clone(),
            tracking_link: self.tracking_link.clone(),
            status: self.status(),
            status_history: self.history.entries().to_vec(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub trait SubmissionReader {
    fn get(&self, id: &SubmissionId) -> Option<&Submission>;

    /// All submissions in insertion order.
    fn list(&self) -> &[Submission];

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.list().is_empty()
    }
}

pub trait SubmissionCommands {
    fn add(&mut self, input: NewSubmission) -> Result<&Submission, StoreError>;

    fn remove(&mut self, id: &SubmissionId) -> Result<Submission, StoreError>;

    fn change_status(
        &mut self,
        id: &SubmissionId,
        status: SubmissionStatus,
        notes: Option<String>,
    ) -> Result<&Submission, StoreError>;

    /// Parses `raw` exactly and changes status; unknown names are
    /// `InvalidStatus`.
    fn change_status_named(
        &mut self,
        id: &SubmissionId,
        raw: &str,
        notes: Option<String>,
    ) -> Result<&Submission, StoreError> {
        let status = parse_status(raw)?;
        self.change_status(id, status, notes)
    }
}

/// In-memory canonical list of submissions for one session.
#[derive(Clone)]
pub struct SubmissionStore {
    submissions: Vec<Submission>,
    policy: TransitionPolicy,
    clock: Arc<dyn Clock>,
}

impl Default for SubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            submissions: Vec::new(),
            policy: TransitionPolicy::default(),
            clock,
        }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &TransitionPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Inserts a previously recorded submission, e.g. seed data, after
    /// checking the history invariants.
    pub fn restore(&mut self, record: SubmissionRecord) -> Result<&Submission, StoreError> {
        if self.position(&record.id).is_some() {
            return Err(StoreError::DuplicateId(record.id));
        }
        let inconsistent = |reason: &str| StoreError::InconsistentRecord {
            id: record.id.clone(),
            reason: reason.to_string(),
        };
        let history = StatusHistory::from_entries(record.status_history.clone())
            .ok_or_else(|| inconsistent("empty status history"))?;
        if history.current() != record.status {
            return Err(inconsistent("last history entry does not match status"));
        }
        if record.updated_at < record.created_at {
            return Err(inconsistent("updated_at precedes created_at"));
        }

        self.submissions.push(Submission {
            id: record.id,
            title: record.title,
            authors: record.authors,
            journal: record.journal,
            submission_id: record.submission_id,
            tracking_link: record.tracking_link,
            history,
            created_at: record.created_at,
            updated_at: record.updated_at,
        });
        Ok(self.last_inserted())
    }

    fn position(&self, id: &SubmissionId) -> Option<usize> {
        self.submissions.iter().position(|s| &s.id == id)
    }

    fn last_inserted(&self) -> &Submission {
        &self.submissions[self.submissions.len() - 1]
    }
}

impl SubmissionReader for SubmissionStore {
    fn get(&self, id: &SubmissionId) -> Option<&Submission> {
        self.submissions.iter().find(|s| &s.id == id)
    }

    fn list(&self) -> &[Submission] {
        &self.submissions
    }
}

impl SubmissionCommands for SubmissionStore {
    fn add(&mut self, input: NewSubmission) -> Result<&Submission, StoreError> {
        let title = input.title.trim();
        let journal = input.journal.trim();

        let mut missing = Vec::new();
        if title.is_empty() {
            missing.push("title");
        }
        if journal.is_empty() {
            missing.push("journal");
        }
        if !missing.is_empty() {
            return Err(StoreError::MissingFields { fields: missing });
        }

        let status = match input.status.as_deref() {
            None | Some("") => SubmissionStatus::default(),
            Some(raw) => parse_status(raw)?,
        };

        let tracking_link = non_empty(input.tracking_link);
        if let Some(link) = &tracking_link {
            url::Url::parse(link).map_err(|_| StoreError::InvalidTrackingLink(link.clone()))?;
        }

        let mut id = SubmissionId::generate();
        while self.position(&id).is_some() {
            id = SubmissionId::generate();
        }

        let now = self.clock.now();
        let submission = Submission {
            id,
            title: title.to_string(),
            authors: split_authors(&input.authors),
            journal: journal.to_string(),
            submission_id: non_empty(input.submission_id),
            tracking_link,
            history: StatusHistory::start(status, now.date_naive(), input.notes),
            created_at: now,
            updated_at: now,
        };
        debug!(id = %submission.id, %status, "submission added");
        self.submissions.push(submission);
        Ok(self.last_inserted())
    }

    fn remove(&mut self, id: &SubmissionId) -> Result<Submission, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        debug!(%id, "submission removed");
        Ok(self.submissions.remove(index))
    }

    fn change_status(
        &mut self,
        id: &SubmissionId,
        status: SubmissionStatus,
        notes: Option<String>,
    ) -> Result<&Submission, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let now = self.clock.now();
        let submission = &mut self.submissions[index];

        history::record_transition(
            &mut submission.history,
            &self.policy,
            status,
            now.date_naive(),
            notes,
        )?;
        submission.updated_at = submission.updated_at.max(now);
        debug!(%id, %status, entries = submission.history.len(), "status changed");
        Ok(&self.submissions[index])
    }
}

fn parse_status(raw: &str) -> Result<SubmissionStatus, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::InvalidStatus(raw.to_string()))
}

/// Splits a comma-separated author list, trimming names and dropping blanks.
pub fn split_authors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
