//! Filtered and sorted projections of the store. Nothing here is cached: a
//! view is recomputed from the store on every read.

use std::cmp::Ordering;

use shared::domain::{SortConfig, SortDirection, SortKey, StatusFilter};
use storage::{Submission, SubmissionReader};

pub fn filter(all: &[Submission], predicate: StatusFilter) -> impl Iterator<Item = &Submission> {
    all.iter().filter(move |s| predicate.matches(s.status()))
}

fn by_title(a: &Submission, b: &Submission) -> Ordering {
    a.title().cmp(b.title())
}

fn by_journal(a: &Submission, b: &Submission) -> Ordering {
    a.journal().cmp(b.journal())
}

fn by_submission_id(a: &Submission, b: &Submission) -> Ordering {
    a.submission_id()
        .unwrap_or_default()
        .cmp(b.submission_id().unwrap_or_default())
}

pub fn comparator(key: SortKey) -> fn(&Submission, &Submission) -> Ordering {
    match key {
        SortKey::Title => by_title,
        SortKey::Journal => by_journal,
        SortKey::SubmissionId => by_submission_id,
    }
}

/// Stable sort; equal keys keep their relative order in both directions.
pub fn sort(list: &mut [&Submission], config: SortConfig) {
    let compare = comparator(config.key);
    match config.direction {
        SortDirection::Asc => list.sort_by(|a, b| compare(a, b)),
        SortDirection::Desc => list.sort_by(|a, b| compare(b, a)),
    }
}

/// Column sort state of the submissions table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    current: Option<SortConfig>,
}

impl SortState {
    pub fn current(&self) -> Option<SortConfig> {
        self.current
    }

    /// What a request for `key` would select, without applying it. The key
    /// that is already sorted ascending flips to descending; anything else
    /// starts ascending.
    pub fn next(&self, key: SortKey) -> SortConfig {
        let direction = match self.current {
            Some(SortConfig {
                key: current,
                direction: SortDirection::Asc,
            }) if current == key => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        SortConfig { key, direction }
    }

    pub fn request(&mut self, key: SortKey) -> SortConfig {
        let config = self.next(key);
        self.current = Some(config);
        config
    }

    pub fn set(&mut self, config: SortConfig) {
        self.current = Some(config);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

impl From<Option<SortConfig>> for SortState {
    fn from(current: Option<SortConfig>) -> Self {
        Self { current }
    }
}

pub fn derive<R: SubmissionReader>(
    reader: &R,
    predicate: StatusFilter,
    sort_config: Option<SortConfig>,
) -> Vec<&Submission> {
    let mut view: Vec<&Submission> = filter(reader.list(), predicate).collect();
    if let Some(config) = sort_config {
        sort(&mut view, config);
    }
    view
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
