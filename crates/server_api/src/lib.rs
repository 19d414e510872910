use std::sync::Arc;

use shared::{
    domain::{SortConfig, SortKey, StatusFilter, SubmissionId, SubmissionRecord, SubmissionStatus},
    error::ApiError,
    protocol::{
        NewSubmission, Notice, SessionEvent, SessionStatus, StatisticsSummary, StatusCount,
        SubmissionView, TimeRange,
    },
};
use storage::{StoreError, SubmissionCommands, SubmissionReader, SubmissionStore};
use tokio::sync::broadcast;
use tracing::{info, warn};

pub mod stats;
pub mod view;

use stats::LegendSelection;
use view::SortState;

/// Receives session events. Delivery is fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: SessionEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: SessionEvent) {}
}

impl Notifier for broadcast::Sender<SessionEvent> {
    fn notify(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.send(event);
    }
}

/// Everything one user session holds: the store plus the view state that
/// is layered over it.
pub struct Session<S = SubmissionStore> {
    store: S,
    filter: StatusFilter,
    sort: SortState,
    legend: LegendSelection,
    authenticated: bool,
    notifier: Arc<dyn Notifier>,
}

impl<S> Session<S>
where
    S: SubmissionReader + SubmissionCommands,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            filter: StatusFilter::All,
            sort: SortState::default(),
            legend: LegendSelection::default(),
            authenticated: false,
            notifier: Arc::new(NullNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Read-only access to the canonical list.
    pub fn reader(&self) -> &S {
        &self.store
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn sort(&self) -> Option<SortConfig> {
        self.sort.current()
    }

    pub fn get(&self, id: &SubmissionId) -> Result<SubmissionRecord, ApiError> {
        self.store
            .get(id)
            .map(|s| s.to_record())
            .ok_or_else(|| StoreError::NotFound(id.clone()).into())
    }

    pub fn add(&mut self, input: NewSubmission) -> Result<SubmissionRecord, ApiError> {
        let result = self.store.add(input).map(|s| s.to_record());
        match result {
            Ok(record) => {
                info!(id = %record.id, title = %record.title, "submission added");
                self.notifier.notify(SessionEvent::SubmissionAdded {
                    submission: record.clone(),
                });
                self.notice(Notice::success("Submission added"));
                Ok(record)
            }
            Err(error) => Err(self.reject("add", error)),
        }
    }

    pub fn remove(&mut self, id: &SubmissionId) -> Result<(), ApiError> {
        match self.store.remove(id) {
            Ok(_) => {
                info!(%id, "submission removed");
                self.notifier
                    .notify(SessionEvent::SubmissionRemoved { id: id.clone() });
                self.notice(Notice::success("Submission deleted"));
                Ok(())
            }
            Err(error) => Err(self.reject("remove", error)),
        }
    }

    /// Parses `status` exactly and applies it through the store.
    pub fn change_status(
        &mut self,
        id: &SubmissionId,
        status: &str,
        notes: Option<String>,
    ) -> Result<SubmissionRecord, ApiError> {
        let result = self
            .store
            .change_status_named(id, status, notes)
            .map(|s| s.to_record());
        match result {
            Ok(record) => {
                info!(%id, status = %record.status, "status updated");
                self.notifier.notify(SessionEvent::StatusChanged {
                    id: record.id.clone(),
                    status: record.status,
                    updated_at: record.updated_at,
                });
                self.notice(Notice::success("Status updated"));
                Ok(record)
            }
            Err(error) => Err(self.reject("change_status", error)),
        }
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn set_filter_named(&mut self, raw: &str) -> Result<StatusFilter, ApiError> {
        let filter = raw.parse::<StatusFilter>().map_err(ApiError::from)?;
        self.set_filter(filter);
        Ok(filter)
    }

    pub fn request_sort(&mut self, key: SortKey) -> SortConfig {
        self.sort.request(key)
    }

    pub fn request_sort_named(&mut self, raw: &str) -> Result<SortConfig, ApiError> {
        let key = raw.parse::<SortKey>().map_err(ApiError::from)?;
        Ok(self.request_sort(key))
    }

    /// Applies an explicit key and direction; repeating it is a no-op.
    pub fn set_sort(&mut self, config: SortConfig) {
        self.sort.set(config);
    }

    pub fn set_sort_named(&mut self, key: &str, direction: &str) -> Result<SortConfig, ApiError> {
        let config = SortConfig {
            key: key.parse().map_err(ApiError::from)?,
            direction: direction.parse().map_err(ApiError::from)?,
        };
        self.set_sort(config);
        Ok(config)
    }

    pub fn clear_sort(&mut self) {
        self.sort.clear();
    }

    /// Recomputed from the store on every call.
    pub fn current_view(&self) -> SubmissionView {
        let submissions = view::derive(&self.store, self.filter, self.sort.current())
            .into_iter()
            .map(|s| s.to_record())
            .collect();
        SubmissionView {
            filter: self.filter,
            sort: self.sort.current(),
            submissions,
        }
    }

    pub fn statistics(&self, range: TimeRange) -> StatisticsSummary {
        stats::summarize(self.store.list(), range)
    }

    pub fn toggle_legend(&mut self, status: SubmissionStatus) {
        self.legend.toggle(status);
    }

    pub fn legend(&self) -> &LegendSelection {
        &self.legend
    }

    /// Per-status entries the chart renders under the current legend.
    pub fn chart(&self, range: TimeRange) -> Vec<StatusCount> {
        let summary = self.statistics(range);
        self.legend
            .chart_slice(&summary.by_status)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn login(&mut self) -> SessionStatus {
        self.authenticated = true;
        self.status()
    }

    pub fn logout(&mut self) -> SessionStatus {
        self.authenticated = false;
        self.status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            authenticated: self.authenticated,
        }
    }

    fn notice(&self, notice: Notice) {
        self.notifier.notify(SessionEvent::Notice(notice));
    }

    fn reject(&self, operation: &str, error: StoreError) -> ApiError {
        warn!(operation, %error, "command rejected");
        let error = ApiError::from(error);
        self.notice(Notice::error(error.message.clone()));
        error
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
