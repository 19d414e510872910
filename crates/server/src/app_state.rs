use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex as StdMutex,
};

use server_api::{Notifier, Session};
use shared::protocol::{Notice, SessionEvent};
use storage::{seed, SubmissionStore, TransitionPolicy};
use tokio::sync::{broadcast, Mutex};
use tracing::info;

use crate::config::Settings;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) session: Arc<Mutex<Session>>,
    pub(crate) events: broadcast::Sender<SessionEvent>,
    pub(crate) notifier: Arc<AppNotifier>,
}

impl AppState {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let policy = if settings.strict_transitions {
            TransitionPolicy::forward()
        } else {
            TransitionPolicy::Free
        };
        let mut store = SubmissionStore::new().with_policy(policy);
        if settings.seed_demo_data {
            let count = seed::seed_demo(&mut store)?;
            info!(count, "seeded demo submissions");
        }
        Ok(Self::with_store(store, settings.event_buffer.max(1)))
    }

    pub(crate) fn with_store(store: SubmissionStore, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer);
        let notifier = Arc::new(AppNotifier {
            events: events.clone(),
            flash: StdMutex::new(None),
            flash_armed: AtomicBool::new(false),
        });
        let session = Session::new(store).with_notifier(notifier.clone());
        Self {
            session: Arc::new(Mutex::new(session)),
            events,
            notifier,
        }
    }
}

/// Forwards session events to websocket subscribers. Notices of form-driven
/// commands are also kept for the next rendered page.
pub(crate) struct AppNotifier {
    events: broadcast::Sender<SessionEvent>,
    flash: StdMutex<Option<Notice>>,
    flash_armed: AtomicBool,
}

impl AppNotifier {
    /// Keeps the next notice as the page flash. Call while holding the
    /// session lock, right before the command.
    pub(crate) fn flash_next_notice(&self) {
        self.flash_armed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn set_flash(&self, notice: Notice) {
        *self
            .flash
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(notice);
    }

    pub(crate) fn take_flash(&self) -> Option<Notice> {
        self.flash
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl Notifier for AppNotifier {
    fn notify(&self, event: SessionEvent) {
        if let SessionEvent::Notice(notice) = &event {
            if self.flash_armed.swap(false, Ordering::SeqCst) {
                self.set_flash(notice.clone());
            }
        }
        self.events.notify(event);
    }
}
