use std::sync::Mutex;

use super::*;
use shared::{error::ErrorCode, protocol::NoticeLevel};
use storage::seed;

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<Notice> {
        self.events
            .lock()
            .expect("lock")
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Notice(notice) => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: SessionEvent) {
        self.events.lock().expect("lock").push(event);
    }
}

fn seeded() -> (Session, Arc<RecordingNotifier>) {
    let mut store = SubmissionStore::new();
    seed::seed_demo(&mut store).expect("seed");
    let notifier = Arc::new(RecordingNotifier::default());
    let session = Session::new(store).with_notifier(notifier.clone());
    (session, notifier)
}

fn new_submission(title: &str, journal: &str) -> NewSubmission {
    NewSubmission {
        title: title.into(),
        journal: journal.into(),
        authors: "A, B".into(),
        ..Default::default()
    }
}

#[test]
fn filter_then_delete_never_leaves_stale_rows() {
    let (mut session, _) = seeded();
    session.set_filter(StatusFilter::Only(SubmissionStatus::MinorRevision));
    let view = session.current_view();
    assert_eq!(view.submissions.len(), 1);

    let id = view.submissions[0].id.clone();
    session.remove(&id).expect("remove");
    assert!(session.current_view().submissions.is_empty());
    assert_eq!(session.reader().len(), 1);
}

#[test]
fn status_change_moves_row_out_of_active_filter() {
    let (mut session, _) = seeded();
    session.set_filter_named("UnderReview").expect("filter");
    let id = session.current_view().submissions[0].id.clone();

    session
        .change_status(&id, "Accepted", Some("camera ready".into()))
        .expect("change");
    assert!(session.current_view().submissions.is_empty());

    session.set_filter(StatusFilter::Only(SubmissionStatus::Accepted));
    let view = session.current_view();
    assert_eq!(view.submissions.len(), 1);
    assert_eq!(view.submissions[0].status_history.len(), 3);
}

#[test]
fn added_submission_appears_in_matching_view() {
    let (mut session, notifier) = seeded();
    session.set_filter(StatusFilter::Only(SubmissionStatus::Submitted));
    let record = session.add(new_submission("T1", "J1")).expect("add");

    assert_eq!(record.authors, vec!["A", "B"]);
    assert_eq!(record.created_at, record.updated_at);
    let view = session.current_view();
    assert_eq!(view.submissions.len(), 1);
    assert_eq!(view.submissions[0].id, record.id);
    assert_eq!(notifier.notices(), vec![Notice::success("Submission added")]);
}

#[test]
fn rejected_add_publishes_error_notice_and_keeps_store() {
    let (mut session, notifier) = seeded();
    let err = session.add(new_submission("", "J1")).expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(err.message.contains("title"));
    assert_eq!(session.reader().len(), 2);

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[test]
fn invalid_status_and_missing_id_are_reported() {
    let (mut session, _) = seeded();
    let err = session
        .change_status(&SubmissionId::from("1"), "Published", None)
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::InvalidStatus);

    let err = session
        .change_status(&SubmissionId::from("404"), "Accepted", None)
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = session
        .remove(&SubmissionId::from("404"))
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::NotFound);
    assert_eq!(
        session.get(&SubmissionId::from("404")).expect_err("missing").code,
        ErrorCode::NotFound
    );
}

#[test]
fn status_changes_emit_events() {
    let (mut session, notifier) = seeded();
    let record = session
        .change_status(&SubmissionId::from("2"), "Accepted", None)
        .expect("change");

    let events = notifier.events.lock().expect("lock");
    assert!(events.iter().any(|event| matches!(
        event,
        SessionEvent::StatusChanged {
            id,
            status: SubmissionStatus::Accepted,
            ..
        } if *id == record.id
    )));
}

#[test]
fn sort_requests_apply_to_current_view() {
    let (mut session, _) = seeded();
    session.add(new_submission("Attention", "Zeta")).expect("add");

    session.request_sort_named("journal").expect("sort");
    let journals: Vec<_> = session
        .current_view()
        .submissions
        .into_iter()
        .map(|s| s.journal)
        .collect();
    assert_eq!(journals.first().map(String::as_str), Some("Frontiers of Financial Technology"));
    assert_eq!(journals.last().map(String::as_str), Some("Zeta"));

    let config = session.request_sort_named("journal").expect("sort");
    assert_eq!(config.direction, shared::domain::SortDirection::Desc);
    assert_eq!(session.current_view().submissions[0].journal, "Zeta");

    assert!(session.request_sort_named("status").is_err());
    session.clear_sort();
    assert_eq!(session.current_view().submissions[0].id.as_str(), "1");
}

#[test]
fn explicit_sort_is_stable_across_repeats() {
    let (mut session, _) = seeded();
    for _ in 0..2 {
        let config = session.set_sort_named("title", "desc").expect("sort");
        assert_eq!(config.direction, shared::domain::SortDirection::Desc);
    }
    assert_eq!(session.current_view().submissions[0].id.as_str(), "1");
    assert!(session.set_sort_named("title", "sideways").is_err());
}

#[test]
fn login_toggle_enforces_nothing() {
    let (mut session, _) = seeded();
    assert!(!session.is_authenticated());
    session.add(new_submission("T1", "J1")).expect("add while logged out");

    assert!(session.login().authenticated);
    assert!(!session.logout().authenticated);
}

#[test]
fn chart_follows_legend_selection() {
    let (mut session, _) = seeded();
    assert_eq!(session.chart(TimeRange::All).len(), SubmissionStatus::ALL.len());

    session.toggle_legend(SubmissionStatus::UnderReview);
    let chart = session.chart(TimeRange::All);
    assert_eq!(chart.len(), 1);
    assert_eq!(chart[0].count, 1);
    assert_eq!(session.statistics(TimeRange::All).total, 2);
}

#[tokio::test]
async fn broadcast_sender_delivers_notices() {
    let (events, mut rx) = broadcast::channel(8);
    let mut session = Session::new(SubmissionStore::new()).with_notifier(Arc::new(events));
    session.add(new_submission("T1", "J1")).expect("add");

    let first = rx.recv().await.expect("event");
    assert!(matches!(first, SessionEvent::SubmissionAdded { .. }));
    let second = rx.recv().await.expect("event");
    assert!(matches!(second, SessionEvent::Notice(_)));
}
