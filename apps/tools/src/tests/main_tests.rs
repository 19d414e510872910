use super::*;
use storage::SubmissionReader;

fn seeded_session() -> Session {
    let mut store = SubmissionStore::new();
    seed::seed_demo(&mut store).expect("seed");
    Session::new(store)
}

#[test]
fn replay_script_parses_every_step_kind() {
    let steps: Vec<Step> = serde_json::from_str(
        r#"[
            {"op": "add", "title": "T1", "journal": "J1", "authors": "A, B"},
            {"op": "change_status", "id": "1", "status": "Accepted"},
            {"op": "remove", "id": "2"},
            {"op": "filter", "status": "all"},
            {"op": "sort", "key": "journal"}
        ]"#,
    )
    .expect("script");
    assert_eq!(steps.len(), 5);
    assert!(matches!(&steps[0], Step::Add(input) if input.title == "T1"));
    assert!(matches!(&steps[1], Step::ChangeStatus { notes: None, .. }));
}

#[test]
fn replay_steps_drive_the_session() {
    let mut session = seeded_session();
    apply(
        &mut session,
        Step::ChangeStatus {
            id: "1".into(),
            status: "MajorRevision".into(),
            notes: Some("extra ablations".into()),
        },
    )
    .expect("change");
    apply(&mut session, Step::Remove { id: "2".into() }).expect("remove");
    apply(
        &mut session,
        Step::Filter {
            status: "MajorRevision".into(),
        },
    )
    .expect("filter");

    let view = session.current_view();
    assert_eq!(view.submissions.len(), 1);
    assert_eq!(view.submissions[0].status_history.len(), 3);
    assert_eq!(session.reader().len(), 1);
}

#[test]
fn failing_step_reports_error_code() {
    let mut session = seeded_session();
    let err = apply(
        &mut session,
        Step::ChangeStatus {
            id: "1".into(),
            status: "Pending".into(),
            notes: None,
        },
    )
    .expect_err("invalid status");
    assert!(err.to_string().contains("InvalidStatus"));
}
