use crate::{
    domain::{SortDirection, SortKey, StatusFilter, SubmissionStatus},
    error::ErrorCode,
    protocol::{NewSubmission, TimeRange, YearMonth},
};

#[test]
fn status_parsing_is_exact() {
    assert_eq!(
        "UnderReview".parse::<SubmissionStatus>().expect("status"),
        SubmissionStatus::UnderReview
    );
    for raw in ["underreview", " UnderReview", "Under review", ""] {
        let err = raw.parse::<SubmissionStatus>().expect_err("should fail");
        assert_eq!(err.code, ErrorCode::InvalidStatus);
    }
}

#[test]
fn status_serializes_as_variant_name() {
    let json = serde_json::to_string(&SubmissionStatus::MinorRevision).expect("json");
    assert_eq!(json, "\"MinorRevision\"");
}

#[test]
fn filter_parses_all_sentinel_and_statuses() {
    assert_eq!("all".parse::<StatusFilter>().expect("all"), StatusFilter::All);
    assert_eq!(
        "Accepted".parse::<StatusFilter>().expect("accepted"),
        StatusFilter::Only(SubmissionStatus::Accepted)
    );
    assert!("All".parse::<StatusFilter>().is_err());
    assert!(StatusFilter::All.matches(SubmissionStatus::Rejected));
    assert!(!StatusFilter::Only(SubmissionStatus::Accepted).matches(SubmissionStatus::Rejected));
}

#[test]
fn sort_key_parses_field_names() {
    assert_eq!("submissionId".parse::<SortKey>().expect("key"), SortKey::SubmissionId);
    let err = "authors".parse::<SortKey>().expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[test]
fn time_range_round_trips_through_text() {
    let range: TimeRange = "2023-02".parse().expect("range");
    assert_eq!(range, TimeRange::Month(YearMonth { year: 2023, month: 2 }));
    assert_eq!(range.to_string(), "2023-02");
    assert!("2023-13".parse::<TimeRange>().is_err());
    assert!("feb".parse::<TimeRange>().is_err());
}

#[test]
fn new_submission_accepts_missing_fields() {
    let input: NewSubmission =
        serde_json::from_value(serde_json::json!({ "journal": "J1" })).expect("json");
    assert!(input.title.is_empty());
    assert!(input.status.is_none());
    assert!(input.authors.is_empty());
    assert!(input.submission_id.is_none());

    let input: NewSubmission =
        serde_json::from_value(serde_json::json!({ "status": "Withdrawn" })).expect("json");
    assert_eq!(input.status.as_deref(), Some("Withdrawn"));
}

#[test]
fn sort_direction_round_trips_through_text() {
    assert_eq!("desc".parse::<SortDirection>().expect("dir"), SortDirection::Desc);
    assert_eq!(SortDirection::Asc.to_string(), "asc");
    let err = "down".parse::<SortDirection>().expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}
