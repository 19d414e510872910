use chrono::{DateTime, NaiveDate, Utc};
use shared::domain::{StatusHistoryItem, SubmissionId, SubmissionRecord, SubmissionStatus};

use crate::{StoreError, SubmissionStore};

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

fn entry(status: SubmissionStatus, date: NaiveDate, notes: Option<&str>) -> StatusHistoryItem {
    StatusHistoryItem {
        status,
        date,
        notes: notes.map(str::to_string),
    }
}

/// Demo submissions a fresh session starts with.
pub fn demo_records() -> Vec<SubmissionRecord> {
    use SubmissionStatus::*;

    vec![
        SubmissionRecord {
            id: SubmissionId::from("1"),
            title: "Deep learning for medical image analysis".into(),
            authors: vec!["Zhang San".into(), "Li Si".into()],
            journal: "Journal of Medical Artificial Intelligence".into(),
            submission_id: Some("MEDAI-2023-001".into()),
            tracking_link: Some("https://example.com/track/1".into()),
            status: UnderReview,
            status_history: vec![
                entry(Submitted, day(2023, 1, 1), None),
                entry(UnderReview, day(2023, 1, 15), None),
            ],
            created_at: midnight(day(2023, 1, 1)),
            updated_at: midnight(day(2023, 1, 15)),
        },
        SubmissionRecord {
            id: SubmissionId::from("2"),
            title: "Blockchain applications in finance".into(),
            authors: vec!["Wang Wu".into(), "Zhao Liu".into(), "Qian Qi".into()],
            journal: "Frontiers of Financial Technology".into(),
            submission_id: Some("FINTECH-2023-002".into()),
            tracking_link: Some("https://example.com/track/2".into()),
            status: MinorRevision,
            status_history: vec![
                entry(Submitted, day(2023, 2, 1), None),
                entry(UnderReview, day(2023, 2, 15), None),
                entry(
                    MinorRevision,
                    day(2023, 3, 1),
                    Some("additional experimental data required"),
                ),
            ],
            created_at: midnight(day(2023, 2, 1)),
            updated_at: midnight(day(2023, 3, 1)),
        },
    ]
}

pub fn seed_demo(store: &mut SubmissionStore) -> Result<usize, StoreError> {
    let records = demo_records();
    let count = records.len();
    for record in records {
        store.restore(record)?;
    }
    Ok(count)
}
