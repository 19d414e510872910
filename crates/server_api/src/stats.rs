use std::collections::{BTreeMap, BTreeSet};

use shared::{
    domain::SubmissionStatus,
    protocol::{StatisticsSummary, StatusCount, TimeRange, TrendPoint, YearMonth},
};
use storage::Submission;

fn in_range(submission: &Submission, range: TimeRange) -> bool {
    match range {
        TimeRange::All => true,
        TimeRange::Month(month) => month.contains(submission.created_at().date_naive()),
    }
}

/// Percentage of `count` in `total`, rounded to one decimal.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

pub fn status_counts<'a>(
    submissions: impl IntoIterator<Item = &'a Submission>,
) -> Vec<StatusCount> {
    let mut counts: BTreeMap<SubmissionStatus, usize> = BTreeMap::new();
    let mut total = 0;
    for submission in submissions {
        *counts.entry(submission.status()).or_default() += 1;
        total += 1;
    }

    SubmissionStatus::ALL
        .into_iter()
        .map(|status| {
            let count = counts.get(&status).copied().unwrap_or_default();
            StatusCount {
                status,
                count,
                percentage: percentage(count, total),
            }
        })
        .collect()
}

fn point_for(points: &mut BTreeMap<YearMonth, TrendPoint>, month: YearMonth) -> &mut TrendPoint {
    points.entry(month).or_insert(TrendPoint {
        month,
        submitted: 0,
        accepted: 0,
        rejected: 0,
    })
}

/// Per-month creations and decisions, oldest month first.
pub fn monthly_trend(submissions: &[Submission]) -> Vec<TrendPoint> {
    let mut points: BTreeMap<YearMonth, TrendPoint> = BTreeMap::new();

    for submission in submissions {
        let created = YearMonth::of(submission.created_at().date_naive());
        point_for(&mut points, created).submitted += 1;
        for entry in submission.history().entries() {
            let month = YearMonth::of(entry.date);
            match entry.status {
                SubmissionStatus::Accepted => point_for(&mut points, month).accepted += 1,
                SubmissionStatus::Rejected => point_for(&mut points, month).rejected += 1,
                _ => {}
            }
        }
    }

    points.into_values().collect()
}

pub fn summarize(submissions: &[Submission], range: TimeRange) -> StatisticsSummary {
    let selected: Vec<&Submission> = submissions
        .iter()
        .filter(|s| in_range(s, range))
        .collect();
    let trend = monthly_trend(submissions);
    let available_ranges = std::iter::once(TimeRange::All)
        .chain(trend.iter().map(|point| TimeRange::Month(point.month)))
        .collect();

    StatisticsSummary {
        range,
        total: selected.len(),
        by_status: status_counts(selected),
        trend,
        available_ranges,
    }
}

/// Statuses currently shown by the chart legend. Empty means all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegendSelection {
    active: BTreeSet<SubmissionStatus>,
}

impl LegendSelection {
    pub fn toggle(&mut self, status: SubmissionStatus) {
        if !self.active.remove(&status) {
            self.active.insert(status);
        }
    }

    pub fn is_visible(&self, status: SubmissionStatus) -> bool {
        self.active.is_empty() || self.active.contains(&status)
    }

    pub fn active(&self) -> impl Iterator<Item = SubmissionStatus> + '_ {
        self.active.iter().copied()
    }

    pub fn chart_slice<'a>(&self, counts: &'a [StatusCount]) -> Vec<&'a StatusCount> {
        counts
            .iter()
            .filter(|count| self.is_visible(count.status))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/stats_tests.rs"]
mod tests;
