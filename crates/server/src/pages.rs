//! Server-rendered HTML for the landing, submissions and statistics views.

use std::{fmt::Write as _, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use server_api::{stats::LegendSelection, view::SortState};
use shared::{
    domain::{SortKey, StatusFilter, SubmissionId, SubmissionRecord, SubmissionStatus},
    protocol::{
        NewSubmission, Notice, NoticeLevel, StatisticsSummary, StatusCount, SubmissionView,
        TimeRange,
    },
};
use tracing::warn;

use crate::{api::parse_range, app_state::AppState};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubmissionsQuery {
    status: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatisticsQuery {
    range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LegendForm {
    status: String,
    #[serde(default)]
    range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusForm {
    #[serde(default)]
    status: String,
    #[serde(default)]
    notes: Option<String>,
}

pub(crate) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(landing))
        .route("/submissions", get(submissions_page).post(submit_form))
        .route("/submissions/:id/status", post(status_form))
        .route("/submissions/:id/delete", post(delete_form))
        .route("/statistics", get(statistics_page))
        .route("/statistics/legend", post(legend_form))
}

async fn landing(State(state): State<Arc<AppState>>) -> Html<String> {
    let authenticated = state.session.lock().await.is_authenticated();
    let mut body = String::new();
    body.push_str("<section class=\"hero\"><h1>Submission tracker</h1>");
    body.push_str("<p>Track every manuscript from submission to decision.</p>");
    body.push_str("<a class=\"button\" href=\"/submissions\">Start managing submissions</a>");
    if authenticated {
        body.push_str("<p class=\"muted\">Signed in</p>");
    }
    body.push_str("</section>");
    Html(layout("Submission tracker", None, &body))
}

async fn submissions_page(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SubmissionsQuery>,
) -> Html<String> {
    let mut problems = Vec::new();
    let view = {
        let mut session = state.session.lock().await;
        if let Some(raw) = q.status.as_deref() {
            if let Err(error) = session.set_filter_named(raw) {
                problems.push(error.message);
            }
        }
        if let Some(raw) = q.sort.as_deref() {
            let direction = q.dir.as_deref().unwrap_or("asc");
            if let Err(error) = session.set_sort_named(raw, direction) {
                problems.push(error.message);
            }
        }
        session.current_view()
    };

    let flash = if problems.is_empty() {
        state.notifier.take_flash()
    } else {
        warn!(?problems, "ignored submissions view parameters");
        Some(Notice::error(problems.join("; ")))
    };
    Html(layout("Submissions", flash.as_ref(), &render_submissions(&view)))
}

async fn submit_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<NewSubmission>,
) -> Redirect {
    // Outcome is reported through the flash notice.
    let mut session = state.session.lock().await;
    state.notifier.flash_next_notice();
    let _ = session.add(form);
    Redirect::to("/submissions")
}

async fn status_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Redirect {
    let mut session = state.session.lock().await;
    state.notifier.flash_next_notice();
    let _ = session.change_status(&SubmissionId(id), &form.status, form.notes);
    Redirect::to("/submissions")
}

async fn delete_form(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Redirect {
    let mut session = state.session.lock().await;
    state.notifier.flash_next_notice();
    let _ = session.remove(&SubmissionId(id));
    Redirect::to("/submissions")
}

async fn legend_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LegendForm>,
) -> Redirect {
    match form.status.parse::<SubmissionStatus>() {
        Ok(status) => state.session.lock().await.toggle_legend(status),
        Err(error) => {
            warn!(status = %form.status, "ignored legend toggle");
            state.notifier.set_flash(Notice::error(error.message));
        }
    }
    let range = parse_range(form.range.as_deref()).unwrap_or_default();
    Redirect::to(&format!("/statistics?range={range}"))
}

async fn statistics_page(
    State(state): State<Arc<AppState>>,
    Query(q): Query<StatisticsQuery>,
) -> Html<String> {
    let (range, flash) = match parse_range(q.range.as_deref()) {
        Ok(range) => (range, state.notifier.take_flash()),
        Err(error) => (TimeRange::default(), Some(Notice::error(error.message))),
    };

    let (summary, chart, legend) = {
        let session = state.session.lock().await;
        (
            session.statistics(range),
            session.chart(range),
            session.legend().clone(),
        )
    };

    Html(layout(
        "Statistics",
        flash.as_ref(),
        &render_statistics(&summary, &chart, &legend),
    ))
}

pub(crate) fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, flash: Option<&Notice>, body: &str) -> String {
    let mut page = String::new();
    let _ = write!(
        page,
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{STYLE}</style></head><body>\
         <nav><a href=\"/\">Submission tracker</a><a href=\"/submissions\">Submissions</a>\
         <a href=\"/statistics\">Statistics</a></nav><main>",
        escape(title)
    );
    if let Some(notice) = flash {
        let class = match notice.level {
            NoticeLevel::Success => "notice success",
            NoticeLevel::Error => "notice error",
        };
        let _ = write!(page, "<div class=\"{class}\">{}</div>", escape(&notice.message));
    }
    page.push_str(body);
    page.push_str("</main></body></html>");
    page
}

const STYLE: &str = "body{font-family:sans-serif;background:#f9fafb;color:#2c3e50;margin:0}\
nav{background:#2c3e50;padding:12px}nav a{color:#fff;margin-right:16px;text-decoration:none}\
main{padding:24px}table{border-collapse:collapse;width:100%;background:#fff}\
td,th{padding:8px;border-bottom:1px solid #e5e7eb;text-align:left;vertical-align:top}\
.notice{padding:8px;margin-bottom:16px;border-radius:4px}.success{background:#dcfce7}\
.error{background:#fee2e2}.muted{color:#6b7280}.filters a{margin-right:8px}\
.filters .active{font-weight:bold}.legend{display:inline}.bar{height:16px;display:inline-block}\
.badge{padding:2px 8px;border-radius:999px;color:#1f2937}\
.button{background:#3498db;color:#fff;padding:8px 16px;border-radius:4px;text-decoration:none}";

/// Header links carry the direction they select, so following one twice
/// lands on the same ordering.
fn sort_header(view: &SubmissionView, key: SortKey, label: &str) -> String {
    let arrow = view
        .sort
        .filter(|config| config.key == key)
        .map(|config| config.direction.arrow())
        .unwrap_or_default();
    let next = SortState::from(view.sort).next(key);
    format!(
        "<th><a href=\"/submissions?sort={}&amp;dir={}\">{label} {arrow}</a></th>",
        next.key, next.direction
    )
}

fn status_badge(status: SubmissionStatus) -> String {
    format!(
        "<span class=\"badge\" style=\"background:{}\">{}</span>",
        status.color(),
        status.label()
    )
}

fn render_row(out: &mut String, record: &SubmissionRecord) {
    let id = escape(record.id.as_str());
    let _ = write!(
        out,
        "<tr><td><details><summary><strong>{}</strong><br><span class=\"muted\">{}</span></summary>\
         <h4>Status history</h4><ul>",
        escape(&record.title),
        escape(&record.authors.join(", "))
    );
    for entry in &record.status_history {
        let _ = write!(out, "<li><strong>{}:</strong> {}", entry.date, entry.status.label());
        if let Some(notes) = &entry.notes {
            let _ = write!(out, "<div class=\"muted\">{}</div>", escape(notes));
        }
        out.push_str("</li>");
    }
    let _ = write!(
        out,
        "</ul><form method=\"post\" action=\"/submissions/{id}/status\"><select name=\"status\">"
    );
    for status in SubmissionStatus::ALL {
        let selected = if status == record.status { " selected" } else { "" };
        let _ = write!(
            out,
            "<option value=\"{}\"{selected}>{}</option>",
            status.as_str(),
            status.label()
        );
    }
    out.push_str(
        "</select><input name=\"notes\" placeholder=\"Notes\"><button>Update</button></form>\
         </details></td>",
    );

    let _ = write!(
        out,
        "<td>{}</td><td>{}</td><td>{}</td>",
        escape(&record.journal),
        escape(record.submission_id.as_deref().unwrap_or_default()),
        status_badge(record.status)
    );
    match &record.tracking_link {
        Some(link) => {
            let _ = write!(
                out,
                "<td><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Track</a></td>",
                escape(link)
            );
        }
        None => out.push_str("<td></td>"),
    }
    let _ = write!(
        out,
        "<td><form method=\"post\" action=\"/submissions/{id}/delete\">\
         <button>Delete</button></form></td></tr>"
    );
}

pub(crate) fn render_submissions(view: &SubmissionView) -> String {
    let mut out = String::from("<h1>Submissions</h1><div class=\"filters\">");
    let filters = std::iter::once(StatusFilter::All)
        .chain(SubmissionStatus::ALL.into_iter().map(StatusFilter::Only));
    for filter in filters {
        let label = match filter {
            StatusFilter::All => "All statuses",
            StatusFilter::Only(status) => status.label(),
        };
        let class = if filter == view.filter { " class=\"active\"" } else { "" };
        let _ = write!(out, "<a{class} href=\"/submissions?status={filter}\">{label}</a>");
    }
    out.push_str("</div><table><thead><tr>");
    out.push_str(&sort_header(view, SortKey::Title, "Title"));
    out.push_str(&sort_header(view, SortKey::Journal, "Journal"));
    out.push_str(&sort_header(view, SortKey::SubmissionId, "Submission ID"));
    out.push_str("<th>Status</th><th>Tracking</th><th></th></tr></thead><tbody>");
    for record in &view.submissions {
        render_row(&mut out, record);
    }
    if view.submissions.is_empty() {
        out.push_str("<tr><td colspan=\"6\" class=\"muted\">No submissions</td></tr>");
    }
    out.push_str("</tbody></table>");

    out.push_str(
        "<h2>Add submission</h2><form method=\"post\" action=\"/submissions\">\
         <p><input name=\"title\" placeholder=\"Title *\"></p>\
         <p><input name=\"authors\" placeholder=\"Authors (comma separated)\"></p>\
         <p><input name=\"journal\" placeholder=\"Journal *\"></p>\
         <p><input name=\"submissionId\" placeholder=\"Submission ID\"></p>\
         <p><input name=\"trackingLink\" placeholder=\"Tracking link\"></p>\
         <p><select name=\"status\">",
    );
    for status in SubmissionStatus::ALL {
        let _ = write!(out, "<option value=\"{}\">{}</option>", status.as_str(), status.label());
    }
    out.push_str("</select></p><p><button>Add</button></p></form>");
    out
}

pub(crate) fn render_statistics(
    summary: &StatisticsSummary,
    chart: &[StatusCount],
    legend: &LegendSelection,
) -> String {
    let mut out = String::from("<h1>Statistics</h1><div class=\"filters\">");
    for range in &summary.available_ranges {
        let class = if *range == summary.range { " class=\"active\"" } else { "" };
        let label = match range {
            TimeRange::All => "All time".to_string(),
            TimeRange::Month(month) => month.to_string(),
        };
        let _ = write!(out, "<a{class} href=\"/statistics?range={range}\">{label}</a>");
    }
    let _ = write!(
        out,
        "</div><p>Total submissions: <strong>{}</strong></p><h2>Status distribution</h2><table>",
        summary.total
    );
    for entry in chart {
        let _ = write!(
            out,
            "<tr><td>{}</td><td><span class=\"bar\" style=\"width:{}%;background:{}\"></span></td>\
             <td>{} ({}%)</td></tr>",
            entry.status.label(),
            entry.percentage,
            entry.status.color(),
            entry.count,
            entry.percentage
        );
    }
    out.push_str("</table><div class=\"filters\">Legend: ");
    for status in SubmissionStatus::ALL {
        let class = if legend.is_visible(status) { " class=\"active\"" } else { "" };
        let _ = write!(
            out,
            "<form class=\"legend\" method=\"post\" action=\"/statistics/legend\">\
             <input type=\"hidden\" name=\"range\" value=\"{}\">\
             <button{class} name=\"status\" value=\"{}\">{}</button></form>",
            summary.range,
            status.as_str(),
            status.label()
        );
    }
    out.push_str(
        "</div><h2>Recent trend</h2><table><tr><th>Month</th><th>Submitted</th>\
         <th>Accepted</th><th>Rejected</th></tr>",
    );
    for point in &summary.trend {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            point.month, point.submitted, point.accepted, point.rejected
        );
    }
    out.push_str("</table>");
    out
}

#[cfg(test)]
#[path = "tests/pages_tests.rs"]
mod tests;
