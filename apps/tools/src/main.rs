use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use server_api::Session;
use shared::{
    domain::{SubmissionId, SubmissionRecord, SubmissionStatus},
    protocol::{NewSubmission, TimeRange},
};
use storage::{seed, SubmissionStore, TransitionPolicy};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Inspect and script an in-memory submission session")]
struct Cli {
    /// Start from an empty store instead of the demo submissions.
    #[arg(long)]
    no_seed: bool,
    /// Only allow forward workflow transitions.
    #[arg(long)]
    strict: bool,
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long, default_value = "all")]
        status: String,
        /// Repeat to toggle direction, e.g. `--sort title --sort title`.
        #[arg(long)]
        sort: Vec<String>,
    },
    Show {
        id: String,
    },
    Stats {
        #[arg(long, default_value = "all")]
        range: String,
    },
    Statuses,
    /// Applies a JSON array of steps and prints the resulting view.
    Replay {
        script: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Add(NewSubmission),
    ChangeStatus {
        id: String,
        status: String,
        #[serde(default)]
        notes: Option<String>,
    },
    Remove {
        id: String,
    },
    Filter {
        status: String,
    },
    Sort {
        key: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let policy = if cli.strict {
        TransitionPolicy::forward()
    } else {
        TransitionPolicy::Free
    };
    let mut store = SubmissionStore::new().with_policy(policy.clone());
    if !cli.no_seed {
        seed::seed_demo(&mut store)?;
    }
    let mut session = Session::new(store);

    match cli.command {
        Command::List { status, sort } => {
            session.set_filter_named(&status).map_err(api_error)?;
            for key in &sort {
                session.request_sort_named(key).map_err(api_error)?;
            }
            print_records(&session.current_view().submissions, cli.json)?;
        }
        Command::Show { id } => {
            let record = session.get(&SubmissionId(id)).map_err(api_error)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record(&record);
                for entry in &record.status_history {
                    match &entry.notes {
                        Some(notes) => println!("  {} {} ({notes})", entry.date, entry.status),
                        None => println!("  {} {}", entry.date, entry.status),
                    }
                }
            }
        }
        Command::Stats { range } => {
            let range = range.parse::<TimeRange>().map_err(|e| anyhow::anyhow!(e))?;
            let summary = session.statistics(range);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("total={} range={}", summary.total, summary.range);
                for entry in &summary.by_status {
                    println!("{:<14} {:>3} {:>5}%", entry.status, entry.count, entry.percentage);
                }
                for point in &summary.trend {
                    println!(
                        "{} submitted={} accepted={} rejected={}",
                        point.month, point.submitted, point.accepted, point.rejected
                    );
                }
            }
        }
        Command::Statuses => {
            for status in SubmissionStatus::ALL {
                let targets: Vec<_> = policy
                    .allowed_targets(status)
                    .into_iter()
                    .map(|s| s.as_str())
                    .collect();
                println!("{status} -> {}", targets.join(", "));
            }
        }
        Command::Replay { script } => {
            let raw = fs::read_to_string(&script)
                .with_context(|| format!("failed to read '{}'", script.display()))?;
            let steps: Vec<Step> = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse '{}'", script.display()))?;
            for (index, step) in steps.into_iter().enumerate() {
                debug!(step = index + 1, ?step, "applying replay step");
                apply(&mut session, step)
                    .with_context(|| format!("step {} failed", index + 1))?;
            }
            print_records(&session.current_view().submissions, cli.json)?;
        }
    }

    Ok(())
}

fn apply(session: &mut Session, step: Step) -> Result<()> {
    match step {
        Step::Add(input) => {
            let record = session.add(input).map_err(api_error)?;
            println!("added id={}", record.id);
        }
        Step::ChangeStatus { id, status, notes } => {
            session
                .change_status(&SubmissionId(id), &status, notes)
                .map_err(api_error)?;
        }
        Step::Remove { id } => session.remove(&SubmissionId(id)).map_err(api_error)?,
        Step::Filter { status } => {
            session.set_filter_named(&status).map_err(api_error)?;
        }
        Step::Sort { key } => {
            session.request_sort_named(&key).map_err(api_error)?;
        }
    }
    Ok(())
}

fn api_error(error: shared::error::ApiError) -> anyhow::Error {
    anyhow::anyhow!("{:?}: {}", error.code, error.message)
}

fn print_records(records: &[SubmissionRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }
    for record in records {
        print_record(record);
    }
    Ok(())
}

fn print_record(record: &SubmissionRecord) {
    println!(
        "{}  {:<14} {}  [{}] {}",
        record.id,
        record.status.as_str(),
        record.title,
        record.journal,
        record.submission_id.as_deref().unwrap_or("-")
    );
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
