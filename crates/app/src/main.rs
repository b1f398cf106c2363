mod args;

use std::sync::Arc;

use progress_core::model::CourseOutline;
use progress_core::{CompletionState, LessonProgress, UnitProgress};
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, ArgsError, Command, Env, print_usage};

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let Some(parsed) = Args::parse(std::env::args().skip(1), &Env::from_process())? else {
        print_usage();
        return Ok(());
    };

    let outline = std::fs::read_to_string(&parsed.course)?;
    let outline = Arc::new(CourseOutline::from_json(&outline)?);

    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), outline).await?;
    let progress = services.progress();
    let student = parsed.student;

    match parsed.command {
        Command::Video { unit, lesson } => {
            progress.record_video_completed(student, unit, lesson).await?;
        }
        Command::Activity { unit, lesson } => {
            progress
                .record_activity_completed(student, unit, lesson)
                .await?;
        }
        Command::Accessed { unit, lesson } => {
            progress.record_activity_accessed(student, unit, lesson).await?;
        }
        Command::Block {
            unit,
            lesson,
            block,
        } => {
            progress
                .record_block_completed(student, unit, lesson, block)
                .await?;
        }
        Command::Assessment { id } => {
            progress.record_assessment_completed(student, id).await?;
        }
        Command::Event { entity, key } => {
            progress.record_named(student, &entity, &key).await?;
        }
        Command::Units => {
            for entry in progress.unit_progress(student).await? {
                match entry {
                    UnitProgress::Unit { id, state } => {
                        println!("unit {id}\t{}", state_label(state));
                    }
                    UnitProgress::Assessment { id, completed } => {
                        let label = if completed { "completed" } else { "not started" };
                        println!("assessment {id}\t{label}");
                    }
                }
            }
        }
        Command::Lessons { unit } => {
            for LessonProgress { id, state } in progress.lesson_progress(student, unit).await? {
                println!("lesson {id}\t{}", state_label(state));
            }
        }
        Command::Dump => {
            let record = progress.progress(student).await?;
            for (key, value) in record.progress().entries() {
                println!("{key}\t{value}");
            }
            if let Some(updated_on) = record.updated_on() {
                println!("# updated {}", updated_on.to_rfc3339());
            }
        }
    }

    Ok(())
}

fn state_label(state: CompletionState) -> &'static str {
    match state {
        CompletionState::NotStarted => "not started",
        CompletionState::InProgress => "in progress",
        CompletionState::Completed => "completed",
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
