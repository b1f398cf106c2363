use std::fmt;
use std::path::PathBuf;

use progress_core::model::{AssessmentId, BlockId, LessonId, StudentId, UnitId};

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnexpectedArgument(String),
    UnknownArg(String),
    UnknownCommand(String),
    InvalidId { name: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    MissingCourse,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnexpectedArgument(arg) => write!(f, "unexpected argument: {arg}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidId { name, raw } => write!(f, "invalid <{name}> value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingCourse => {
                write!(f, "a course outline is required (--course or PROGRESS_COURSE)")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Video { unit: UnitId, lesson: LessonId },
    Activity { unit: UnitId, lesson: LessonId },
    Accessed { unit: UnitId, lesson: LessonId },
    Block { unit: UnitId, lesson: LessonId, block: BlockId },
    Assessment { id: AssessmentId },
    Event { entity: String, key: String },
    Units,
    Lessons { unit: UnitId },
    Dump,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub course: PathBuf,
    pub student: StudentId,
    pub command: Command,
}

/// Environment fallbacks for the global flags.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub db_url: Option<String>,
    pub course: Option<String>,
    pub student: Option<String>,
}

impl Env {
    pub fn from_process() -> Self {
        Self {
            db_url: std::env::var("PROGRESS_DB_URL").ok(),
            course: std::env::var("PROGRESS_COURSE").ok(),
            student: std::env::var("PROGRESS_STUDENT_ID").ok(),
        }
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  progress <command> [--db <sqlite_url>] [--course <file>] [--student <id>]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  video <unit> <lesson>          record a watched video");
    eprintln!("  activity <unit> <lesson>       record a completed activity");
    eprintln!("  accessed <unit> <lesson>       record an opened activity");
    eprintln!("  block <unit> <lesson> <block>  record an answered block");
    eprintln!("  assessment <id>                record a completed assessment");
    eprintln!("  event <entity> <key>           record by entity name and stored key");
    eprintln!("  units                          show unit and assessment status");
    eprintln!("  lessons <unit>                 show lesson status of a unit");
    eprintln!("  dump                           show every stored progress entry");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:progress.sqlite3");
    eprintln!("  --student 1");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PROGRESS_DB_URL, PROGRESS_COURSE, PROGRESS_STUDENT_ID, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId {
        name,
        raw: raw.to_owned(),
    })
}

/// Consumes positional arguments in order.
struct Positionals(std::vec::IntoIter<String>);

impl Positionals {
    fn next(&mut self, name: &'static str) -> Result<String, ArgsError> {
        self.0.next().ok_or(ArgsError::MissingArgument { name })
    }

    fn id<T: std::str::FromStr>(&mut self, name: &'static str) -> Result<T, ArgsError> {
        let raw = self.next(name)?;
        parse_id(name, &raw)
    }

    fn finish(mut self) -> Result<(), ArgsError> {
        match self.0.next() {
            Some(extra) => Err(ArgsError::UnexpectedArgument(extra)),
            None => Ok(()),
        }
    }
}

impl Args {
    /// Parse arguments (without the program name), falling back to `env`.
    ///
    /// Returns `Ok(None)` when help was requested.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env: &Env,
    ) -> Result<Option<Self>, ArgsError> {
        let mut db_url = env
            .db_url
            .clone()
            .unwrap_or_else(|| "sqlite:progress.sqlite3".into());
        let mut course = env.course.clone();
        let mut student = match env.student.as_deref() {
            Some(raw) => parse_id("student", raw)?,
            None => StudentId::new(1),
        };

        let mut positionals = Vec::new();
        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--course" => course = Some(require_value(&mut args, "--course")?),
                "--student" => {
                    let value = require_value(&mut args, "--student")?;
                    student = parse_id("student", &value)?;
                }
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positionals.push(arg),
            }
        }

        let mut positionals = Positionals(positionals.into_iter());
        let command = match positionals.0.next() {
            None => return Ok(None),
            Some(name) => Self::parse_command(&name, &mut positionals)?,
        };
        positionals.finish()?;

        Ok(Some(Self {
            db_url: normalize_sqlite_url(db_url),
            course: course.map(PathBuf::from).ok_or(ArgsError::MissingCourse)?,
            student,
            command,
        }))
    }

    fn parse_command(name: &str, rest: &mut Positionals) -> Result<Command, ArgsError> {
        let command = match name {
            "video" => Command::Video {
                unit: rest.id("unit")?,
                lesson: rest.id("lesson")?,
            },
            "activity" => Command::Activity {
                unit: rest.id("unit")?,
                lesson: rest.id("lesson")?,
            },
            "accessed" => Command::Accessed {
                unit: rest.id("unit")?,
                lesson: rest.id("lesson")?,
            },
            "block" => Command::Block {
                unit: rest.id("unit")?,
                lesson: rest.id("lesson")?,
                block: rest.id("block")?,
            },
            "assessment" => Command::Assessment {
                id: rest.id("assessment")?,
            },
            "event" => Command::Event {
                entity: rest.next("entity")?,
                key: rest.next("key")?,
            },
            "units" => Command::Units,
            "lessons" => Command::Lessons {
                unit: rest.id("unit")?,
            },
            "dump" => Command::Dump,
            other => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };
        Ok(command)
    }
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| (*arg).to_string()).collect()
    }

    fn env() -> Env {
        Env {
            db_url: Some("sqlite::memory:".into()),
            course: Some("course.json".into()),
            student: None,
        }
    }

    #[test]
    fn parses_block_command_with_flags() {
        let args = Args::parse(argv(&["block", "1", "2", "3", "--student", "7"]), &env())
            .unwrap()
            .unwrap();
        assert_eq!(
            args.command,
            Command::Block {
                unit: UnitId::new(1),
                lesson: LessonId::new(2),
                block: BlockId::new(3),
            }
        );
        assert_eq!(args.student, StudentId::new(7));
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.course, PathBuf::from("course.json"));
    }

    #[test]
    fn flags_override_environment() {
        let args = Args::parse(
            argv(&["--course", "other.json", "--db", "sqlite:///tmp/p.db", "units"]),
            &env(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(args.course, PathBuf::from("other.json"));
        assert_eq!(args.db_url, "sqlite:///tmp/p.db");
        assert_eq!(args.command, Command::Units);
    }

    #[test]
    fn help_and_empty_argv_print_usage() {
        assert_eq!(Args::parse(argv(&[]), &env()).unwrap(), None);
        assert_eq!(Args::parse(argv(&["units", "-h"]), &env()).unwrap(), None);
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!(
            Args::parse(argv(&["lessons"]), &env()).unwrap_err(),
            ArgsError::MissingArgument { name: "unit" }
        );
        assert_eq!(
            Args::parse(argv(&["lessons", "x"]), &env()).unwrap_err(),
            ArgsError::InvalidId {
                name: "unit",
                raw: "x".into()
            }
        );
        assert_eq!(
            Args::parse(argv(&["dump", "extra"]), &env()).unwrap_err(),
            ArgsError::UnexpectedArgument("extra".into())
        );
        assert_eq!(
            Args::parse(argv(&["assessment", "a.b"]), &env()).unwrap_err(),
            ArgsError::InvalidId {
                name: "assessment",
                raw: "a.b".into()
            }
        );
        assert_eq!(
            Args::parse(argv(&["units"]), &Env::default()).unwrap_err(),
            ArgsError::MissingCourse
        );
    }

    #[test]
    fn event_keeps_raw_entity_and_key() {
        let args = Args::parse(argv(&["event", "quiz", "q.1"]), &env())
            .unwrap()
            .unwrap();
        assert_eq!(
            args.command,
            Command::Event {
                entity: "quiz".into(),
                key: "q.1".into()
            }
        );
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:progress.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("progress.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
