use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::QuizId;
use services::{
    AppServices, Clock, HttpReporter, HttpReporterConfig, InMemoryQuizSource, LocalReporter,
    QuizReporter, QuizSettings, QuizSource,
};
use tracing::info;

mod quiz_file;
mod runner;
mod telemetry;

use quiz_file::{TomlQuizSource, read_quiz};

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const HISTORY_LIMIT: u32 = 20;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidQuizId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz run     --quiz <file.toml> [--db <sqlite_url>] [--report-url <url>]");
    eprintln!("  quiz history --quiz-id <id> [--db <sqlite_url>]");
    eprintln!("  quiz reset   --quiz-id <id> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_FILE, QUIZ_REPORT_URL, QUIZ_REPORT_TOKEN, LOG_LEVEL, LOG_FORMAT");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    History,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "history" => Some(Self::History),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RunArgs {
    quiz_file: PathBuf,
    db_url: String,
    report_url: Option<String>,
}

/// Arguments shared by `history` and `reset`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QuizArgs {
    quiz_id: QuizId,
    db_url: String,
}

impl RunArgs {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url(&env);
        let mut quiz_file = env("QUIZ_FILE").map(PathBuf::from);
        let mut report_url = env("QUIZ_REPORT_URL").filter(|url| !url.trim().is_empty());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--quiz" => quiz_file = Some(PathBuf::from(require_value(args, "--quiz")?)),
                "--db" => db_url = normalize_sqlite_url(require_value(args, "--db")?),
                "--report-url" => report_url = Some(require_value(args, "--report-url")?),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            quiz_file: quiz_file.ok_or(ArgsError::MissingFlag { flag: "--quiz" })?,
            db_url,
            report_url,
        })
    }
}

impl QuizArgs {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url(&env);
        let mut quiz_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--quiz-id" => {
                    let value = require_value(args, "--quiz-id")?;
                    let parsed: QuizId = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuizId { raw: value.clone() })?;
                    quiz_id = Some(parsed);
                }
                "--db" => db_url = normalize_sqlite_url(require_value(args, "--db")?),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            quiz_id: quiz_id.ok_or(ArgsError::MissingFlag { flag: "--quiz-id" })?,
            db_url,
        })
    }
}

fn default_db_url(env: &impl Fn(&str) -> Option<String>) -> String {
    env("QUIZ_DB_URL")
        .filter(|url| !url.trim().is_empty())
        .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url)
}

fn normalize_sqlite_url(raw: String) -> String {
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

fn build_reporter(report_url: Option<String>) -> Arc<dyn QuizReporter> {
    match report_url {
        Some(endpoint) => {
            let token = std::env::var("QUIZ_REPORT_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty());
            let reporter = HttpReporter::new(HttpReporterConfig { endpoint, token });
            info!(endpoint = reporter.endpoint(), "reporting results over HTTP");
            Arc::new(reporter)
        }
        None => Arc::new(LocalReporter),
    }
}

async fn open_services(
    db_url: &str,
    source: Arc<dyn QuizSource>,
    reporter: Arc<dyn QuizReporter>,
) -> Result<AppServices, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    let services = AppServices::new_sqlite(
        db_url,
        Clock::system(),
        QuizSettings::default(),
        source,
        reporter,
    )
    .await?;
    Ok(services)
}

async fn run_command(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let quiz = read_quiz(&args.quiz_file).await?;
    let quiz_id = quiz.id();
    let source = Arc::new(TomlQuizSource::new(&args.quiz_file));
    let services = open_services(&args.db_url, source, build_reporter(args.report_url)).await?;
    runner::run_quiz(&services.quiz_loop(), quiz_id).await
}

async fn history_command(args: QuizArgs) -> Result<(), Box<dyn std::error::Error>> {
    let services = open_services(
        &args.db_url,
        Arc::new(InMemoryQuizSource::default()),
        Arc::new(LocalReporter),
    )
    .await?;
    let attempts = services.history().recent(args.quiz_id, HISTORY_LIMIT).await?;
    if attempts.is_empty() {
        println!("No attempts recorded for quiz {}.", args.quiz_id);
        return Ok(());
    }

    for item in attempts {
        println!(
            "{}  {:<9}  {:>3}%  {}/{}  {}",
            item.finished_at.format("%Y-%m-%d %H:%M"),
            item.status.as_str(),
            item.score,
            item.answered,
            item.total,
            item.attempt_id,
        );
    }
    Ok(())
}

async fn reset_command(args: QuizArgs) -> Result<(), Box<dyn std::error::Error>> {
    let services = open_services(
        &args.db_url,
        Arc::new(InMemoryQuizSource::default()),
        Arc::new(LocalReporter),
    )
    .await?;
    services.quiz_loop().clear_cached_answers(args.quiz_id).await?;
    println!("Cleared saved answers for quiz {}.", args.quiz_id);
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let rest: Vec<String> = argv.collect();
    if rest.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let env = |key: &str| std::env::var(key).ok();
    let mut rest = rest.into_iter();
    let report = |e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    };

    match cmd {
        Command::Run => run_command(RunArgs::parse(&mut rest, env).map_err(report)?).await,
        Command::History => history_command(QuizArgs::parse(&mut rest, env).map_err(report)?).await,
        Command::Reset => reset_command(QuizArgs::parse(&mut rest, env).map_err(report)?).await,
    }
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
