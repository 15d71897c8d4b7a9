use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use services::{
    CourseDraft, CourseService, CourseServiceError, OverviewError, OverviewScreen,
    format_date, format_minutes, format_time, parse_date_input, seed_demo_data,
};
use storage::repository::{AuthProvider, Storage};
use storage::sqlite::SqliteRepository;
use study_core::model::{User, UserId};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidDate { flag: &'static str, raw: String },
    InvalidHours { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDate { flag, raw } => {
                write!(f, "invalid {flag} value (expected d.m.yyyy): {raw}")
            }
            ArgsError::InvalidHours { raw } => write!(f, "invalid --hours value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- overview [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- courses  [--db <sqlite_url>] [--add <name>]");
    eprintln!("                               [--start <d.m.yyyy>] [--end <d.m.yyyy>] [--hours <n>]");
    eprintln!("  cargo run -p app -- seed     [--db <sqlite_url>] [--email <address>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://study.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Overview,
    Courses,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "overview" => Some(Self::Overview),
            "courses" => Some(Self::Courses),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    add: Option<CourseDraft>,
    email: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("STUDY_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://study.sqlite3".into(), normalize_sqlite_url);
        let mut name: Option<String> = None;
        let mut start_date = None;
        let mut end_date = None;
        let mut planned_hours = None;
        let mut email = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--add" => {
                    name = Some(require_value(args, "--add")?);
                }
                "--start" => {
                    let value = require_value(args, "--start")?;
                    start_date =
                        Some(parse_date_input(&value).ok_or(ArgsError::InvalidDate {
                            flag: "--start",
                            raw: value.clone(),
                        })?);
                }
                "--end" => {
                    let value = require_value(args, "--end")?;
                    end_date = Some(parse_date_input(&value).ok_or(ArgsError::InvalidDate {
                        flag: "--end",
                        raw: value.clone(),
                    })?);
                }
                "--hours" => {
                    let value = require_value(args, "--hours")?;
                    planned_hours = Some(
                        value
                            .parse::<u32>()
                            .map_err(|_| ArgsError::InvalidHours { raw: value.clone() })?,
                    );
                }
                "--email" => {
                    email = Some(require_value(args, "--email")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let add = name.map(|name| CourseDraft {
            name,
            start_date,
            end_date,
            planned_hours,
        });

        Ok(Self { db_url, add, email })
    }
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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

/// Make sure a signed-in identity exists before a write command runs. The
/// first row in `users` is the identity, so a fresh database gets one created
/// here.
async fn ensure_user(
    repo: &SqliteRepository,
    email: Option<String>,
) -> Result<User, Box<dyn std::error::Error>> {
    if let Some(user) = repo.current_user().await? {
        return Ok(user);
    }

    let user = User::new(UserId::new_random(), email);
    repo.save_user(&user).await?;
    Ok(user)
}

fn print_overview(screen: &OverviewScreen) {
    for aggregate in screen.aggregates() {
        println!(
            "{}: {}",
            aggregate.course.name(),
            format_minutes(aggregate.total_minutes)
        );
        for session in &aggregate.sessions {
            println!(
                "  {}  {}-{}  {}",
                format_date(session.study_date()),
                format_time(session.start_time()),
                format_time(session.end_time()),
                format_minutes(u64::from(session.duration_minutes()))
            );
        }
    }
    println!("Total: {}", format_minutes(screen.overall_minutes()));
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: the overview when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Overview,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Overview,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let repo = SqliteRepository::connect(&parsed.db_url).await?;
    repo.migrate().await?;
    // One pool; the concrete handle stays around for `ensure_user`.
    let storage = Storage {
        auth: Arc::new(repo.clone()),
        courses: Arc::new(repo.clone()),
        sessions: Arc::new(repo.clone()),
        preferences: Arc::new(repo.clone()),
    };

    match cmd {
        Command::Overview => {
            let mut screen = OverviewScreen::new(
                Arc::clone(&storage.auth),
                Arc::clone(&storage.courses),
                Arc::clone(&storage.sessions),
            );
            match screen.load().await {
                Ok(()) => {
                    print_overview(&screen);
                    Ok(())
                }
                Err(OverviewError::SignedOut) => {
                    eprintln!("no user in this database; run `seed --email <address>` first");
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        }
        Command::Courses => {
            let service =
                CourseService::new(Arc::clone(&storage.auth), Arc::clone(&storage.courses));

            if let Some(draft) = parsed.add {
                ensure_user(&repo, parsed.email).await?;
                let course = service.add_course(draft).await?;
                println!("added course: {}", course.name());
                return Ok(());
            }

            match service.list_courses().await {
                Ok(courses) => {
                    for course in courses {
                        match course.planned_hours() {
                            Some(hours) => println!("{} ({hours} h planned)", course.name()),
                            None => println!("{}", course.name()),
                        }
                    }
                    Ok(())
                }
                Err(CourseServiceError::SignedOut) => {
                    eprintln!("no user in this database; run `seed --email <address>` first");
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        }
        Command::Seed => {
            let user = ensure_user(&repo, parsed.email).await?;
            match user.email() {
                Some(email) => println!("user ready: {email}"),
                None => println!("user ready: {}", user.id()),
            }
            let seeded = seed_demo_data(&storage, Utc::now()).await?;
            if seeded.sessions > 0 {
                println!(
                    "seeded {} courses and {} sessions",
                    seeded.courses, seeded.sessions
                );
            } else {
                println!("courses already present; nothing seeded");
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
