use std::fmt;
use std::str::FromStr;

use services::session::SessionView;
use services::{AppServices, Clock};
use training_core::catalog;
use training_core::model::{
    AnswerSheet, ModuleKey, ModuleOutline, QuizQuestion, Section, UserId,
};
use uuid::Uuid;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidModule { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidModule { raw } => write!(f, "invalid --module value: {raw}"),
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
    eprintln!("  cargo run -p app -- overview [--db <sqlite_url>] [--user <uuid>]");
    eprintln!("  cargo run -p app -- read     [--db <sqlite_url>] [--user <uuid>] [--module <key>]");
    eprintln!("  cargo run -p app -- quiz     [--db <sqlite_url>] [--user <uuid>] [--module <key>]");
    eprintln!("  cargo run -p app -- badges");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:training.sqlite3");
    eprintln!("  --user $TRAINING_USER_ID (a fresh uuid otherwise)");
    eprintln!("  --module residential");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TRAINING_DB_URL, TRAINING_USER_ID");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Overview,
    Read,
    Quiz,
    Badges,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "overview" => Some(Self::Overview),
            "read" => Some(Self::Read),
            "quiz" => Some(Self::Quiz),
            "badges" => Some(Self::Badges),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    user: UserId,
    module: ModuleKey,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TRAINING_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://training.sqlite3".into(), normalize_sqlite_url);
        let mut user = std::env::var("TRAINING_USER_ID")
            .ok()
            .and_then(|value| UserId::from_str(&value).ok())
            .unwrap_or_else(|| UserId::new(Uuid::new_v4()));
        let mut module = ModuleKey::from_static("residential");

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    user = UserId::from_str(&value)
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                }
                "--module" => {
                    let value = require_value(args, "--module")?;
                    module = ModuleKey::new(value.clone())
                        .map_err(|_| ArgsError::InvalidModule { raw: value })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user,
            module,
        })
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

/// Built-in walkthrough content so the binary is usable against an empty
/// database.
fn demo_outline(key: &ModuleKey) -> Result<ModuleOutline, Box<dyn std::error::Error>> {
    let sections = vec![
        Section::new(
            "Walk the job",
            "Greet the customer, walk every room on the work order, and note \
             pre-existing damage before bringing in equipment.",
            Vec::new(),
        )?,
        Section::new(
            "Prepare the area",
            "Move light furniture, protect legs with tabs, and dry-vacuum \
             high-traffic lanes before any water touches the fiber.",
            Vec::new(),
        )?,
        Section::new(
            "Clean and groom",
            "Pre-spray, agitate, extract with overlapping passes, then groom \
             the pile and place air movers.",
            Vec::new(),
        )?,
    ];
    Ok(ModuleOutline::new(
        key.clone(),
        "Module walkthrough",
        "Core procedure for this module, start to finish.",
        sections,
    )?)
}

fn demo_questions() -> Result<Vec<QuizQuestion>, Box<dyn std::error::Error>> {
    Ok(vec![
        QuizQuestion::new(
            "What happens before equipment comes inside?",
            vec![
                "Walk the job with the customer".to_string(),
                "Start pre-spraying".to_string(),
                "Place air movers".to_string(),
            ],
            0,
        )?,
        QuizQuestion::new(
            "Why dry-vacuum before extraction?",
            vec![
                "It is optional".to_string(),
                "Dry soil removes easiest before water hits the fiber".to_string(),
            ],
            1,
        )?,
        QuizQuestion::new(
            "What finishes the job?",
            vec![
                "Groom the pile and place air movers".to_string(),
                "Leave immediately".to_string(),
            ],
            0,
        )?,
    ])
}

async fn print_overview(app: &AppServices, user: UserId) {
    println!("Training modules for {user}:");
    for card in app.overview().training_cards(user).await {
        let marker = if card.has_submodules { ">" } else { " " };
        println!(
            "  {marker} {:<22} {:>3}%  {}",
            card.label,
            card.percent,
            card.status
        );
    }
    if let Some(subs) = app
        .overview()
        .submodule_cards(user, &ModuleKey::from_static("floor"))
        .await
    {
        println!("  Floor Cleaning submodules:");
        for card in subs {
            println!("    - {:<20} {:>3}%  {}", card.label, card.percent, card.status);
        }
    }
}

async fn read_module(
    app: &AppServices,
    user: UserId,
    key: &ModuleKey,
) -> Result<(), Box<dyn std::error::Error>> {
    let outline = demo_outline(key)?;
    let mut session = app.sessions().open(user, outline).await;

    println!("Reading module '{}' as {user}", key.as_str());
    loop {
        let outcome = app.sessions().advance(&mut session).await;
        if outcome.save_failed {
            eprintln!("warning: progress save failed; continuing locally");
        }
        match outcome.view {
            SessionView::Overview => {}
            SessionView::Section(_) => {
                if let Some(view) = session.section_view() {
                    println!("  [{}] {}", view.position_label(), view.section.title());
                }
            }
            SessionView::Quiz => {
                println!("  All sections read; the quiz is unlocked.");
                break;
            }
        }
    }

    let stored = app.progress().get_progress(user, key).await;
    println!(
        "  Stored: {}% ({}), {}s on module",
        stored.percent(),
        stored.status(),
        stored.time_spent()
    );
    Ok(())
}

async fn take_quiz(
    app: &AppServices,
    user: UserId,
    key: &ModuleKey,
) -> Result<(), Box<dyn std::error::Error>> {
    let questions = demo_questions()?;
    // The demo sheet answers everything correctly.
    let answers: AnswerSheet = questions
        .iter()
        .enumerate()
        .map(|(i, q)| (u16::try_from(i).unwrap_or(u16::MAX), q.correct_index()))
        .collect();

    let stored = app.progress().get_progress(user, key).await;
    let submission = app
        .quizzes()
        .submit(user, key, &questions, &answers, stored.time_spent())
        .await?;

    println!(
        "Quiz for '{}': score {} ({}/{}), attempt {}",
        key.as_str(),
        submission.outcome.score(),
        submission.outcome.correct(),
        submission.outcome.total(),
        submission.attempts
    );
    match submission.route {
        services::QuizRoute::ReturnToTraining => println!("  Passed; module complete."),
        services::QuizRoute::ReviewModule => println!("  Failed; review the module and retake."),
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

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

    // Validate the module key against the catalog before touching storage.
    let known = catalog::training_modules()
        .iter()
        .any(|entry| entry.key() == &parsed.module)
        || catalog::leaf_keys(&ModuleKey::from_static("floor"))
            .is_some_and(|leaves| leaves.contains(&parsed.module));
    if !known {
        return Err(ArgsError::InvalidModule {
            raw: parsed.module.as_str().to_string(),
        }
        .into());
    }

    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, Clock::default_clock()).await?;

    match cmd {
        Command::Overview => {
            print_overview(&app, parsed.user).await;
            Ok(())
        }
        Command::Read => read_module(&app, parsed.user, &parsed.module).await,
        Command::Quiz => take_quiz(&app, parsed.user, &parsed.module).await,
        Command::Badges => {
            print_badges();
            Ok(())
        }
    }
}

fn print_badges() {
    println!("Badges:");
    for badge in training_core::model::badge::default_badges() {
        match badge.locked_percent() {
            None => println!("  [earned] {:<24} {}", badge.title(), badge.blurb()),
            Some(percent) => {
                println!("  [{percent:>3}%]  {:<24} {}", badge.title(), badge.blurb());
            }
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
