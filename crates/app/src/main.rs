use std::collections::BTreeSet;
use std::fmt;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Instant;

use services::{
    Clock, CriteriaService, DealService, Draw, Entitlement, NoCardReason, PoolService,
    StatsService,
};
use storage::repository::Storage;
use tidy_core::model::{Card, Category, Difficulty};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidValue { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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
    eprintln!("  tidy draw     [--db <sqlite_url>] [--premium]   # interactive deal loop");
    eprintln!("  tidy stats    [--db <sqlite_url>]");
    eprintln!("  tidy seed     <cards.json> [--db <sqlite_url>]");
    eprintln!("  tidy sync     <endpoint_url> [--db <sqlite_url>]");
    eprintln!("  tidy criteria [--categories a,b] [--difficulties easy,hard] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:tidy.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TIDY_DB_URL, TIDY_PREMIUM");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Draw,
    Stats,
    Seed,
    Sync,
    Criteria,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "draw" => Some(Self::Draw),
            "stats" => Some(Self::Stats),
            "seed" => Some(Self::Seed),
            "sync" => Some(Self::Sync),
            "criteria" => Some(Self::Criteria),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    premium: bool,
    positional: Vec<String>,
    categories: Option<String>,
    difficulties: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TIDY_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://tidy.sqlite3".into(), normalize_sqlite_url);
        let mut premium = std::env::var("TIDY_PREMIUM")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let mut positional = Vec::new();
        let mut categories = None;
        let mut difficulties = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--premium" => premium = true,
                "--categories" => categories = Some(require_value(args, "--categories")?),
                "--difficulties" => difficulties = Some(require_value(args, "--difficulties")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        Ok(Self {
            db_url,
            premium,
            positional,
            categories,
            difficulties,
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

fn print_card(card: &Card) {
    println!();
    println!("[{}] {}", card.category, card.task);
    if !card.comment.is_empty() {
        println!("    {}", card.comment);
    }
    let timed = if card.is_timed { ", timed" } else { "" };
    println!(
        "    ({}, ~{} {}{timed})",
        card.difficulty, card.time_estimate, card.time_unit
    );
}

async fn run_draw_loop(
    deal_service: &DealService,
    entitlement: Entitlement,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut deal = deal_service.load(entitlement).await?;
    let mut rng = rand::rng();
    let stdin = std::io::stdin();

    let mut next = deal_service.draw(&mut deal, &mut rng).await?;
    loop {
        let card = match next {
            Draw::Card(card) => card,
            Draw::NoCard(NoCardReason::AllDone) => {
                println!("All done for today. Come back tomorrow!");
                return Ok(());
            }
            Draw::NoCard(NoCardReason::NoMatch) => {
                println!("No cards match your filters. Try `tidy criteria`.");
                return Ok(());
            }
        };

        print_card(&card);
        let presented_at = Instant::now();

        next = loop {
            print!("[d]one / [s]kip / [q]uit > ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            if stdin.read_line(&mut line)? == 0 {
                return Ok(());
            }
            match line.trim() {
                "d" | "done" => {
                    let elapsed = presented_at.elapsed();
                    let in_time = card.is_timed && elapsed <= card.estimated_duration();
                    let seconds = u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX);
                    let reward = deal_service.complete(&mut deal, seconds, in_time).await?;
                    println!("+{} points", reward.points_earned);
                    for badge in &reward.new_badges {
                        println!("Badge unlocked: {}", badge.name);
                    }
                    break deal_service.draw(&mut deal, &mut rng).await?;
                }
                // skip() draws the replacement itself.
                "s" | "skip" => break deal_service.skip(&mut deal, &mut rng).await?,
                "q" | "quit" => return Ok(()),
                other => println!("unrecognized input: {other}"),
            }
        };
    }
}

async fn run(mut argv: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            print_usage();
            ArgsError::UnknownArg(first.to_string())
        })?,
    };
    argv.remove(0);

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).inspect_err(|_| print_usage())?;

    prepare_sqlite_file(&args.db_url)?;
    tracing::debug!(db_url = %args.db_url, "opening store");
    let storage = Storage::sqlite(&args.db_url).await?;

    let clock = Clock::default_clock();
    let entitlement = if args.premium {
        Entitlement::Premium
    } else {
        Entitlement::Free
    };
    let stats_service = StatsService::new(clock, Arc::clone(&storage.stats));
    let pool_service = PoolService::new(Arc::clone(&storage.pool));
    let criteria_service = CriteriaService::new(Arc::clone(&storage.criteria));
    let deal_service = DealService::new(
        clock,
        Arc::clone(&storage.pool),
        Arc::clone(&storage.criteria),
        Arc::clone(&storage.progress),
        stats_service.clone(),
    );

    match cmd {
        Command::Draw => run_draw_loop(&deal_service, entitlement).await,
        Command::Stats => {
            let stats = stats_service.stats().await?;
            println!("points:         {}", stats.points());
            println!("level:          {}", stats.level());
            println!("current streak: {} days", stats.current_streak());
            println!("longest streak: {} days", stats.longest_streak());
            println!("total tasks:    {}", stats.total_tasks());
            println!("today:          {}", stats_service.completed_today().await?);
            println!("this week:      {}", stats_service.completed_this_week().await?);
            println!("this month:     {}", stats_service.completed_this_month().await?);
            if !stats.unlocked_badges().is_empty() {
                println!("badges:         {}", stats.unlocked_badges().join(", "));
            }
            Ok(())
        }
        Command::Seed => {
            let Some(path) = args.positional.first() else {
                print_usage();
                return Err(ArgsError::MissingValue { flag: "seed <file>" }.into());
            };
            let raw = std::fs::read_to_string(path)?;
            let rows: Vec<services::pool_service::RemoteCardRow> = serde_json::from_str(&raw)?;
            let count = pool_service.replace_from_rows(rows).await?;
            println!("seeded {count} cards");
            Ok(())
        }
        Command::Sync => {
            let Some(url) = args.positional.first() else {
                print_usage();
                return Err(ArgsError::MissingValue { flag: "sync <url>" }.into());
            };
            let count = pool_service.sync(url).await?;
            println!("synced {count} cards");
            Ok(())
        }
        Command::Criteria => {
            if args.categories.is_none() && args.difficulties.is_none() {
                match criteria_service.get().await? {
                    Some(criteria) => {
                        let categories: Vec<&str> =
                            criteria.categories().iter().map(Category::as_str).collect();
                        let difficulties: Vec<&str> = criteria
                            .difficulties()
                            .iter()
                            .map(|d| d.as_str())
                            .collect();
                        println!("categories:   {}", categories.join(", "));
                        println!("difficulties: {}", difficulties.join(", "));
                    }
                    None => println!("no criteria saved; everything in the pool is eligible"),
                }
                return Ok(());
            }

            let current = criteria_service.get().await?;
            let categories: BTreeSet<Category> = match &args.categories {
                Some(raw) => parse_categories(raw)?,
                None => current
                    .as_ref()
                    .map(|c| c.categories().clone())
                    .unwrap_or_default(),
            };
            let difficulties: BTreeSet<Difficulty> = match &args.difficulties {
                Some(raw) => parse_difficulties(raw)?,
                None => current
                    .as_ref()
                    .map(|c| c.difficulties().clone())
                    .unwrap_or_else(|| Difficulty::all().into_iter().collect()),
            };

            criteria_service.update(categories, difficulties).await?;
            println!("criteria saved");
            Ok(())
        }
    }
}

fn parse_categories(raw: &str) -> Result<BTreeSet<Category>, ArgsError> {
    raw.split(',')
        .map(|part| {
            Category::new(part).map_err(|_| ArgsError::InvalidValue {
                flag: "--categories",
                raw: part.to_string(),
            })
        })
        .collect()
}

fn parse_difficulties(raw: &str) -> Result<BTreeSet<Difficulty>, ArgsError> {
    raw.split(',')
        .map(|part| {
            part.parse::<Difficulty>().map_err(|_| ArgsError::InvalidValue {
                flag: "--difficulties",
                raw: part.to_string(),
            })
        })
        .collect()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(argv).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
