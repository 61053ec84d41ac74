use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use taper_core::*;

#[derive(Parser)]
#[command(name = "taper")]
#[command(about = "Nicotine cessation tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new cessation program (archives any active one)
    Start {
        /// Goal type (reduce_to_zero, immediate_zero)
        #[arg(long, default_value = "reduce_to_zero")]
        goal: String,

        /// Product kind (cigarette, snus, vape, chew, patch, gum, lozenge, other)
        #[arg(long)]
        product: String,

        /// Baseline daily consumption before the program
        #[arg(long)]
        baseline: f64,

        /// Unit label, defaults to the catalog unit for the product
        #[arg(long)]
        unit: Option<String>,

        /// Nicotine strength per unit in mg
        #[arg(long)]
        strength: Option<f64>,

        /// Cost per unit
        #[arg(long)]
        cost: Option<f64>,

        /// Program start time (RFC 3339), defaults to now
        #[arg(long)]
        started_at: Option<String>,
    },

    /// Show the active program
    Status,

    /// List all programs, newest first
    Programs,

    /// Set the cost per unit on the active program
    Cost { value: f64 },

    /// Log a use, craving, or relapse event
    Log {
        /// Event kind (use, craving, relapse)
        kind: String,

        /// Amount consumed, required for use and relapse
        #[arg(long)]
        amount: Option<f64>,

        /// Craving intensity (1-10)
        #[arg(long)]
        intensity: Option<u8>,

        /// Trigger (stress, social, alcohol, boredom, morning, after_meal, other)
        #[arg(long)]
        trigger: Option<String>,

        /// Free-form note, max 500 characters
        #[arg(long)]
        notes: Option<String>,

        /// Event time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// List events for the active program
    Events {
        /// Start of the range (RFC 3339)
        #[arg(long)]
        start: Option<String>,

        /// End of the range (RFC 3339)
        #[arg(long)]
        end: Option<String>,

        /// Only show this kind (use, craving, relapse)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Evening diary
    Diary {
        #[command(subcommand)]
        command: DiaryCommands,
    },

    /// Show the progress score for the active program
    Progress,

    /// Show the full dashboard (default)
    Dashboard,

    /// Roll up WAL events to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Show or update the local profile
    Profile {
        /// Set the display name
        #[arg(long)]
        set_name: Option<String>,
    },

    /// Development helpers (test/development environments only)
    Dev {
        #[command(subcommand)]
        command: DevCommands,
    },
}

#[derive(Subcommand)]
enum DiaryCommands {
    /// Add today's entry
    Add {
        /// Mood score (1-10)
        #[arg(long)]
        mood: u8,

        /// Free-form note, max 500 characters
        #[arg(long)]
        note: Option<String>,

        /// Entry time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// List entries, newest first
    List {
        /// Earliest entry date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Latest entry date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
}

#[derive(Subcommand)]
enum DevCommands {
    /// Backfill one dummy day of diary and craving data
    SeedDay {
        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Delete the active program's history and restart its clock
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// File layout under the data directory
struct DataPaths {
    wal_dir: PathBuf,
    book: PathBuf,
    wal: PathBuf,
    csv: PathBuf,
    diary: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            book: wal_dir.join("programs.json"),
            wal: wal_dir.join("events.wal"),
            csv: data_dir.join("events.csv"),
            diary: wal_dir.join("diary.jsonl"),
            wal_dir,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    taper_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Start {
            goal,
            product,
            baseline,
            unit,
            strength,
            cost,
            started_at,
        }) => cmd_start(data_dir, goal, product, baseline, unit, strength, cost, started_at),
        Some(Commands::Status) => cmd_status(data_dir),
        Some(Commands::Programs) => cmd_programs(data_dir),
        Some(Commands::Cost { value }) => cmd_cost(data_dir, value),
        Some(Commands::Log {
            kind,
            amount,
            intensity,
            trigger,
            notes,
            at,
        }) => cmd_log(data_dir, kind, amount, intensity, trigger, notes, at),
        Some(Commands::Events { start, end, kind }) => cmd_events(data_dir, start, end, kind),
        Some(Commands::Diary { command }) => match command {
            DiaryCommands::Add { mood, note, at } => {
                cmd_diary_add(data_dir, mood, note, at, &config)
            }
            DiaryCommands::List { start, end } => cmd_diary_list(data_dir, start, end),
        },
        Some(Commands::Progress) => cmd_progress(data_dir),
        Some(Commands::Dashboard) => cmd_dashboard(data_dir),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(data_dir, cleanup),
        Some(Commands::Profile { set_name }) => cmd_profile(set_name, config),
        Some(Commands::Dev { command }) => match command {
            DevCommands::SeedDay { seed } => cmd_dev_seed(data_dir, seed, &config),
            DevCommands::Reset { yes } => cmd_dev_reset(data_dir, yes, &config),
        },
        None => {
            // Default to the dashboard
            cmd_dashboard(data_dir)
        }
    }
}

fn parse_timestamp(value: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| Error::Other(format!("invalid timestamp '{}': {}", value, e)))
}

fn parse_date(value: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::Other(format!("invalid date '{}': {}", value, e)))
}

#[allow(clippy::too_many_arguments)]
fn cmd_start(
    data_dir: PathBuf,
    goal: String,
    product: String,
    baseline: f64,
    unit: Option<String>,
    strength: Option<f64>,
    cost: Option<f64>,
    started_at: Option<String>,
) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    std::fs::create_dir_all(&paths.wal_dir)?;

    let goal_type: GoalType = goal.parse()?;
    let kind: ProductKind = product.parse()?;

    // Load catalog for the default unit label
    let catalog = build_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Other("Invalid product catalog".into()));
    }

    let unit_label = match unit {
        Some(unit) => unit,
        None => catalog
            .info(kind)
            .map(|info| info.default_unit.clone())
            .unwrap_or_else(|| "units".into()),
    };

    let now = chrono::Utc::now();
    let started_at = match started_at {
        Some(value) => parse_timestamp(&value)?,
        None => now,
    };

    let profile = ProductProfile {
        kind,
        baseline_amount: baseline,
        unit_label,
        strength_mg: strength,
        cost_per_unit: cost,
    };

    let book = ProgramBook::update(&paths.book, |book| {
        book.start_program(goal_type, started_at, profile, now)?;
        Ok(())
    })?;
    let program = book.require_active()?;

    let display_name = catalog
        .info(kind)
        .map(|info| info.display_name.as_str())
        .unwrap_or_else(|| kind.as_str());

    println!("✓ Program started!");
    println!("  Product: {}", display_name);
    println!(
        "  Goal: {} ({} day target)",
        program.goal_type.as_str(),
        program.goal_type.target_days()
    );
    println!(
        "  Baseline: {} {} per day",
        program.product_profile.baseline_amount, program.product_profile.unit_label
    );
    println!("  Id: {}", program.id);

    Ok(())
}

fn cmd_status(data_dir: PathBuf) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    let book = ProgramBook::load(&paths.book)?;
    let program = book.require_active()?;

    display_program(program);
    Ok(())
}

fn cmd_programs(data_dir: PathBuf) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    let book = ProgramBook::load(&paths.book)?;
    let programs = book.all_programs();

    if programs.is_empty() {
        println!("No programs yet. Run 'taper start' to begin one.");
        return Ok(());
    }

    for program in programs {
        let status = if program.is_active { "active" } else { "archived" };
        let ended = program
            .ended_at
            .map(|t| format!(", ended {}", t.format("%Y-%m-%d")))
            .unwrap_or_default();
        println!(
            "  [{}] {} {} (started {}{})",
            status,
            program.product_profile.kind.as_str(),
            program.goal_type.as_str(),
            program.started_at.format("%Y-%m-%d"),
            ended
        );
        println!("      id: {}", program.id);
    }
    Ok(())
}

fn cmd_cost(data_dir: PathBuf, value: f64) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    ProgramBook::update(&paths.book, |book| book.update_active_cost(value))?;

    println!("✓ Cost per unit set to {:.2}", value);
    Ok(())
}

fn cmd_log(
    data_dir: PathBuf,
    kind: String,
    amount: Option<f64>,
    intensity: Option<u8>,
    trigger: Option<String>,
    notes: Option<String>,
    at: Option<String>,
) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    std::fs::create_dir_all(&paths.wal_dir)?;

    let book = ProgramBook::load(&paths.book)?;
    let program = book.require_active()?;

    let kind: EventKind = kind.parse()?;
    let trigger = trigger.map(|t| t.parse::<Trigger>()).transpose()?;
    let occurred_at = match at {
        Some(value) => parse_timestamp(&value)?,
        None => chrono::Utc::now(),
    };

    let event = Event {
        id: uuid::Uuid::new_v4(),
        program_id: program.id,
        kind,
        amount,
        intensity,
        trigger,
        notes,
        occurred_at,
    };
    event.validate()?;

    // Append to WAL (only validated events can reach here)
    let mut sink = JsonlSink::new(&paths.wal);
    sink.append(&event)?;

    println!("✓ Event logged!");
    println!(
        "  {} at {}",
        kind.as_str(),
        occurred_at.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(amount) = event.amount {
        println!(
            "  Amount: {} {}",
            amount, program.product_profile.unit_label
        );
    }
    if let Some(intensity) = event.intensity {
        println!("  Intensity: {}/10", intensity);
    }

    Ok(())
}

fn cmd_events(
    data_dir: PathBuf,
    start: Option<String>,
    end: Option<String>,
    kind: Option<String>,
) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    let book = ProgramBook::load(&paths.book)?;
    let program = book.require_active()?;

    let start = start.as_deref().map(parse_timestamp).transpose()?;
    let end = end.as_deref().map(parse_timestamp).transpose()?;
    let kind = kind.map(|k| k.parse::<EventKind>()).transpose()?;

    let mut events = load_events_between(&paths.wal, &paths.csv, program.id, start, end)?;
    if let Some(kind) = kind {
        events.retain(|e| e.kind == kind);
    }

    if events.is_empty() {
        println!("No events in range.");
        return Ok(());
    }

    println!("{} events (newest first):", events.len());
    for event in &events {
        let mut line = format!(
            "  {} {}",
            event.occurred_at.format("%Y-%m-%d %H:%M"),
            event.kind.as_str()
        );
        if let Some(amount) = event.amount {
            line.push_str(&format!(" amount={}", amount));
        }
        if let Some(intensity) = event.intensity {
            line.push_str(&format!(" intensity={}", intensity));
        }
        if let Some(trigger) = event.trigger {
            line.push_str(&format!(" trigger={}", trigger.as_str()));
        }
        println!("{}", line);
        if let Some(ref notes) = event.notes {
            println!("      {}", notes);
        }
    }
    Ok(())
}

fn cmd_diary_add(
    data_dir: PathBuf,
    mood: u8,
    note: Option<String>,
    at: Option<String>,
    config: &Config,
) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    std::fs::create_dir_all(&paths.wal_dir)?;

    let book = ProgramBook::load(&paths.book)?;
    let program = book.require_active()?;

    let now = match at {
        Some(value) => parse_timestamp(&value)?,
        None => chrono::Utc::now(),
    };

    let diary = DiaryLog::new(&paths.diary);
    let entry = diary.create_entry(program, mood, note, now, config.diary.unlock_hour)?;

    println!("✓ Diary entry saved!");
    println!("  Date: {}", entry.entry_date);
    println!("  Mood: {}/10", entry.mood);

    Ok(())
}

fn cmd_diary_list(data_dir: PathBuf, start: Option<String>, end: Option<String>) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    let book = ProgramBook::load(&paths.book)?;
    let program = book.require_active()?;

    let start = start.as_deref().map(parse_date).transpose()?;
    let end = end.as_deref().map(parse_date).transpose()?;

    let diary = DiaryLog::new(&paths.diary);
    let entries = diary.list_entries(program.id, start, end)?;

    if entries.is_empty() {
        println!("No diary entries in range.");
        return Ok(());
    }

    for entry in &entries {
        println!("  {} mood {}/10", entry.entry_date, entry.mood);
        if let Some(ref note) = entry.note {
            println!("      {}", note);
        }
    }
    Ok(())
}

fn cmd_progress(data_dir: PathBuf) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    let book = ProgramBook::load(&paths.book)?;
    let program = book.require_active()?;

    let now = chrono::Utc::now();
    let recent = load_recent_events(
        &paths.wal,
        &paths.csv,
        program.id,
        progress::RECENT_WINDOW_DAYS,
        now,
    )?;
    let mut relapses = load_recent_events(
        &paths.wal,
        &paths.csv,
        program.id,
        progress::RELAPSE_WINDOW_DAYS,
        now,
    )?;
    relapses.retain(|e| e.kind == EventKind::Relapse);

    let report = calculate_progress(program, &recent, &relapses, now);

    println!(
        "Day {} progress: {}%",
        report.days_since_start, report.progress_percent
    );
    println!(
        "  Baseline {} per day, recent average {}",
        report.baseline_daily_amount, report.recent_average_daily_amount
    );
    if report.relapse_penalty > 0.0 {
        println!("  Relapse penalty: -{}", report.relapse_penalty);
    }
    Ok(())
}

fn cmd_dashboard(data_dir: PathBuf) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    let book = ProgramBook::load(&paths.book)?;
    let program = match book.active() {
        Some(program) => program,
        None => {
            println!(
                "No active program. Run 'taper start --product <kind> --baseline <amount>' to begin one."
            );
            return Ok(());
        }
    };

    let now = chrono::Utc::now();
    let recent = load_recent_events(
        &paths.wal,
        &paths.csv,
        program.id,
        progress::RECENT_WINDOW_DAYS,
        now,
    )?;
    let mut relapses = load_recent_events(
        &paths.wal,
        &paths.csv,
        program.id,
        progress::RELAPSE_WINDOW_DAYS,
        now,
    )?;
    relapses.retain(|e| e.kind == EventKind::Relapse);

    let summary = build_dashboard(program, &recent, &relapses, now);
    display_dashboard(program, &summary);
    Ok(())
}

fn cmd_rollup(data_dir: PathBuf, cleanup: bool) -> Result<()> {
    let paths = DataPaths::new(&data_dir);

    if !paths.wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = taper_core::csv_rollup::wal_to_csv_and_archive(&paths.wal, &paths.csv)?;

    println!("✓ Rolled up {} events to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = taper_core::csv_rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn cmd_profile(set_name: Option<String>, mut config: Config) -> Result<()> {
    match set_name {
        Some(name) => {
            config.profile.display_name = Some(name.clone());
            config.save()?;
            println!("✓ Display name set to {}", name);
        }
        None => {
            match &config.profile.display_name {
                Some(name) => println!("Display name: {}", name),
                None => println!("No display name set. Use --set-name to set one."),
            }
            println!("Environment: {}", config.dev.environment);
            println!("Diary unlocks at {:02}:00 UTC", config.diary.unlock_hour);
        }
    }
    Ok(())
}

fn cmd_dev_seed(data_dir: PathBuf, seed: Option<u64>, config: &Config) -> Result<()> {
    ensure_dev_allowed(config)?;

    let paths = DataPaths::new(&data_dir);
    std::fs::create_dir_all(&paths.wal_dir)?;

    let book = ProgramBook::load(&paths.book)?;
    let program = book.require_active()?;
    let diary = DiaryLog::new(&paths.diary);

    let seeded = seed_dummy_day_with(
        seed,
        program,
        &paths.wal,
        &paths.csv,
        &diary,
        chrono::Utc::now(),
    )?;

    println!("✓ Seeded {}", seeded.date);
    println!("  Mood: {}/10", seeded.mood);
    println!("  Cravings: {}", seeded.craving_count);
    Ok(())
}

fn cmd_dev_reset(data_dir: PathBuf, yes: bool, config: &Config) -> Result<()> {
    ensure_dev_allowed(config)?;

    if !yes {
        println!("This deletes the active program's events and diary entries.");
        println!("Re-run with --yes to confirm.");
        return Ok(());
    }

    let paths = DataPaths::new(&data_dir);
    let diary = DiaryLog::new(&paths.diary);
    let outcome = reset_progress(&paths.book, &paths.wal, &paths.csv, &diary, chrono::Utc::now())?;

    println!("✓ Progress reset!");
    println!(
        "  Removed {} events and {} diary entries",
        outcome.deleted_events, outcome.deleted_diary_entries
    );
    println!(
        "  Program clock restarted at {}",
        outcome.started_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}

fn ensure_dev_allowed(config: &Config) -> Result<()> {
    if !config.dev_helpers_allowed() {
        return Err(Error::Config(format!(
            "dev commands are disabled in the '{}' environment",
            config.dev.environment
        )));
    }
    Ok(())
}

fn display_program(program: &Program) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  ACTIVE PROGRAM");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Goal: {}", program.goal_type.as_str());
    println!("  Product: {}", program.product_profile.kind.as_str());
    println!(
        "  Baseline: {} {} per day",
        program.product_profile.baseline_amount, program.product_profile.unit_label
    );
    if let Some(strength) = program.product_profile.strength_mg {
        println!("  Strength: {} mg per unit", strength);
    }
    if let Some(cost) = program.product_profile.cost_per_unit {
        println!("  Cost: {:.2} per unit", cost);
    }
    println!(
        "  Started: {}",
        program.started_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("  Target: {} days", program.goal_type.target_days());
    println!();
}

fn display_dashboard(program: &Program, summary: &DashboardSummary) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  TAPER DASHBOARD");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Day {} of {} ({})",
        summary.days_since_start,
        program.goal_type.target_days(),
        program.goal_type.as_str()
    );
    println!("  Progress: {}%", summary.progress_percent);
    println!(
        "  Baseline: {} {} per day",
        summary.baseline_daily_amount, program.product_profile.unit_label
    );
    println!(
        "  Recent average: {} {} per day",
        summary.recent_average_daily_amount, program.product_profile.unit_label
    );
    println!("  Cravings (7d): {}", summary.cravings_last_7_days);
    println!("  Relapses (30d): {}", summary.relapses_last_30_days);
    if let Some(saved) = summary.money_saved_estimate {
        println!("  Money saved: ~{:.2}", saved);
    }
    println!();
    println!("  ℹ {}", summary.message_of_the_day);
    println!();
}
