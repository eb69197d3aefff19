use buddy_core::advisory::SafetyAlert;
use buddy_core::debrief::DebriefSummary;
use buddy_core::history::find_session;
use buddy_core::planning::TargetProjection;
use buddy_core::state::{clear_recall, load_recall, save_recall};
use buddy_core::*;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "buddy")]
#[command(about = "Drinking Buddy: BAC estimates and safety guidance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more to stderr (-v for session changes, -vv for file handling)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Pretend the current time is this RFC 3339 instant (for testing)
    #[arg(long, global = true, hide = true)]
    now: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set or replace the body profile (logged drinks are kept)
    Setup {
        /// Body weight in pounds
        #[arg(long)]
        weight_lb: f64,

        /// Use the female distribution factor
        #[arg(long)]
        female: bool,
    },

    /// Log a drink
    Add {
        /// Catalog id (see `buddy catalog`)
        #[arg(long, required_unless_present = "standard_drinks", conflicts_with = "standard_drinks")]
        drink: Option<String>,

        /// Log a raw amount in standard drinks instead of a catalog drink
        #[arg(long)]
        standard_drinks: Option<f64>,

        /// Number of servings
        #[arg(long, default_value_t = 1.0)]
        count: f64,

        /// When the drink was finished
        #[arg(long, default_value_t = 0.0)]
        hours_ago: f64,

        /// Minutes the drink was sipped over (0, 15, 30, 45, 60, 90)
        #[arg(long, default_value_t = 0)]
        sip_minutes: u32,
    },

    /// Change the time and amount of a logged drink
    Edit {
        index: usize,

        #[arg(long)]
        hours_ago: f64,

        #[arg(long)]
        standard_drinks: f64,

        #[arg(long)]
        calories: Option<f64>,

        #[arg(long)]
        carbs_g: Option<f64>,

        #[arg(long)]
        sugar_g: Option<f64>,
    },

    /// Delete a logged drink (undoable for a short window)
    Delete { index: usize },

    /// Restore the most recently deleted drink
    Undo,

    /// Log water in ounces
    Water { oz: f64 },

    /// Show BAC, advice and the session summary
    State {
        /// Hours until a target time (e.g. work tomorrow)
        #[arg(long)]
        target_hours: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// Project BAC at a time in the future
    Plan {
        hours: f64,

        #[arg(long)]
        json: bool,
    },

    /// Summarize the active session or a saved one
    Debrief {
        /// Saved session id (see `buddy history`)
        #[arg(long)]
        session: Option<Uuid>,

        #[arg(long)]
        json: bool,
    },

    /// Journal the active session and start a new one
    Save,

    /// Clear logged drinks and water, keep the profile
    Reset,

    /// List saved sessions, newest first
    History {
        /// Only sessions saved in the last N days
        #[arg(long)]
        days: Option<i64>,

        #[arg(long)]
        json: bool,
    },

    /// List the drink catalog
    Catalog {
        /// Only this category (generic, beer, seltzer, wine, liquor, cocktail)
        #[arg(long)]
        category: Option<DrinkCategory>,

        #[arg(long)]
        json: bool,
    },
}

/// Files under the data directory
struct Paths {
    active: PathBuf,
    recall: PathBuf,
    journal: PathBuf,
}

impl Paths {
    fn new(data_dir: &Path) -> Self {
        let session_dir = data_dir.join("session");
        Self {
            active: session_dir.join("active.json"),
            recall: session_dir.join("recall.json"),
            journal: data_dir.join("saved_sessions.jsonl"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    buddy_core::logging::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let paths = Paths::new(&data_dir);
    let engine = SessionEngine::new(&config);
    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command {
        Commands::Setup { weight_lb, female } => cmd_setup(&paths, now, weight_lb, !female),
        Commands::Add {
            drink,
            standard_drinks,
            count,
            hours_ago,
            sip_minutes,
        } => cmd_add(
            &paths,
            now,
            drink.as_deref(),
            standard_drinks,
            count,
            hours_ago,
            sip_minutes,
        ),
        Commands::Edit {
            index,
            hours_ago,
            standard_drinks,
            calories,
            carbs_g,
            sugar_g,
        } => cmd_edit(
            &paths,
            now,
            index,
            hours_ago,
            standard_drinks,
            [calories, carbs_g, sugar_g],
        ),
        Commands::Delete { index } => cmd_delete(&paths, now, index, &config),
        Commands::Undo => cmd_undo(&paths, now),
        Commands::Water { oz } => cmd_water(&paths, now, oz),
        Commands::State { target_hours, json } => {
            cmd_state(&paths, now, &engine, target_hours, json)
        }
        Commands::Plan { hours, json } => cmd_plan(&paths, now, &engine, hours, json),
        Commands::Debrief { session, json } => cmd_debrief(&paths, now, &engine, session, json),
        Commands::Save => cmd_save(&paths, now),
        Commands::Reset => cmd_reset(&paths, now),
        Commands::History { days, json } => cmd_history(&paths, days, json),
        Commands::Catalog { category, json } => cmd_catalog(category, json),
    }
}

fn cmd_setup(paths: &Paths, now: DateTime<Utc>, weight_lb: f64, is_male: bool) -> Result<()> {
    let profile = Profile::new(weight_lb, is_male)?;
    ActiveSession::update(&paths.active, now, |session| {
        session.profile = Some(profile);
        Ok(())
    })?;

    println!(
        "✓ Profile saved: {} lb, {}",
        weight_lb,
        if is_male { "male" } else { "female" }
    );
    Ok(())
}

fn cmd_add(
    paths: &Paths,
    now: DateTime<Utc>,
    drink: Option<&str>,
    standard_drinks: Option<f64>,
    count: f64,
    hours_ago: f64,
    sip_minutes: u32,
) -> Result<()> {
    let hours_ago = sip_midpoint_hours_ago(hours_ago, sip_minutes)?;
    let (event, label) = match (drink, standard_drinks) {
        (Some(id), _) => {
            let catalog = load_catalog()?;
            let entry = catalog.get(id)?;
            (
                SessionEvent::from_catalog(entry, count, hours_ago)?,
                entry.name.clone(),
            )
        }
        (None, Some(amount)) => (
            SessionEvent::new(hours_ago, amount * count),
            "standard drink".to_string(),
        ),
        (None, None) => {
            return Err(Error::InvalidInput(
                "pass --drink or --standard-drinks".into(),
            ))
        }
    };

    let (_, index) = ActiveSession::update(&paths.active, now, |session| {
        session.store.append(event)
    })?;

    println!(
        "✓ Logged {} x {} ({:.2} standard drinks) at index {}",
        count, label, event.standard_drinks, index
    );
    Ok(())
}

fn cmd_edit(
    paths: &Paths,
    now: DateTime<Utc>,
    index: usize,
    hours_ago: f64,
    standard_drinks: f64,
    nutrients: [Option<f64>; 3],
) -> Result<()> {
    let (_, edited) = ActiveSession::update(&paths.active, now, |session| {
        let nutrients = if nutrients.iter().all(Option::is_none) {
            None
        } else {
            let current = session
                .store
                .events()
                .get(index)
                .map(|e| e.nutrients)
                .unwrap_or_default();
            let [calories, carbs_g, sugar_g] = nutrients;
            Some(Nutrients {
                calories: calories.unwrap_or(current.calories),
                carbs_g: carbs_g.unwrap_or(current.carbs_g),
                sugar_g: sugar_g.unwrap_or(current.sugar_g),
            })
        };
        session
            .store
            .edit_at(index, hours_ago, standard_drinks, nutrients)
    })?;

    println!(
        "✓ Event {} now {:.2} standard drinks, {:.2}h ago",
        index, edited.standard_drinks, edited.hours_ago
    );
    Ok(())
}

fn cmd_delete(paths: &Paths, now: DateTime<Utc>, index: usize, config: &Config) -> Result<()> {
    let window = Duration::seconds(config.session.recall_window_seconds);
    ActiveSession::update(&paths.active, now, |session| {
        let deleted = session.store.delete_at(index)?;
        save_recall(&paths.recall, &DeletedEventRecall::new(deleted, now, window))
    })?;

    println!(
        "✓ Deleted event {}. Run `buddy undo` within {}s to restore it.",
        index,
        window.num_seconds()
    );
    Ok(())
}

fn cmd_undo(paths: &Paths, now: DateTime<Utc>) -> Result<()> {
    let (_, index) = ActiveSession::update(&paths.active, now, |session| {
        let recall = load_recall(&paths.recall)?
            .ok_or_else(|| Error::NothingToRestore("no deleted drink to restore".into()))?;
        // The snapshot is single-use whether or not the restore succeeds
        clear_recall(&paths.recall)?;
        let (index, event) = recall.take(now)?;
        session.store.restore(index, event)
    })?;

    println!("✓ Restored drink at index {}", index);
    Ok(())
}

fn cmd_water(paths: &Paths, now: DateTime<Utc>, oz: f64) -> Result<()> {
    let (_, total) = ActiveSession::update(&paths.active, now, |session| session.log_water(oz))?;
    println!("✓ Water: {} oz this session", total);
    Ok(())
}

/// Load the active session aged to `now`, without writing it back
fn load_active(paths: &Paths, now: DateTime<Utc>) -> Result<ActiveSession> {
    let mut session = ActiveSession::load(&paths.active)?;
    session.store.advance_to(now);
    Ok(session)
}

fn cmd_state(
    paths: &Paths,
    now: DateTime<Utc>,
    engine: &SessionEngine,
    target_hours: Option<f64>,
    json: bool,
) -> Result<()> {
    let session = load_active(paths, now)?;
    let profile = session.require_profile()?;
    let query = SessionQuery {
        water_oz: session.water_oz,
        hours_until_target: target_hours,
    };
    let state = engine.state(&profile, &session.store, &query)?;

    if json {
        return print_json(&state);
    }
    display_state(&state);
    Ok(())
}

fn cmd_plan(
    paths: &Paths,
    now: DateTime<Utc>,
    engine: &SessionEngine,
    hours: f64,
    json: bool,
) -> Result<()> {
    let session = load_active(paths, now)?;
    let profile = session.require_profile()?;
    let projection = engine.plan(&profile, session.store.events(), hours)?;

    if json {
        return print_json(&projection);
    }
    display_projection(&projection);
    Ok(())
}

fn cmd_debrief(
    paths: &Paths,
    now: DateTime<Utc>,
    engine: &SessionEngine,
    session_id: Option<Uuid>,
    json: bool,
) -> Result<()> {
    let summary = match session_id {
        Some(id) => {
            let sessions = load_saved_sessions(&paths.journal, None)?;
            let saved = find_session(&sessions, id)?;
            engine.debrief(&saved.profile, &saved.events)?
        }
        None => {
            let session = load_active(paths, now)?;
            let profile = session.require_profile()?;
            engine.debrief(&profile, session.store.events())?
        }
    };

    if json {
        return print_json(&summary);
    }
    display_debrief(&summary);
    Ok(())
}

fn cmd_save(paths: &Paths, now: DateTime<Utc>) -> Result<()> {
    let (_, saved) = ActiveSession::update(&paths.active, now, |session| {
        let profile = session.require_profile()?;
        if session.store.is_empty() {
            return Err(Error::InvalidInput("no drinks logged to save".into()));
        }
        let saved = SavedSession::from_store(profile, &session.store, session.water_oz, now);
        JsonlSink::new(&paths.journal).append(&saved)?;
        session.reset(now);
        Ok(saved)
    })?;
    clear_recall(&paths.recall)?;

    println!(
        "✓ Saved session {} ({} drinks)",
        saved.id,
        saved.events.len()
    );
    Ok(())
}

fn cmd_reset(paths: &Paths, now: DateTime<Utc>) -> Result<()> {
    ActiveSession::update(&paths.active, now, |session| {
        session.reset(now);
        Ok(())
    })?;
    clear_recall(&paths.recall)?;

    println!("✓ Session cleared");
    Ok(())
}

fn cmd_history(paths: &Paths, days: Option<i64>, json: bool) -> Result<()> {
    let sessions = load_saved_sessions(&paths.journal, days)?;

    if json {
        return print_json(&sessions);
    }
    if sessions.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }
    for session in &sessions {
        let totals = session.totals();
        println!(
            "{}  {}  {} drinks, {:.2} standard",
            session.saved_at.format("%Y-%m-%d %H:%M"),
            session.id,
            totals.drink_count,
            totals.standard_drinks
        );
    }
    Ok(())
}

fn cmd_catalog(category: Option<DrinkCategory>, json: bool) -> Result<()> {
    let catalog = load_catalog()?;
    let mut groups = catalog.by_category();
    if let Some(category) = category {
        groups.retain(|c, _| *c == category);
    }

    if json {
        return print_json(&groups);
    }
    for (category, entries) in &groups {
        println!("{}", tag(category).to_uppercase());
        for entry in entries {
            println!(
                "  {:<16} {:<28} {:.2} std",
                entry.id, entry.name, entry.standard_drinks
            );
        }
    }
    Ok(())
}

fn load_catalog() -> Result<&'static Catalog> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Config("Invalid catalog".into()));
    }
    Ok(catalog)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The serde tag of a unit enum variant, e.g. `do_not_drive`
fn tag<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

fn display_state(state: &SessionState) {
    let advice = &state.drive_advice;
    println!("\n  BAC now: {:.3}%  [{}] {}", state.bac_now, tag(&advice.status), advice.title);
    println!("  {}", advice.message);
    println!("  → {}", advice.action);
    if let Some(SafetyAlert { level, message }) = &state.safety_alert {
        println!("  ! {}: {}", tag(level), message);
    }
    println!();
    println!("  Sober in: {:.1}h", state.hours_until_sober_from_now);
    println!(
        "  Drinks: {} ({:.2} standard, {:.0} kcal)",
        state.drink_count, state.total_standard_drinks, state.total_calories
    );

    let plan = &state.hangover_plan;
    println!(
        "  Hangover risk: {} (stop by {:+.1}h). {}",
        tag(&plan.hangover_risk),
        plan.stop_by_hours_from_now,
        plan.message
    );

    let pace = &state.pace_prediction;
    println!(
        "  One more now: {:.3}% in 30m ({:+.3}). {}",
        pace.bac_in_30m_if_one_more_now, pace.delta, pace.recommendation
    );

    let water = &state.hydration;
    println!(
        "  Water: {}/{} oz. {}",
        water.water_oz, water.target_oz, water.message
    );
    println!("  Pace: {}", water.pacing_message);

    if let Some(projection) = &state.target_projection {
        display_projection(projection);
    }

    if !state.session_events.is_empty() {
        println!();
        for item in &state.session_events {
            println!(
                "  [{}] {:.2} std, {:.2}h ago",
                item.index, item.event.standard_drinks, item.event.hours_ago
            );
        }
    }
    println!();
}

fn display_projection(projection: &TargetProjection) {
    let verdict = if projection.sober {
        "sober"
    } else if projection.below_legal_limit {
        "below legal limit"
    } else {
        "over legal limit"
    };
    println!(
        "  In {}h: {:.3}% ({})",
        projection.hours_until_target, projection.projected_bac, verdict
    );
}

fn display_debrief(summary: &DebriefSummary) {
    println!("\n  Peak BAC: {:.3}%", summary.peak_bac);
    println!(
        "  Over legal limit: {} min",
        summary.minutes_over_legal_limit
    );
    println!("  Drinks: {}", summary.drink_count);
    println!("  Sober in: {:.1}h", summary.hours_until_sober_now);
    println!();
    for suggestion in &summary.suggestions {
        println!("  • {}", suggestion);
    }
    println!();
}
