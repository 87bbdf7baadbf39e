use clap::{Parser, Subcommand};
use spotter_core::persist::WriterStats;
use spotter_core::wake_lock::NoWakeLock;
use spotter_core::*;
use std::io::{self, BufRead, Write};
use spotter_core::catalog::Catalog;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "spotter")]
#[command(about = "Guided strength workouts in the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log session and storage activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a guided workout
    Run {
        /// Workout id (see `spotter list`)
        workout: String,

        /// No sounds or voice
        #[arg(long)]
        quiet: bool,

        /// Don't keep the machine awake during the workout
        #[arg(long)]
        allow_sleep: bool,
    },

    /// List available workouts
    List,

    /// Show recent workouts
    History {
        /// How many days back to look
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Show personal records
    Records,

    /// Roll up WAL workout logs to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Write a default config file to edit
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Copy a workout into your workouts directory to customize it
    Copy {
        /// Workout to copy
        from: String,

        /// Id of the new workout
        to: String,

        /// Display name; defaults to the copied workout's name
        #[arg(long)]
        name: Option<String>,
    },

    /// Estimate calories burned in a cardio session
    Calories {
        /// Activity (running, cycling, rowing, ...)
        #[arg(long)]
        activity: String,

        /// light, moderate or vigorous
        #[arg(long, default_value = "moderate")]
        intensity: String,

        /// Duration in minutes
        #[arg(long)]
        minutes: f64,

        /// Body weight; defaults to body.weight_kg from the config
        #[arg(long)]
        weight_kg: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        spotter_core::logging::init_with_level("info");
    } else {
        spotter_core::logging::init();
    }

    // init writes the config, so it must not need a readable one
    let config = match &cli.config {
        _ if matches!(cli.command, Commands::Init { .. }) => Config::default(),
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Run {
            workout,
            quiet,
            allow_sleep,
        } => cmd_run(data_dir, &workout, quiet, allow_sleep, &config),
        Commands::List => cmd_list(data_dir),
        Commands::History { days } => cmd_history(data_dir, days),
        Commands::Records => cmd_records(data_dir),
        Commands::Rollup { cleanup } => cmd_rollup(data_dir, cleanup),
        Commands::Copy { from, to, name } => cmd_copy(data_dir, &from, &to, name),
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(Config::default_config_path);
            cmd_init(&path, force)
        }
        Commands::Calories {
            activity,
            intensity,
            minutes,
            weight_kg,
        } => cmd_calories(
            &activity,
            &intensity,
            minutes,
            weight_kg.unwrap_or(config.body.weight_kg),
        ),
    }
}

// ============================================================================
// run
// ============================================================================

enum Input {
    Line(String),
    Eof,
}

fn cmd_run(
    data_dir: PathBuf,
    workout_id: &str,
    quiet: bool,
    allow_sleep: bool,
    config: &Config,
) -> Result<()> {
    let store = FileStore::new(&data_dir);
    std::fs::create_dir_all(&store.paths().wal_dir)?;

    let mut notifications = config.notifications.clone();
    if quiet {
        notifications.sound_enabled = false;
        notifications.voice_enabled = false;
    }
    let notifier = spotter_core::platform::desktop_notifier(notifications, &config.speech);
    if notifier.settings().voice_enabled && !notifier.is_speech_supported() {
        eprintln!("Voice cues unavailable: no speech program found (set [speech] command).");
    }
    let wake_lock = if allow_sleep {
        ScreenWakeLock::new(Box::new(NoWakeLock))
    } else {
        spotter_core::platform::desktop_wake_lock()
    };

    let writer = Arc::new(BackgroundWriter::spawn(store.clone())?);
    let mut session = GuidedSession::new(
        workout_id,
        config.session.clone(),
        notifier,
        wake_lock,
        Box::new(Arc::clone(&writer)),
    );

    if let Err(e) = session.load(&store) {
        eprintln!("Could not load workout '{}': {}", workout_id, e);
        eprintln!("Run `spotter list` to see available workouts.");
        return Err(e);
    }

    if let Some(definition) = session.definition() {
        display_workout(definition);
    }
    print_help();

    session.set_on_complete(display_summary);
    session.start_workout()?;

    let rx = spawn_input_reader()?;
    let mut next_tick = Instant::now() + Duration::from_secs(1);

    loop {
        for event in session.take_events() {
            display_event(&session, &event);
        }
        if *session.status() == SessionStatus::Complete {
            break;
        }

        let timeout = next_tick.saturating_duration_since(Instant::now());
        match rx.recv_timeout(timeout) {
            Ok(Input::Line(line)) => {
                if let Err(e) = on_input(&mut session, &line) {
                    println!("  {}", e);
                }
            }
            Ok(Input::Eof) | Err(RecvTimeoutError::Disconnected) => {
                // Input closed: save what was done
                if let Err(e) = session.end_workout() {
                    tracing::warn!("Could not end workout on EOF: {}", e);
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                session.tick();
                next_tick += Duration::from_secs(1);
            }
        }
    }

    drop(session);
    let stats = match Arc::try_unwrap(writer) {
        Ok(writer) => writer.shutdown(),
        Err(_) => WriterStats::default(),
    };
    if stats.failed > 0 {
        eprintln!("Warning: {} write(s) could not be saved", stats.failed);
    }

    Ok(())
}

/// Read stdin lines on their own thread so the session keeps ticking
fn spawn_input_reader() -> Result<mpsc::Receiver<Input>> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("spotter-input".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(Input::Line(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(Input::Eof);
        })?;
    Ok(rx)
}

/// Typing means the terminal is in front of the user
fn on_input(session: &mut GuidedSession, line: &str) -> Result<()> {
    session.on_visibility_change(true);
    handle_line(session, line)
}

fn handle_line(session: &mut GuidedSession, line: &str) -> Result<()> {
    let input = line.trim().to_lowercase();
    match input.as_str() {
        "s" => session.skip_rest(),
        "t" => session.start_rest_timer(),
        "n" => session.skip_exercise(),
        "b" => session.go_to_previous_exercise(),
        "p" => session.pause(),
        "r" => session.resume(),
        "d" => session.dismiss_pr_celebration(),
        "q" => session.end_workout(),
        "?" | "h" => {
            print_help();
            Ok(())
        }
        "" => match session.status().clone() {
            SessionStatus::Active => {
                let set = suggested_set(session)?;
                session.complete_set(set)
            }
            SessionStatus::Rest => session.skip_rest(),
            SessionStatus::Pr => session.dismiss_pr_celebration(),
            _ => Ok(()),
        },
        other => {
            let set = parse_set(other)?;
            session.complete_set(set)
        }
    }
}

fn suggested_set(session: &GuidedSession) -> Result<SetInput> {
    let exercise = session
        .current_exercise()
        .ok_or_else(|| Error::State("no current exercise".into()))?;
    Ok(SetInput {
        weight: exercise.suggested_weight,
        reps: exercise.target_reps,
        rpe: None,
    })
}

/// Parse "<weight> <reps> [rpe]", also accepting "60x8"
/// Accept "62,5" as a decimal weight and "60x8" as weight and reps
fn normalize_set_input(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| match c {
            ',' if i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) =>
            {
                '.'
            }
            'x' | '×' => ' ',
            other => other,
        })
        .collect()
}

fn parse_set(input: &str) -> Result<SetInput> {
    let normalized = normalize_set_input(input);
    let parts: Vec<&str> = normalized.split_whitespace().collect();

    let usage = || {
        Error::Other(format!(
            "Couldn't read '{}'. Enter '<weight> <reps> [rpe]', e.g. '60 8'",
            input
        ))
    };

    if parts.len() < 2 || parts.len() > 3 {
        return Err(usage());
    }

    let weight: f64 = parts[0].parse().map_err(|_| usage())?;
    let reps: u32 = parts[1].parse().map_err(|_| usage())?;
    let rpe = match parts.get(2) {
        Some(raw) => {
            let rpe: u8 = raw.parse().map_err(|_| usage())?;
            if !(1..=10).contains(&rpe) {
                return Err(Error::Other(format!("RPE must be 1-10, got {}", rpe)));
            }
            Some(rpe)
        }
        None => None,
    };

    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::Other(format!("Weight must be 0 or more, got {}", weight)));
    }

    Ok(SetInput { weight, reps, rpe })
}

fn display_workout(definition: &WorkoutDefinition) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", definition.name.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!();
    for (i, ex) in definition.exercises.iter().enumerate() {
        let pr = ex
            .current_pr
            .map(|w| format!("  (PR {} kg)", w))
            .unwrap_or_default();
        println!(
            "  {}. {}: {} × {}{}",
            i + 1,
            ex.name,
            ex.sets,
            ex.target_reps,
            pr
        );
    }
    println!();
}

fn print_help() {
    println!("─────────────────────────────────────────");
    println!("  '<weight> <reps> [rpe]' + Enter to log a set");
    println!("  Enter alone: log the suggested set / skip rest / continue");
    println!("  s skip rest   t start rest timer   n next exercise");
    println!("  b previous exercise   p pause   r resume   q finish");
    println!("─────────────────────────────────────────");
}

fn display_set_prompt(session: &GuidedSession) {
    let Some(ex) = session.current_exercise() else {
        return;
    };
    println!();
    println!(
        "  {}: set {} of {} · target {} reps · suggested {} kg",
        ex.name,
        session.set_index() + 1,
        ex.sets,
        ex.target_reps,
        ex.suggested_weight
    );
    print!("> ");
    let _ = io::stdout().flush();
}

fn display_event(session: &GuidedSession, event: &SessionEvent) {
    match event {
        SessionEvent::Started => display_set_prompt(session),
        SessionEvent::SetLogged(log) => {
            println!("  ✓ Set {}: {} kg × {}", log.set_number, log.weight, log.reps);
        }
        SessionEvent::PrAchieved(pr) => {
            println!();
            println!("  ★ NEW PR! {}: {} kg", pr.exercise_name, pr.new_record);
            println!(
                "    Previous best {} kg (+{} kg) · +{} XP",
                pr.previous_record, pr.improvement, pr.xp_earned
            );
            println!("    Press Enter to continue");
        }
        SessionEvent::ExerciseChanged { .. } => {
            if let Some(ex) = session.current_exercise() {
                println!();
                println!("  → Next: {}", ex.name);
            }
            if *session.status() == SessionStatus::Active {
                display_set_prompt(session);
            }
        }
        SessionEvent::RestStarted { seconds } => {
            println!("  Rest {}s (Enter or 's' to skip)", seconds);
        }
        SessionEvent::RestWarning { remaining } => println!("  {}…", remaining),
        SessionEvent::RestFinished => {
            println!("  Rest over!");
            display_set_prompt(session);
        }
        SessionEvent::Paused => println!("  Paused. 'r' to resume."),
        SessionEvent::Resumed => {
            if *session.status() == SessionStatus::Active {
                display_set_prompt(session);
            } else {
                println!(
                    "  Resting, {}s left",
                    session.rest_timer().time_remaining()
                );
            }
        }
        // Printed by the completion callback
        SessionEvent::Completed(_) => {}
    }
}

fn display_summary(summary: &WorkoutSummary) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  Workout complete");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {}", summary.workout_name);
    println!(
        "  Duration: {}:{:02}",
        summary.duration / 60,
        summary.duration % 60
    );
    println!(
        "  Exercises: {}/{}",
        summary.exercises_completed, summary.total_exercises
    );
    println!("  Sets: {}/{}", summary.sets_completed, summary.total_sets);
    println!("  Reps: {}", summary.total_reps);
    println!("  Volume: {} kg", summary.total_volume);
    for pr in &summary.prs_achieved {
        println!("  ★ PR: {} {} kg", pr.exercise_name, pr.new_record);
    }
    println!("  XP earned: {}", summary.xp_earned);
    println!();
}

// ============================================================================
// Other commands
// ============================================================================

fn cmd_list(data_dir: PathBuf) -> Result<()> {
    let store = FileStore::new(&data_dir);
    let catalog = store.catalog()?;

    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    for template in catalog.sorted() {
        let sets: u32 = template.exercises.iter().map(|e| e.sets).sum();
        println!(
            "  {:<16} {} ({} exercises, {} sets)",
            template.id,
            template.name,
            template.exercises.len(),
            sets
        );
    }

    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    Config::default().save_to(path)?;
    println!("✓ Wrote default config to {}", path.display());
    Ok(())
}

fn cmd_copy(data_dir: PathBuf, from: &str, to: &str, name: Option<String>) -> Result<()> {
    let store = FileStore::new(&data_dir);
    let catalog = store.catalog()?;
    let mut template = catalog
        .get(from)
        .cloned()
        .ok_or_else(|| Error::WorkoutNotFound(from.to_string()))?;

    template.id = to.to_string();
    if let Some(name) = name {
        template.name = name;
    }

    let dir = &store.paths().workouts_dir;
    Catalog::save_template(dir, &template)?;
    println!(
        "✓ Copied {} to {}",
        from,
        dir.join(format!("{}.toml", to)).display()
    );
    Ok(())
}

fn cmd_history(data_dir: PathBuf, days: i64) -> Result<()> {
    let store = FileStore::new(&data_dir);
    let paths = store.paths();
    let logs = load_recent_workouts(&paths.wal_path, &paths.csv_path, days)?;

    if logs.is_empty() {
        println!("No workouts in the last {} days.", days);
        return Ok(());
    }

    for log in &logs {
        println!(
            "  {}  {:<16} {:>3}:{:02}  {} sets  {} kg",
            log.performed_on,
            log.workout_id,
            log.duration_seconds / 60,
            log.duration_seconds % 60,
            log.sets_completed,
            log.total_volume
        );
    }

    let totals = spotter_core::history::totals(&logs);
    println!();
    println!(
        "  {} workouts · {} min · {} sets · {} kg total volume",
        totals.workouts,
        totals.total_seconds / 60,
        totals.total_sets,
        totals.total_volume
    );

    Ok(())
}

fn cmd_records(data_dir: PathBuf) -> Result<()> {
    let store = FileStore::new(&data_dir);
    let state = store.training_state()?;

    if state.personal_records.is_empty() {
        println!("No personal records yet.");
        return Ok(());
    }

    let mut records: Vec<&PersonalRecord> = state.personal_records.values().collect();
    records.sort_by(|a, b| a.exercise_id.cmp(&b.exercise_id));

    for record in records {
        println!(
            "  {:<20} {} kg × {}  ({})",
            record.exercise_id, record.weight, record.reps, record.achieved_on
        );
    }

    Ok(())
}

fn cmd_rollup(data_dir: PathBuf, cleanup: bool) -> Result<()> {
    let store = FileStore::new(&data_dir);
    let paths = store.paths();

    if !paths.wal_path.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = spotter_core::csv_rollup::wal_to_csv_and_archive(&paths.wal_path, &paths.csv_path)?;

    println!("✓ Rolled up {} workouts to CSV", count);
    println!("  CSV: {}", paths.csv_path.display());

    if cleanup {
        let cleaned = spotter_core::csv_rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn cmd_calories(activity: &str, intensity: &str, minutes: f64, weight_kg: f64) -> Result<()> {
    let intensity: Intensity = intensity.parse()?;
    let kcal = estimate_calories(activity, intensity, minutes, weight_kg)?;

    println!(
        "  {} ({}) for {} min at {} kg: ~{:.1} kcal",
        activity, intensity, minutes, weight_kg, kcal
    );

    Ok(())
}
