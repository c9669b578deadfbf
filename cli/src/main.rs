mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    ResetScope, cmd_body_delete, cmd_body_history, cmd_body_log, cmd_day_add, cmd_day_delete,
    cmd_day_list, cmd_day_rename, cmd_exercise_add, cmd_exercise_list, cmd_exercise_remove,
    cmd_exercise_targets, cmd_food_add, cmd_food_delete, cmd_food_reset, cmd_food_show,
    cmd_food_update, cmd_goals_activity, cmd_goals_manual, cmd_goals_mode, cmd_goals_show,
    cmd_goals_type, cmd_program_archive, cmd_program_create, cmd_program_delete,
    cmd_program_list, cmd_program_rename, cmd_program_show, cmd_progress_exercise,
    cmd_progress_heatmap, cmd_progress_overview, cmd_progress_program, cmd_reset,
    cmd_session_cancel, cmd_session_edit, cmd_session_finish, cmd_session_list,
    cmd_session_start, cmd_set_delete, cmd_set_list, cmd_set_log, cmd_set_update,
};
use crate::config::Config;
use ironlog_core::service::TrackerService;

#[derive(Parser)]
#[command(
    name = "ironlog",
    version,
    about = "A local-first training, body and nutrition tracker",
    long_about = "\n\n  ironlog\n  lift, log, repeat.\n"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage training programs
    Program {
        #[command(subcommand)]
        command: ProgramCommands,
    },
    /// Manage workout days (templates) within a program
    Day {
        #[command(subcommand)]
        command: DayCommands,
    },
    /// Manage the exercises of a workout day
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Start, finish and edit workout sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Log and edit sets within a session
    Set {
        #[command(subcommand)]
        command: SetCommands,
    },
    /// Training progress and analytics
    Progress {
        #[command(subcommand)]
        command: ProgressCommands,
    },
    /// Track body measurements
    Body {
        #[command(subcommand)]
        command: BodyCommands,
    },
    /// Show and adjust nutrition goals
    Goals {
        #[command(subcommand)]
        command: GoalsCommands,
    },
    /// Log daily food intake
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Delete stored data
    Reset {
        /// What to clear: analytics, workouts, all
        scope: ResetScope,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProgramCommands {
    /// Create a program
    Create {
        /// Program name
        name: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List programs
    List {
        /// Include archived programs
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a program with its workout days and exercises
    Show {
        /// Program ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a program
    Rename {
        /// Program ID
        id: i64,
        /// New name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Archive a program
    Archive {
        /// Program ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore an archived program
    Unarchive {
        /// Program ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a program with its workout days, sessions and sets
    Delete {
        /// Program ID
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DayCommands {
    /// Add a workout day to a program
    Add {
        /// Program ID
        program_id: i64,
        /// Day name (e.g. "Push", "Legs")
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the workout days of a program
    List {
        /// Program ID
        program_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a workout day
    Rename {
        /// Workout day ID
        id: i64,
        /// New name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout day and its exercise list
    Delete {
        /// Workout day ID
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ExerciseCommands {
    /// Add an exercise to a workout day (reuses exercises with the same name)
    Add {
        /// Workout day ID
        day_id: i64,
        /// Exercise name
        name: String,
        /// Muscle category (chest, back, legs, shoulders, arms, abs, ...)
        #[arg(short, long)]
        category: Option<String>,
        /// Target number of sets
        #[arg(long)]
        sets: Option<i64>,
        /// Target reps (e.g. "8-12")
        #[arg(long)]
        reps: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List exercises of a workout day, or the whole exercise library
    List {
        /// Workout day ID (omit to list every known exercise)
        day_id: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an exercise entry from a workout day
    Remove {
        /// Program exercise entry ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update target sets/reps of an entry
    Targets {
        /// Program exercise entry ID
        id: i64,
        /// Target number of sets
        #[arg(long)]
        sets: Option<i64>,
        /// Target reps (e.g. "8-12")
        #[arg(long)]
        reps: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Start a session now
    Start {
        /// Workout day ID (omit for a freestyle session)
        #[arg(long)]
        day: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Finish a session
    Finish {
        /// Session ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Discard a session and all its sets
    Cancel {
        /// Session ID
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit the date or note of a session
    Edit {
        /// Session ID
        id: i64,
        /// New start time (YYYY-MM-DD, "YYYY-MM-DD HH:MM" or now)
        #[arg(long)]
        date: Option<String>,
        /// New note
        #[arg(long, conflicts_with = "clear_note")]
        note: Option<String>,
        /// Remove the note
        #[arg(long)]
        clear_note: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List sessions
    List {
        /// Only sessions of this program
        #[arg(long)]
        program: Option<i64>,
        /// Only finished sessions
        #[arg(long)]
        completed: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SetCommands {
    /// Log a set (weight and reps default to the previous set)
    Log {
        /// Session ID
        session_id: i64,
        /// Exercise name
        exercise: String,
        /// Weight in kg
        #[arg(short, long)]
        weight: Option<f64>,
        /// Repetitions
        #[arg(short, long)]
        reps: Option<i64>,
        /// Mark as a warm-up set
        #[arg(long)]
        warmup: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a logged set
    Update {
        /// Set ID
        id: i64,
        /// Weight in kg
        #[arg(short, long)]
        weight: Option<f64>,
        /// Repetitions
        #[arg(short, long)]
        reps: Option<i64>,
        /// Warm-up flag (true/false)
        #[arg(long)]
        warmup: Option<bool>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a logged set
    Delete {
        /// Set ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the sets of a session
    List {
        /// Session ID
        session_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProgressCommands {
    /// Per-session stats for one exercise
    Exercise {
        /// Exercise name
        name: String,
        /// Only sessions of this program
        #[arg(long)]
        program: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Weekly volume trend of a program
    Program {
        /// Program ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Totals across all finished sessions
    Overview {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sets per muscle group over a recent window
    Heatmap {
        /// Number of days to look back
        #[arg(short, long, default_value = "30")]
        days: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum BodyCommands {
    /// Log a body measurement
    Log {
        /// Weight in kg
        weight: f64,
        /// Height in cm (defaults to the last known height)
        #[arg(long)]
        height: Option<f64>,
        /// Body fat percentage
        #[arg(long)]
        fat: Option<f64>,
        /// Age in years
        #[arg(long)]
        age: Option<u32>,
        /// Gender: male, female, other
        #[arg(long)]
        gender: Option<String>,
        /// Measurement time (YYYY-MM-DD, "YYYY-MM-DD HH:MM" or now)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show measurement history, newest first
    History {
        /// Show only the last N entries
        #[arg(short, long)]
        limit: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a measurement
    Delete {
        /// Measurement ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalsCommands {
    /// Show current nutrition goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Switch between auto and manual targets
    Mode {
        /// auto or manual
        mode: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the goal type
    Type {
        /// maintain, lean_bulk, dirty_bulk, normal_cut, aggressive_cut
        goal_type: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the activity level
    Activity {
        /// low, moderate, high
        level: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Enter targets manually (switches to manual mode)
    Manual {
        /// Daily calories
        calories: i64,
        /// Protein grams
        #[arg(long)]
        protein: i64,
        /// Carbs grams
        #[arg(long)]
        carbs: i64,
        /// Fat grams
        #[arg(long)]
        fat: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a meal item to a day
    Add {
        /// Calories
        calories: f64,
        /// Item name (default: "Meal N")
        #[arg(short, long)]
        name: Option<String>,
        /// Protein grams
        #[arg(long, default_value = "0")]
        protein: f64,
        /// Carbs grams
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Fat grams
        #[arg(long, default_value = "0")]
        fat: f64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a meal item
    Update {
        /// Item ID
        item_id: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// Calories
        #[arg(long)]
        calories: Option<f64>,
        /// Protein grams
        #[arg(long)]
        protein: Option<f64>,
        /// Carbs grams
        #[arg(long)]
        carbs: Option<f64>,
        /// Fat grams
        #[arg(long)]
        fat: Option<f64>,
        /// Date of the log (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal item
    Delete {
        /// Item ID
        item_id: String,
        /// Date of the log (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a day's intake against goals
    Show {
        /// Date (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear every item of a day
    Reset {
        /// Date (default: today)
        date: Option<String>,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    log::debug!("Using database {}", config.db_path.display());
    let svc = TrackerService::new(&config.db_path)?;

    match cli.command {
        Commands::Program { command } => match command {
            ProgramCommands::Create {
                name,
                description,
                json,
            } => cmd_program_create(&svc, &name, description.as_deref(), json),
            ProgramCommands::List { all, json } => cmd_program_list(&svc, all, json),
            ProgramCommands::Show { id, json } => cmd_program_show(&svc, id, json),
            ProgramCommands::Rename { id, name, json } => {
                cmd_program_rename(&svc, id, &name, json)
            }
            ProgramCommands::Archive { id, json } => cmd_program_archive(&svc, id, true, json),
            ProgramCommands::Unarchive { id, json } => cmd_program_archive(&svc, id, false, json),
            ProgramCommands::Delete { id, yes, json } => cmd_program_delete(&svc, id, yes, json),
        },
        Commands::Day { command } => match command {
            DayCommands::Add {
                program_id,
                name,
                json,
            } => cmd_day_add(&svc, program_id, &name, json),
            DayCommands::List { program_id, json } => cmd_day_list(&svc, program_id, json),
            DayCommands::Rename { id, name, json } => cmd_day_rename(&svc, id, &name, json),
            DayCommands::Delete { id, yes, json } => cmd_day_delete(&svc, id, yes, json),
        },
        Commands::Exercise { command } => match command {
            ExerciseCommands::Add {
                day_id,
                name,
                category,
                sets,
                reps,
                json,
            } => cmd_exercise_add(&svc, day_id, &name, category.as_deref(), sets, reps, json),
            ExerciseCommands::List { day_id, json } => cmd_exercise_list(&svc, day_id, json),
            ExerciseCommands::Remove { id, json } => cmd_exercise_remove(&svc, id, json),
            ExerciseCommands::Targets {
                id,
                sets,
                reps,
                json,
            } => cmd_exercise_targets(&svc, id, sets, reps.as_deref(), json),
        },
        Commands::Session { command } => match command {
            SessionCommands::Start { day, json } => cmd_session_start(&svc, day, json),
            SessionCommands::Finish { id, json } => cmd_session_finish(&svc, id, json),
            SessionCommands::Cancel { id, yes, json } => cmd_session_cancel(&svc, id, yes, json),
            SessionCommands::Edit {
                id,
                date,
                note,
                clear_note,
                json,
            } => cmd_session_edit(&svc, id, date, note, clear_note, json),
            SessionCommands::List {
                program,
                completed,
                json,
            } => cmd_session_list(&svc, program, completed, json),
        },
        Commands::Set { command } => match command {
            SetCommands::Log {
                session_id,
                exercise,
                weight,
                reps,
                warmup,
                json,
            } => cmd_set_log(&svc, session_id, &exercise, weight, reps, warmup, json),
            SetCommands::Update {
                id,
                weight,
                reps,
                warmup,
                json,
            } => cmd_set_update(&svc, id, weight, reps, warmup, json),
            SetCommands::Delete { id, json } => cmd_set_delete(&svc, id, json),
            SetCommands::List { session_id, json } => cmd_set_list(&svc, session_id, json),
        },
        Commands::Progress { command } => match command {
            ProgressCommands::Exercise {
                name,
                program,
                json,
            } => cmd_progress_exercise(&svc, &name, program, json),
            ProgressCommands::Program { id, json } => cmd_progress_program(&svc, id, json),
            ProgressCommands::Overview { json } => cmd_progress_overview(&svc, json),
            ProgressCommands::Heatmap { days, json } => cmd_progress_heatmap(&svc, days, json),
        },
        Commands::Body { command } => match command {
            BodyCommands::Log {
                weight,
                height,
                fat,
                age,
                gender,
                date,
                json,
            } => cmd_body_log(
                &svc,
                weight,
                height,
                fat,
                age,
                gender.as_deref(),
                date,
                json,
            ),
            BodyCommands::History { limit, json } => cmd_body_history(&svc, limit, json),
            BodyCommands::Delete { id, json } => cmd_body_delete(&svc, id, json),
        },
        Commands::Goals { command } => match command {
            GoalsCommands::Show { json } => cmd_goals_show(&svc, json),
            GoalsCommands::Mode { mode, json } => cmd_goals_mode(&svc, &mode, json),
            GoalsCommands::Type { goal_type, json } => cmd_goals_type(&svc, &goal_type, json),
            GoalsCommands::Activity { level, json } => cmd_goals_activity(&svc, &level, json),
            GoalsCommands::Manual {
                calories,
                protein,
                carbs,
                fat,
                json,
            } => cmd_goals_manual(&svc, calories, protein, carbs, fat, json),
        },
        Commands::Food { command } => match command {
            FoodCommands::Add {
                calories,
                name,
                protein,
                carbs,
                fat,
                date,
                json,
            } => cmd_food_add(&svc, calories, name, protein, carbs, fat, date, json),
            FoodCommands::Update {
                item_id,
                name,
                calories,
                protein,
                carbs,
                fat,
                date,
                json,
            } => cmd_food_update(
                &svc, &item_id, name, calories, protein, carbs, fat, date, json,
            ),
            FoodCommands::Delete {
                item_id,
                date,
                json,
            } => cmd_food_delete(&svc, &item_id, date, json),
            FoodCommands::Show { date, json } => cmd_food_show(&svc, date, json),
            FoodCommands::Reset { date, yes, json } => cmd_food_reset(&svc, date, yes, json),
        },
        Commands::Reset { scope, yes, json } => cmd_reset(&svc, scope, yes, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heatmap_defaults_to_thirty_days() {
        let cli = Cli::try_parse_from(["ironlog", "progress", "heatmap"]).unwrap();
        match cli.command {
            Commands::Progress {
                command: ProgressCommands::Heatmap { days, json },
            } => {
                assert_eq!(days, 30);
                assert!(!json);
            }
            _ => panic!("expected progress heatmap"),
        }

        let cli = Cli::try_parse_from(["ironlog", "progress", "heatmap", "--days", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Progress {
                command: ProgressCommands::Heatmap { days: 7, .. }
            }
        ));
    }
}
