use anyhow::Result;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use ironlog_core::models::{Exercise, Program, ProgramExercise, WorkoutTemplate};
use ironlog_core::service::TrackerService;

use super::helpers::{print_json, require_confirmation, truncate};

pub(crate) fn cmd_program_create(
    svc: &TrackerService,
    name: &str,
    description: Option<&str>,
    json: bool,
) -> Result<()> {
    let program = svc.create_program(name, description)?;
    if json {
        print_json(&program)?;
    } else {
        println!("Created program '{}' (ID {})", program.name, program.id);
        println!("  Add a workout day with `ironlog day add {} <name>`", program.id);
    }
    Ok(())
}

pub(crate) fn cmd_program_list(
    svc: &TrackerService,
    include_archived: bool,
    json: bool,
) -> Result<()> {
    let programs = svc.list_programs(include_archived)?;

    if json {
        return print_json(&programs);
    }
    if programs.is_empty() {
        eprintln!("No programs yet. Use `ironlog program create <name>` to add one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct ProgramRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Days")]
        days: usize,
        #[tabled(rename = "Status")]
        status: &'static str,
        #[tabled(rename = "Description")]
        description: String,
    }

    let mut rows = Vec::with_capacity(programs.len());
    for p in &programs {
        rows.push(ProgramRow {
            id: p.id,
            name: truncate(&p.name, 30),
            days: svc.list_workout_templates(p.id)?.len(),
            status: if p.is_archived { "archived" } else { "active" },
            description: p
                .description
                .as_deref()
                .map(|d| truncate(d, 40))
                .unwrap_or_default(),
        });
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_program_show(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct DayDetail {
        #[serde(flatten)]
        template: WorkoutTemplate,
        exercises: Vec<ProgramExercise>,
    }

    #[derive(Serialize)]
    struct ProgramDetail {
        #[serde(flatten)]
        program: Program,
        days: Vec<DayDetail>,
    }

    let program = svc.get_program(id)?;
    let mut days = Vec::new();
    for template in svc.list_workout_templates(id)? {
        let exercises = svc.list_template_exercises(template.id)?;
        days.push(DayDetail {
            template,
            exercises,
        });
    }

    if json {
        return print_json(&ProgramDetail { program, days });
    }

    let status = if program.is_archived { " [archived]" } else { "" };
    println!("{} (ID {}){status}", program.name, program.id);
    if let Some(ref d) = program.description {
        println!("  {d}");
    }
    if days.is_empty() {
        println!("\n  No workout days yet.");
    }
    for day in &days {
        println!("\n{} (day ID {})", day.template.name, day.template.id);
        if day.exercises.is_empty() {
            println!("  (no exercises)");
        } else {
            print_template_table(&day.exercises);
        }
    }
    if let Some(last) = svc.latest_completed_session(id)? {
        println!("\nLast finished session: {}", last.date.format("%Y-%m-%d"));
    }
    Ok(())
}

pub(crate) fn cmd_program_rename(
    svc: &TrackerService,
    id: i64,
    name: &str,
    json: bool,
) -> Result<()> {
    let program = svc.rename_program(id, name)?;
    if json {
        print_json(&program)?;
    } else {
        println!("Renamed program {} to '{}'", program.id, program.name);
    }
    Ok(())
}

pub(crate) fn cmd_program_archive(
    svc: &TrackerService,
    id: i64,
    archived: bool,
    json: bool,
) -> Result<()> {
    let program = svc.set_program_archived(id, archived)?;
    if json {
        print_json(&program)?;
    } else if archived {
        println!("Archived program '{}'", program.name);
    } else {
        println!("Restored program '{}'", program.name);
    }
    Ok(())
}

pub(crate) fn cmd_program_delete(
    svc: &TrackerService,
    id: i64,
    yes: bool,
    json: bool,
) -> Result<()> {
    let program = svc.get_program(id)?;
    require_confirmation(
        yes,
        &format!("program '{}' with all of its sessions and sets", program.name),
    )?;
    let summary = svc.delete_program(id)?;

    if json {
        print_json(&serde_json::json!({ "deleted": id, "removed": summary }))?;
    } else {
        println!(
            "Deleted program '{}': {} day(s), {} exercise entr(ies), {} session(s), {} set(s)",
            program.name,
            summary.workout_templates,
            summary.program_exercises,
            summary.sessions,
            summary.sets
        );
    }
    Ok(())
}

// --- Workout days ---

pub(crate) fn cmd_day_add(
    svc: &TrackerService,
    program_id: i64,
    name: &str,
    json: bool,
) -> Result<()> {
    let template = svc.add_workout_template(program_id, name)?;
    if json {
        print_json(&template)?;
    } else {
        println!("Added workout day '{}' (ID {})", template.name, template.id);
    }
    Ok(())
}

pub(crate) fn cmd_day_list(svc: &TrackerService, program_id: i64, json: bool) -> Result<()> {
    svc.get_program(program_id)?;
    let templates = svc.list_workout_templates(program_id)?;

    if json {
        return print_json(&templates);
    }
    if templates.is_empty() {
        eprintln!("No workout days. Use `ironlog day add {program_id} <name>` to add one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct DayRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Exercises")]
        exercises: usize,
    }

    let mut rows = Vec::with_capacity(templates.len());
    for t in &templates {
        rows.push(DayRow {
            id: t.id,
            name: truncate(&t.name, 30),
            exercises: svc.list_template_exercises(t.id)?.len(),
        });
    }
    println!("{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}

pub(crate) fn cmd_day_rename(svc: &TrackerService, id: i64, name: &str, json: bool) -> Result<()> {
    let template = svc.rename_workout_template(id, name)?;
    if json {
        print_json(&template)?;
    } else {
        println!("Renamed workout day {} to '{}'", template.id, template.name);
    }
    Ok(())
}

pub(crate) fn cmd_day_delete(svc: &TrackerService, id: i64, yes: bool, json: bool) -> Result<()> {
    require_confirmation(yes, &format!("workout day {id} and its exercise list"))?;
    let removed = svc.delete_workout_template(id)?;
    if json {
        print_json(&serde_json::json!({ "deleted": id, "exercises_removed": removed }))?;
    } else {
        println!("Deleted workout day {id} ({removed} exercise entr(ies) removed)");
    }
    Ok(())
}

// --- Exercises ---

pub(crate) fn cmd_exercise_add(
    svc: &TrackerService,
    day_id: i64,
    name: &str,
    category: Option<&str>,
    sets: Option<i64>,
    reps: Option<String>,
    json: bool,
) -> Result<()> {
    let entry = svc.add_exercise_to_template(day_id, name, category, sets, reps)?;
    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Added {} as #{} (entry ID {})",
            entry.exercise_name.as_deref().unwrap_or(name),
            entry.order,
            entry.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_exercise_list(
    svc: &TrackerService,
    day_id: Option<i64>,
    json: bool,
) -> Result<()> {
    match day_id {
        Some(id) => {
            let entries = svc.list_template_exercises(id)?;
            if json {
                print_json(&entries)?;
            } else if entries.is_empty() {
                eprintln!("No exercises. Use `ironlog exercise add {id} <name>` to add one.");
            } else {
                print_template_table(&entries);
            }
        }
        None => {
            let exercises = svc.list_exercises()?;
            if json {
                print_json(&exercises)?;
            } else if exercises.is_empty() {
                eprintln!("No exercises yet.");
            } else {
                print_exercise_table(&exercises);
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_exercise_remove(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    let removed = svc.remove_program_exercise(id)?;
    if json {
        print_json(&serde_json::json!({ "deleted": id, "found": removed }))?;
    } else if removed {
        println!("Removed exercise entry {id}");
    } else {
        eprintln!("No exercise entry with ID {id}");
    }
    Ok(())
}

pub(crate) fn cmd_exercise_targets(
    svc: &TrackerService,
    id: i64,
    sets: Option<i64>,
    reps: Option<&str>,
    json: bool,
) -> Result<()> {
    let entry = svc.update_exercise_targets(id, sets, reps)?;
    if json {
        print_json(&entry)?;
    } else {
        println!(
            "{}: {} x {}",
            entry.exercise_name.as_deref().unwrap_or("?"),
            entry.target_sets.map_or("-".to_string(), |s| s.to_string()),
            entry.target_reps.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn print_template_table(entries: &[ProgramExercise]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "#")]
        order: i64,
        #[tabled(rename = "Entry")]
        id: i64,
        #[tabled(rename = "Exercise")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Sets")]
        sets: String,
        #[tabled(rename = "Reps")]
        reps: String,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            order: e.order,
            id: e.id,
            name: truncate(e.exercise_name.as_deref().unwrap_or("?"), 30),
            category: e.exercise_category.clone().unwrap_or_default(),
            sets: e.target_sets.map_or("-".into(), |s| s.to_string()),
            reps: e.target_reps.clone().unwrap_or_else(|| "-".into()),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

fn print_exercise_table(exercises: &[Exercise]) {
    #[derive(Tabled)]
    struct ExerciseRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
    }

    let rows: Vec<ExerciseRow> = exercises
        .iter()
        .map(|e| ExerciseRow {
            id: e.id,
            name: truncate(&e.name, 35),
            category: e.category.clone().unwrap_or_default(),
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
}
