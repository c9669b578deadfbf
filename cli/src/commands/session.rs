use std::collections::HashMap;

use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use ironlog_core::models::{Session, SessionFilter, UpdateSession, UpdateSetLog};
use ironlog_core::service::TrackerService;

use super::helpers::{
    format_timestamp, no_neg_zero, parse_datetime, print_json, require_confirmation, truncate,
};

fn session_label(svc: &TrackerService, session: &Session) -> Result<String> {
    let Some(program_id) = session.program_id else {
        return Ok("Freestyle".to_string());
    };
    let program = svc.get_program(program_id)?;
    let day = match session.template_id {
        Some(id) => svc
            .list_workout_templates(program_id)?
            .into_iter()
            .find(|t| t.id == id)
            .map(|t| t.name),
        None => None,
    };
    Ok(match day {
        Some(day) => format!("{} / {day}", program.name),
        None => program.name,
    })
}

pub(crate) fn cmd_session_start(svc: &TrackerService, day: Option<i64>, json: bool) -> Result<()> {
    let session = svc.start_session(day)?;
    if json {
        return print_json(&session);
    }

    println!(
        "Started session {} ({}) at {}",
        session.id,
        session_label(svc, &session)?,
        format_timestamp(session.date)
    );
    if let Some(day_id) = day {
        for entry in svc.list_template_exercises(day_id)? {
            println!(
                "  {}. {}  {} x {}",
                entry.order,
                entry.exercise_name.as_deref().unwrap_or("?"),
                entry.target_sets.map_or("-".to_string(), |s| s.to_string()),
                entry.target_reps.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

pub(crate) fn cmd_session_finish(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    let session = svc.finish_session(id)?;
    if json {
        return print_json(&session);
    }

    let sets = svc.sets_for_session(id)?;
    #[allow(clippy::cast_precision_loss)]
    let volume: f64 = sets.iter().map(|s| s.weight * s.reps as f64).sum();
    println!(
        "Finished session {id}: {} set(s), {:.0} kg total volume",
        sets.len(),
        no_neg_zero(volume)
    );
    if let Some(end) = session.end_time {
        let minutes = (end - session.date).num_minutes();
        if minutes >= 0 {
            println!("  Duration: {minutes} min");
        }
    }
    Ok(())
}

pub(crate) fn cmd_session_cancel(
    svc: &TrackerService,
    id: i64,
    yes: bool,
    json: bool,
) -> Result<()> {
    svc.get_session(id)?;
    require_confirmation(yes, &format!("session {id} and every set logged in it"))?;
    let removed = svc.cancel_session(id)?;
    if json {
        print_json(&serde_json::json!({ "deleted": id, "sets_removed": removed }))?;
    } else {
        println!("Discarded session {id} ({removed} set(s) removed)");
    }
    Ok(())
}

pub(crate) fn cmd_session_edit(
    svc: &TrackerService,
    id: i64,
    date: Option<String>,
    note: Option<String>,
    clear_note: bool,
    json: bool,
) -> Result<()> {
    if date.is_none() && note.is_none() && !clear_note {
        bail!("Nothing to update. Use --date, --note or --clear-note");
    }

    let update = UpdateSession {
        date: date.map(|d| parse_datetime(Some(d))).transpose()?,
        note: if clear_note { Some(None) } else { note.map(Some) },
    };
    let session = svc.update_session(id, &update)?;

    if json {
        print_json(&session)?;
    } else {
        println!(
            "Updated session {}: {}{}",
            session.id,
            format_timestamp(session.date),
            session
                .note
                .as_deref()
                .map(|n| format!("  \"{n}\""))
                .unwrap_or_default()
        );
    }
    Ok(())
}

pub(crate) fn cmd_session_list(
    svc: &TrackerService,
    program_id: Option<i64>,
    completed_only: bool,
    json: bool,
) -> Result<()> {
    let sessions = svc.list_sessions(SessionFilter {
        program_id,
        completed_only,
    })?;

    if json {
        return print_json(&sessions);
    }
    if sessions.is_empty() {
        eprintln!("No sessions found. Use `ironlog session start` to begin one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct SessionRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Workout")]
        workout: String,
        #[tabled(rename = "Sets")]
        sets: usize,
        #[tabled(rename = "Status")]
        status: &'static str,
        #[tabled(rename = "Note")]
        note: String,
    }

    let mut rows = Vec::with_capacity(sessions.len());
    for s in &sessions {
        rows.push(SessionRow {
            id: s.id,
            date: format_timestamp(s.date),
            workout: truncate(&session_label(svc, s)?, 30),
            sets: svc.sets_for_session(s.id)?.len(),
            status: if s.is_completed { "done" } else { "in progress" },
            note: s.note.as_deref().map(|n| truncate(n, 30)).unwrap_or_default(),
        });
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

// --- Sets ---

pub(crate) fn cmd_set_log(
    svc: &TrackerService,
    session_id: i64,
    exercise: &str,
    weight: Option<f64>,
    reps: Option<i64>,
    warmup: bool,
    json: bool,
) -> Result<()> {
    let exercise = svc.find_exercise(exercise)?;
    let set = svc.log_set(session_id, exercise.id, weight, reps, warmup)?;

    if json {
        print_json(&set)?;
    } else {
        let tag = if set.is_warmup { " (warm-up)" } else { "" };
        println!(
            "{} set {}: {:.1} kg x {}{tag}  [set ID {}]",
            exercise.name,
            set.set_number,
            no_neg_zero(set.weight),
            set.reps,
            set.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_set_update(
    svc: &TrackerService,
    id: i64,
    weight: Option<f64>,
    reps: Option<i64>,
    warmup: Option<bool>,
    json: bool,
) -> Result<()> {
    if weight.is_none() && reps.is_none() && warmup.is_none() {
        bail!("Nothing to update. Use --weight, --reps or --warmup");
    }
    let set = svc.update_set(
        id,
        &UpdateSetLog {
            weight,
            reps,
            is_warmup: warmup,
        },
    )?;
    if json {
        print_json(&set)?;
    } else {
        println!(
            "Updated set {}: {:.1} kg x {}",
            set.id,
            no_neg_zero(set.weight),
            set.reps
        );
    }
    Ok(())
}

pub(crate) fn cmd_set_delete(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    let deleted = svc.delete_set(id)?;
    if json {
        print_json(&serde_json::json!({ "deleted": id, "found": deleted }))?;
    } else if deleted {
        println!("Deleted set {id}");
    } else {
        eprintln!("No set with ID {id}");
    }
    Ok(())
}

pub(crate) fn cmd_set_list(svc: &TrackerService, session_id: i64, json: bool) -> Result<()> {
    svc.get_session(session_id)?;
    let sets = svc.sets_for_session(session_id)?;

    if json {
        return print_json(&sets);
    }
    if sets.is_empty() {
        eprintln!("No sets logged in session {session_id}.");
        return Ok(());
    }

    let names: HashMap<i64, String> = svc
        .list_exercises()?
        .into_iter()
        .map(|e| (e.id, e.name))
        .collect();

    #[derive(Tabled)]
    struct SetRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Exercise")]
        exercise: String,
        #[tabled(rename = "Set")]
        set_number: i64,
        #[tabled(rename = "Weight (kg)")]
        weight: String,
        #[tabled(rename = "Reps")]
        reps: i64,
        #[tabled(rename = "Warm-up")]
        warmup: &'static str,
    }

    let rows: Vec<SetRow> = sets
        .iter()
        .map(|s| SetRow {
            id: s.id,
            exercise: truncate(
                names.get(&s.exercise_id).map_or("?", String::as_str),
                30,
            ),
            set_number: s.set_number,
            weight: format!("{:.1}", no_neg_zero(s.weight)),
            reps: s.reps,
            warmup: if s.is_warmup { "yes" } else { "" },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}
