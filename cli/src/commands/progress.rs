use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use ironlog_core::muscle_map::color_for_volume;
use ironlog_core::service::TrackerService;

use super::helpers::{no_neg_zero, print_json};

pub(crate) fn cmd_progress_exercise(
    svc: &TrackerService,
    name: &str,
    program_id: Option<i64>,
    json: bool,
) -> Result<()> {
    let exercise = svc.find_exercise(name)?;
    let progress = svc.exercise_progress(exercise.id, program_id)?;

    if json {
        return print_json(&progress);
    }
    if progress.stats.is_empty() {
        eprintln!("No finished sessions with {} yet.", exercise.name);
        return Ok(());
    }

    #[derive(Tabled)]
    struct StatRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Max (kg)")]
        max_weight: String,
        #[tabled(rename = "Volume (kg)")]
        volume: String,
        #[tabled(rename = "Reps")]
        reps: i64,
    }

    let rows: Vec<StatRow> = progress
        .stats
        .iter()
        .map(|s| StatRow {
            date: s.date.format("%Y-%m-%d").to_string(),
            max_weight: format!("{:.1}", no_neg_zero(s.max_weight)),
            volume: format!("{:.0}", no_neg_zero(s.volume)),
            reps: s.reps,
        })
        .collect();

    println!("{}", exercise.name);
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let delta = &progress.delta;
    match delta.is_improving {
        Some(improving) => {
            let trend = if improving { "improving" } else { "not improving" };
            println!(
                "Since last session: {:+.1} kg max, {:+.0} kg volume ({trend})",
                no_neg_zero(delta.weight_gain),
                no_neg_zero(delta.volume_gain)
            );
        }
        None => println!("Log another session to see progress."),
    }
    Ok(())
}

pub(crate) fn cmd_progress_program(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    let program = svc.get_program(id)?;
    let trends = svc.program_trends(id)?;

    if json {
        return print_json(&trends);
    }
    if trends.is_empty() {
        eprintln!("No finished sessions for '{}' yet.", program.name);
        return Ok(());
    }

    #[derive(Tabled)]
    struct WeekRow {
        #[tabled(rename = "Week of")]
        week: String,
        #[tabled(rename = "Sessions")]
        sessions: usize,
        #[tabled(rename = "Volume (kg)")]
        volume: String,
        #[tabled(rename = "Avg weight (kg)")]
        intensity: String,
    }

    let rows: Vec<WeekRow> = trends
        .iter()
        .map(|t| WeekRow {
            week: t.week_start.format("%Y-%m-%d").to_string(),
            sessions: t.sessions_count,
            volume: format!("{:.0}", no_neg_zero(t.volume)),
            intensity: format!("{:.1}", no_neg_zero(t.intensity_index)),
        })
        .collect();

    println!("{}", program.name);
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_progress_overview(svc: &TrackerService, json: bool) -> Result<()> {
    let overview = svc.progress_overview()?;
    if json {
        return print_json(&overview);
    }
    println!("Workouts:         {}", overview.workouts);
    println!(
        "Total volume:     {:.0} kg",
        no_neg_zero(overview.total_volume)
    );
    println!("Unique exercises: {}", overview.unique_exercises);
    Ok(())
}

pub(crate) fn cmd_progress_heatmap(svc: &TrackerService, days: i64, json: bool) -> Result<()> {
    if days <= 0 {
        bail!("Days must be greater than 0");
    }
    let heatmap = svc.muscle_heatmap(days)?;

    if json {
        return print_json(&heatmap);
    }

    #[derive(Tabled)]
    struct GroupRow {
        #[tabled(rename = "Muscle group")]
        group: String,
        #[tabled(rename = "Sets")]
        sets: u32,
        #[tabled(rename = "Intensity")]
        intensity: String,
    }

    let max = f64::from(heatmap.max);
    let mut rows: Vec<GroupRow> = heatmap
        .groups
        .iter()
        .map(|(group, &sets)| GroupRow {
            group: group.clone(),
            sets,
            intensity: match color_for_volume(f64::from(sets), Some(max)).opacity() {
                o if o > 0.0 => format!("{:.0}%", o * 100.0),
                _ => "-".to_string(),
            },
        })
        .collect();
    rows.sort_by(|a, b| b.sets.cmp(&a.sets).then_with(|| a.group.cmp(&b.group)));

    println!("Last {days} day(s)");
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}
