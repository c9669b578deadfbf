use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use ironlog_core::models::Gender;
use ironlog_core::service::{BodyMetricsInput, TrackerService};

use super::helpers::{format_timestamp, no_neg_zero, parse_datetime, print_json};

const LBS_PER_KG: f64 = 2.20462;

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_body_log(
    svc: &TrackerService,
    weight: f64,
    height: Option<f64>,
    fat: Option<f64>,
    age: Option<u32>,
    gender: Option<&str>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if weight <= 0.0 {
        bail!("Weight must be greater than 0");
    }
    if let Some(f) = fat {
        if !(0.0..100.0).contains(&f) {
            bail!("Body fat must be between 0 and 100");
        }
    }

    let input = BodyMetricsInput {
        date: parse_datetime(date)?,
        weight,
        height,
        body_fat_percentage: fat,
        age,
        gender: gender.map(str::parse::<Gender>).transpose()?,
    };
    let outcome = svc.log_body_metrics(&input)?;

    if json {
        return print_json(&outcome);
    }

    let m = &outcome.metric;
    println!(
        "Logged {:.1} kg ({:.1} lbs) at {} cm on {}",
        m.weight,
        m.weight * LBS_PER_KG,
        m.height,
        format_timestamp(m.date)
    );
    if let Some(f) = m.fat_percentage {
        println!("  Body fat: {f:.1}%");
    }
    if let Some(ref goals) = outcome.goals {
        println!(
            "  Targets updated: {} kcal  P {}g  C {}g  F {}g",
            goals.calories_target, goals.protein_target, goals.carbs_target, goals.fat_target
        );
    }
    Ok(())
}

pub(crate) fn cmd_body_history(svc: &TrackerService, limit: Option<i64>, json: bool) -> Result<()> {
    let metrics = svc.body_history(limit)?;

    if json {
        return print_json(&metrics);
    }
    if metrics.is_empty() {
        eprintln!("No measurements yet. Use `ironlog body log <kg> --height <cm>` to add one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct MetricRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight (kg)")]
        kg: String,
        #[tabled(rename = "Weight (lbs)")]
        lbs: String,
        #[tabled(rename = "Height (cm)")]
        height: String,
        #[tabled(rename = "Body fat")]
        fat: String,
    }

    let rows: Vec<MetricRow> = metrics
        .iter()
        .map(|m| MetricRow {
            id: m.id,
            date: format_timestamp(m.date),
            kg: format!("{:.1}", m.weight),
            lbs: format!("{:.1}", m.weight * LBS_PER_KG),
            height: format!("{:.0}", no_neg_zero(m.height)),
            fat: m.fat_percentage.map_or("-".into(), |f| format!("{f:.1}%")),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_body_delete(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    svc.delete_body_metric(id)?;

    if json {
        print_json(&serde_json::json!({ "deleted": id }))?;
    } else {
        println!("Deleted measurement {id}");
    }
    Ok(())
}
