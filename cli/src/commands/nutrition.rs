use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use ironlog_core::models::{NewMealItem, NutritionLog, UpdateMealItem};
use ironlog_core::service::TrackerService;

use super::helpers::{no_neg_zero, parse_date, print_json, require_confirmation, truncate};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_food_add(
    svc: &TrackerService,
    calories: f64,
    name: Option<String>,
    protein: f64,
    carbs: f64,
    fat: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let log = svc.add_meal_item(
        date,
        &NewMealItem {
            name,
            calories,
            protein,
            carbs,
            fat,
        },
    )?;

    if json {
        return print_json(&log);
    }
    if let Some(item) = log.items.last() {
        println!(
            "Added {} ({:.0} kcal) to {}  [item {}]",
            item.name,
            item.calories,
            date.format("%Y-%m-%d"),
            item.id
        );
    }
    print_totals(svc, &log)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_food_update(
    svc: &TrackerService,
    item_id: &str,
    name: Option<String>,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let log = svc.update_meal_item(
        date,
        item_id,
        &UpdateMealItem {
            name,
            calories,
            protein,
            carbs,
            fat,
        },
    )?;

    if json {
        return print_json(&log);
    }
    println!("Updated item {item_id}");
    print_totals(svc, &log)
}

pub(crate) fn cmd_food_delete(
    svc: &TrackerService,
    item_id: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let log = svc.delete_meal_item(date, item_id)?;

    if json {
        return print_json(&log);
    }
    println!("Deleted item {item_id}");
    print_totals(svc, &log)
}

pub(crate) fn cmd_food_show(svc: &TrackerService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let log = svc.get_nutrition_log(date)?;

    if json {
        return print_json(&log);
    }
    let Some(log) = log else {
        eprintln!(
            "Nothing logged for {}. Use `ironlog food add <kcal>` to add an item.",
            date.format("%Y-%m-%d")
        );
        return Ok(());
    };

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Item")]
        name: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    println!("{}", date.format("%A, %Y-%m-%d"));
    if !log.items.is_empty() {
        let rows: Vec<ItemRow> = log
            .items
            .iter()
            .map(|i| ItemRow {
                id: i.id.chars().take(8).collect(),
                name: truncate(&i.name, 30),
                calories: format!("{:.0}", no_neg_zero(i.calories)),
                protein: format!("{:.1}g", no_neg_zero(i.protein)),
                carbs: format!("{:.1}g", no_neg_zero(i.carbs)),
                fat: format!("{:.1}g", no_neg_zero(i.fat)),
            })
            .collect();
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..6)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }
    print_totals(svc, &log)
}

pub(crate) fn cmd_food_reset(
    svc: &TrackerService,
    date: Option<String>,
    yes: bool,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let date_str = date.format("%Y-%m-%d").to_string();
    require_confirmation(yes, &format!("every food item logged on {date_str}"))?;
    let log = svc.reset_nutrition_day(date)?;

    if json {
        print_json(&serde_json::json!({ "date": date_str, "cleared": log.is_some() }))?;
    } else if log.is_some() {
        println!("Cleared food log for {date_str}");
    } else {
        eprintln!("Nothing logged for {date_str}");
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn print_totals(svc: &TrackerService, log: &NutritionLog) -> Result<()> {
    let goals = svc.get_nutrition_goals()?;
    println!(
        "Total: {:.0} / {} kcal  P {:.0}/{}g  C {:.0}/{}g  F {:.0}/{}g",
        no_neg_zero(log.calories),
        goals.calories_target,
        no_neg_zero(log.protein),
        goals.protein_target,
        no_neg_zero(log.carbs),
        goals.carbs_target,
        no_neg_zero(log.fat),
        goals.fat_target
    );
    let remaining = goals.calories_target as f64 - log.calories;
    if remaining >= 0.0 {
        println!("Remaining: {remaining:.0} kcal");
    } else {
        println!("Over by {:.0} kcal", -remaining);
    }
    Ok(())
}
