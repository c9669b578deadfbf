use anyhow::Result;

use ironlog_core::models::{ActivityLevel, GoalMode, GoalType, NutritionGoals};
use ironlog_core::service::TrackerService;

use super::helpers::print_json;

fn print_goals(goals: &NutritionGoals) {
    println!("Mode:      {}", goals.mode);
    println!("Goal:      {}", goals.goal_type.label());
    println!("Activity:  {}", goals.activity_level.label());
    println!("Calories:  {} kcal", goals.calories_target);
    println!(
        "Macros:    P {}g  C {}g  F {}g",
        goals.protein_target, goals.carbs_target, goals.fat_target
    );
}

pub(crate) fn cmd_goals_show(svc: &TrackerService, json: bool) -> Result<()> {
    let goals = svc.get_nutrition_goals()?;
    if json {
        return print_json(&goals);
    }

    print_goals(&goals);
    if goals.mode == GoalMode::Manual {
        if let Some(auto) = svc.preview_targets(goals.goal_type, goals.activity_level)? {
            println!(
                "\nAuto mode would set {} kcal  P {}g  C {}g  F {}g",
                auto.calories_target, auto.protein_target, auto.carbs_target, auto.fat_target
            );
        }
    } else if svc.get_user_profile()?.is_none() {
        eprintln!("\nLog a body measurement to calculate targets automatically.");
    }
    Ok(())
}

pub(crate) fn cmd_goals_mode(svc: &TrackerService, mode: &str, json: bool) -> Result<()> {
    let goals = svc.set_goal_mode(mode.parse()?)?;
    if json {
        print_json(&goals)
    } else {
        print_goals(&goals);
        Ok(())
    }
}

pub(crate) fn cmd_goals_type(svc: &TrackerService, goal_type: &str, json: bool) -> Result<()> {
    let goals = svc.set_goal_type(goal_type.parse::<GoalType>()?)?;
    if json {
        print_json(&goals)
    } else {
        print_goals(&goals);
        Ok(())
    }
}

pub(crate) fn cmd_goals_activity(svc: &TrackerService, level: &str, json: bool) -> Result<()> {
    let goals = svc.set_activity_level(level.parse::<ActivityLevel>()?)?;
    if json {
        print_json(&goals)
    } else {
        print_goals(&goals);
        Ok(())
    }
}

pub(crate) fn cmd_goals_manual(
    svc: &TrackerService,
    calories: i64,
    protein: i64,
    carbs: i64,
    fat: i64,
    json: bool,
) -> Result<()> {
    let goals = svc.set_manual_targets(calories, protein, carbs, fat)?;
    if json {
        print_json(&goals)
    } else {
        print_goals(&goals);
        Ok(())
    }
}
