//! Calorie and macro targets derived from body statistics.

use crate::models::{ActivityLevel, Gender, GoalType, NutritionTargets, UserProfile};

const DEFAULT_AGE: u32 = 25;

const PROTEIN_G_PER_KG: f64 = 2.0;
const FAT_G_PER_KG: f64 = 0.9;
const KCAL_PER_G_PROTEIN: i64 = 4;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: i64 = 9;

/// Daily macro split in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Macros {
    pub protein: i64,
    pub fat: i64,
    pub carbs: i64,
}

/// Basal metabolic rate (Mifflin-St Jeor).
///
/// Any gender other than female, including unset, uses the male offset.
#[must_use]
pub fn calculate_bmr(profile: &UserProfile) -> f64 {
    let age = f64::from(profile.age.unwrap_or(DEFAULT_AGE));
    let base = 10.0 * profile.weight + 6.25 * profile.height - 5.0 * age;
    match profile.gender {
        Some(Gender::Female) => base - 161.0,
        Some(Gender::Male | Gender::Other) | None => base + 5.0,
    }
}

#[must_use]
pub fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Low => 1.2,
        ActivityLevel::Moderate => 1.55,
        ActivityLevel::High => 1.9,
    }
}

#[must_use]
pub fn calculate_tdee(bmr: f64, level: ActivityLevel) -> f64 {
    bmr * activity_multiplier(level)
}

#[must_use]
pub fn goal_adjustment(goal_type: GoalType) -> f64 {
    match goal_type {
        GoalType::Maintain => 0.0,
        GoalType::LeanBulk => 250.0,
        GoalType::DirtyBulk => 500.0,
        GoalType::NormalCut => -300.0,
        GoalType::AggressiveCut => -600.0,
    }
}

#[must_use]
pub fn apply_goal_adjustment(tdee: f64, goal_type: GoalType) -> f64 {
    tdee + goal_adjustment(goal_type)
}

/// Protein and fat scale with body weight; carbs take whatever calories are
/// left and never go below zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_macros(target_calories: i64, weight: f64) -> Macros {
    let protein = (weight * PROTEIN_G_PER_KG).round() as i64;
    let fat = (weight * FAT_G_PER_KG).round() as i64;

    let remaining = target_calories - protein * KCAL_PER_G_PROTEIN - fat * KCAL_PER_G_FAT;
    let carbs = (remaining as f64 / KCAL_PER_G_CARBS).round() as i64;

    Macros {
        protein,
        fat,
        carbs: carbs.max(0),
    }
}

#[must_use]
pub fn calculate_nutrition_goals(
    profile: &UserProfile,
    goal_type: GoalType,
    activity_level: ActivityLevel,
) -> NutritionTargets {
    let bmr = calculate_bmr(profile);
    let tdee = calculate_tdee(bmr, activity_level);
    let calories = apply_goal_adjustment(tdee, goal_type).round() as i64;
    let macros = calculate_macros(calories, profile.weight);

    NutritionTargets {
        calories_target: calories,
        protein_target: macros.protein,
        carbs_target: macros.carbs,
        fat_target: macros.fat,
        goal_type,
        activity_level,
    }
}
