use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Storage format for point-in-time values (sessions, sets, metrics).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Storage format for calendar-day keys (nutrition logs).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const DEFAULT_TEMPLATE_NAME: &str = "Default Workout";

/// Coarse muscle categories an exercise can be tagged with.
pub const MUSCLE_CATEGORIES: &[&str] = &[
    "chest",
    "back",
    "legs",
    "shoulders",
    "arms",
    "abs",
    "biceps",
    "triceps",
    "forearms",
    "quads",
    "hamstrings",
    "glutes",
    "calves",
    "traps",
];

pub fn validate_category(category: &str) -> Result<String> {
    let lower = category.to_lowercase();
    if MUSCLE_CATEGORIES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        bail!(
            "Invalid muscle category '{category}'. Must be one of: {}",
            MUSCLE_CATEGORIES.join(", ")
        )
    }
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => bail!("Invalid gender '{s}'. Use male, female, or other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Low,
    Moderate,
    High,
}

impl ActivityLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Low => "low",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::High => "high",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ActivityLevel::Low => "Low (Sedentary)",
            ActivityLevel::Moderate => "Moderate (3-5 days/week)",
            ActivityLevel::High => "High (6-7 days/week)",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(ActivityLevel::Low),
            "moderate" => Ok(ActivityLevel::Moderate),
            "high" => Ok(ActivityLevel::High),
            _ => bail!("Invalid activity level '{s}'. Use low, moderate, or high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Maintain,
    LeanBulk,
    DirtyBulk,
    NormalCut,
    AggressiveCut,
}

impl GoalType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GoalType::Maintain => "maintain",
            GoalType::LeanBulk => "lean_bulk",
            GoalType::DirtyBulk => "dirty_bulk",
            GoalType::NormalCut => "normal_cut",
            GoalType::AggressiveCut => "aggressive_cut",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GoalType::Maintain => "Maintain Weight",
            GoalType::LeanBulk => "Lean Bulk (+250 kcal)",
            GoalType::DirtyBulk => "Dirty Bulk (+500 kcal)",
            GoalType::NormalCut => "Normal Cut (-300 kcal)",
            GoalType::AggressiveCut => "Aggressive Cut (-600 kcal)",
        }
    }
}

impl FromStr for GoalType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "maintain" => Ok(GoalType::Maintain),
            "lean_bulk" => Ok(GoalType::LeanBulk),
            "dirty_bulk" => Ok(GoalType::DirtyBulk),
            "normal_cut" => Ok(GoalType::NormalCut),
            "aggressive_cut" => Ok(GoalType::AggressiveCut),
            _ => bail!(
                "Invalid goal type '{s}'. Use maintain, lean_bulk, dirty_bulk, normal_cut, or aggressive_cut"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalMode {
    Auto,
    Manual,
}

impl GoalMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GoalMode::Auto => "auto",
            GoalMode::Manual => "manual",
        }
    }
}

impl FromStr for GoalMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(GoalMode::Auto),
            "manual" => Ok(GoalMode::Manual),
            _ => bail!("Invalid goal mode '{s}'. Use auto or manual"),
        }
    }
}

impl fmt::Display for GoalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Training ---

#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_archived: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutTemplate {
    pub id: i64,
    pub program_id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One exercise slot within a workout template.
///
/// `order` is assigned once at insert time and never renumbered, so it can
/// contain gaps. Always sort by `(order, id)`.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramExercise {
    pub id: i64,
    pub program_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_template_id: Option<i64>,
    pub exercise_id: i64,
    pub order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_sets: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_reps: Option<String>,
    // Joined fields for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProgramExercise {
    pub program_id: i64,
    pub workout_template_id: i64,
    pub exercise_id: i64,
    pub target_sets: Option<i64>,
    pub target_reps: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
    pub date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    pub is_completed: bool,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub program_id: Option<i64>,
    pub template_id: Option<i64>,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSession {
    pub date: Option<NaiveDateTime>,
    pub note: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFilter {
    pub program_id: Option<i64>,
    pub completed_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetLog {
    pub id: i64,
    pub session_id: i64,
    pub exercise_id: i64,
    pub set_number: i64,
    pub weight: f64,
    pub reps: i64,
    pub is_warmup: bool,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSetLog {
    pub session_id: i64,
    pub exercise_id: i64,
    pub weight: f64,
    pub reps: i64,
    pub is_warmup: bool,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSetLog {
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub is_warmup: Option<bool>,
}

/// Row counts removed by a program cascade delete.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CascadeSummary {
    pub workout_templates: usize,
    pub program_exercises: usize,
    pub sessions: usize,
    pub sets: usize,
}

// --- Body ---

#[derive(Debug, Clone, Serialize)]
pub struct BodyMetric {
    pub id: i64,
    pub date: NaiveDateTime,
    pub weight: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat_percentage: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewBodyMetric {
    pub date: NaiveDateTime,
    pub weight: f64,
    pub height: f64,
    pub fat_percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub weight: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat_percentage: Option<f64>,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub weight: f64,
    pub height: f64,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub body_fat_percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressPhoto {
    pub id: i64,
    pub date: NaiveDateTime,
    pub image_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// --- Nutrition ---

#[derive(Debug, Clone, Serialize)]
pub struct NutritionGoals {
    pub id: i64,
    pub calories_target: i64,
    pub protein_target: i64,
    pub carbs_target: i64,
    pub fat_target: i64,
    pub mode: GoalMode,
    pub goal_type: GoalType,
    pub activity_level: ActivityLevel,
    pub last_calculated: String,
}

/// Macro targets produced by the goal calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutritionTargets {
    pub calories_target: i64,
    pub protein_target: i64,
    pub carbs_target: i64,
    pub fat_target: i64,
    pub goal_type: GoalType,
    pub activity_level: ActivityLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub id: i64,
    pub enabled: bool,
    pub start_time: String,
    pub end_time: String,
    pub silent_days: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_notification_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    pub id: String,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Default)]
pub struct NewMealItem {
    pub name: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMealItem {
    pub name: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionLog {
    pub id: i64,
    pub date: NaiveDate,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub items: Vec<MealItem>,
}

/// Sum of item macros; a day's totals are always derived from its items.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTotals {
    #[must_use]
    pub fn from_items(items: &[MealItem]) -> Self {
        items.iter().fold(Self::default(), |acc, item| Self {
            calories: acc.calories + item.calories,
            protein: acc.protein + item.protein,
            carbs: acc.carbs + item.carbs,
            fat: acc.fat + item.fat,
        })
    }
}

pub fn validate_macros(calories: f64, protein: f64, carbs: f64, fat: f64) -> Result<()> {
    if [calories, protein, carbs, fat].iter().any(|v| *v < 0.0) {
        bail!("Calories and macros must be non-negative");
    }
    Ok(())
}
