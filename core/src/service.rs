use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::analytics::{self, ExerciseStat, ProgramTrend, ProgressDelta, ProgressOverview};
use crate::db::Database;
use crate::goals::calculate_nutrition_goals;
use crate::models::{
    ActivityLevel, BodyMetric, CascadeSummary, Exercise, Gender, GoalMode, GoalType,
    NewBodyMetric, NewMealItem, NewProgramExercise, NewSession, NewSetLog, NutritionGoals,
    NutritionLog, NutritionTargets, ProfileUpdate, Program, ProgramExercise, Session,
    SessionFilter, SetLog, UpdateMealItem, UpdateSession, UpdateSetLog, UserProfile,
    WorkoutTemplate, validate_category,
};
use crate::muscle_map;

/// Input for a body measurement. Missing fields fall back to what is
/// already known about the user.
#[derive(Debug, Clone)]
pub struct BodyMetricsInput {
    pub date: NaiveDateTime,
    pub weight: f64,
    pub height: Option<f64>,
    pub body_fat_percentage: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BodyLogOutcome {
    pub metric: BodyMetric,
    pub profile: UserProfile,
    /// Present when auto mode recalculated the targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<NutritionGoals>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseProgress {
    pub exercise: Exercise,
    pub stats: Vec<ExerciseStat>,
    pub delta: ProgressDelta,
}

#[derive(Debug, Clone, Serialize)]
pub struct MuscleHeatmap {
    pub groups: BTreeMap<String, u32>,
    pub regions: BTreeMap<&'static str, u32>,
    pub max: u32,
}

pub struct TrackerService {
    db: Database,
}

impl TrackerService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    // --- Programs ---

    pub fn create_program(&self, name: &str, description: Option<&str>) -> Result<Program> {
        self.db.create_program(name, description)
    }

    pub fn get_program(&self, id: i64) -> Result<Program> {
        self.db.get_program(id)
    }

    pub fn list_programs(&self, include_archived: bool) -> Result<Vec<Program>> {
        self.db.list_programs(include_archived)
    }

    pub fn rename_program(&self, id: i64, name: &str) -> Result<Program> {
        self.db.rename_program(id, name)
    }

    pub fn set_program_archived(&self, id: i64, archived: bool) -> Result<Program> {
        self.db.set_program_archived(id, archived)
    }

    pub fn delete_program(&self, id: i64) -> Result<CascadeSummary> {
        self.db.delete_program(id)
    }

    // --- Workout templates ---

    pub fn add_workout_template(&self, program_id: i64, name: &str) -> Result<WorkoutTemplate> {
        self.db.add_workout_template(program_id, name)
    }

    pub fn list_workout_templates(&self, program_id: i64) -> Result<Vec<WorkoutTemplate>> {
        self.db.list_workout_templates(program_id)
    }

    pub fn rename_workout_template(&self, id: i64, name: &str) -> Result<WorkoutTemplate> {
        self.db.rename_workout_template(id, name)
    }

    pub fn delete_workout_template(&self, id: i64) -> Result<usize> {
        self.db.delete_workout_template(id)
    }

    // --- Exercises ---

    pub fn list_exercises(&self) -> Result<Vec<Exercise>> {
        self.db.list_exercises()
    }

    pub fn find_exercise(&self, name: &str) -> Result<Exercise> {
        self.db
            .find_exercise_by_name(name)?
            .with_context(|| format!("No exercise named '{name}'"))
    }

    /// Add an exercise to a workout template by name, reusing an existing
    /// exercise with the same name.
    pub fn add_exercise_to_template(
        &self,
        template_id: i64,
        name: &str,
        category: Option<&str>,
        target_sets: Option<i64>,
        target_reps: Option<String>,
    ) -> Result<ProgramExercise> {
        let template = self.db.get_workout_template(template_id)?;
        let category = category.map(validate_category).transpose()?;
        let exercise = self.db.upsert_exercise(name, category.as_deref())?;
        self.db.add_program_exercise(&NewProgramExercise {
            program_id: template.program_id,
            workout_template_id: template.id,
            exercise_id: exercise.id,
            target_sets,
            target_reps,
        })
    }

    pub fn list_template_exercises(&self, template_id: i64) -> Result<Vec<ProgramExercise>> {
        let template = self.db.get_workout_template(template_id)?;
        self.db.list_template_exercises(template.program_id, template.id)
    }

    pub fn update_exercise_targets(
        &self,
        id: i64,
        target_sets: Option<i64>,
        target_reps: Option<&str>,
    ) -> Result<ProgramExercise> {
        self.db
            .update_program_exercise_targets(id, target_sets, target_reps)
    }

    pub fn remove_program_exercise(&self, id: i64) -> Result<bool> {
        self.db.remove_program_exercise(id)
    }

    // --- Sessions ---

    /// Start a session now. With a template, the session belongs to the
    /// template's program.
    pub fn start_session(&self, template_id: Option<i64>) -> Result<Session> {
        let program_id = match template_id {
            Some(id) => Some(self.db.get_workout_template(id)?.program_id),
            None => None,
        };
        self.db.start_session(&NewSession {
            program_id,
            template_id,
            date: now(),
        })
    }

    pub fn finish_session(&self, id: i64) -> Result<Session> {
        let session = self.db.get_session(id)?;
        if session.is_completed {
            bail!("Session {id} is already finished");
        }
        self.db.finish_session(id, now())
    }

    pub fn cancel_session(&self, id: i64) -> Result<usize> {
        self.db.cancel_session(id)
    }

    pub fn update_session(&self, id: i64, update: &UpdateSession) -> Result<Session> {
        self.db.update_session(id, update)
    }

    pub fn get_session(&self, id: i64) -> Result<Session> {
        self.db.get_session(id)
    }

    pub fn list_sessions(&self, filter: SessionFilter) -> Result<Vec<Session>> {
        self.db.list_sessions(filter)
    }

    pub fn latest_completed_session(&self, program_id: i64) -> Result<Option<Session>> {
        self.db.latest_completed_session(program_id)
    }

    // --- Sets ---

    /// Log a set now. Weight and reps default to the previous set of the
    /// same exercise in this session, or zero for the first set.
    pub fn log_set(
        &self,
        session_id: i64,
        exercise_id: i64,
        weight: Option<f64>,
        reps: Option<i64>,
        is_warmup: bool,
    ) -> Result<SetLog> {
        let previous = self.db.last_set_for_exercise(session_id, exercise_id)?;
        let (default_weight, default_reps) = previous.map_or((0.0, 0), |s| (s.weight, s.reps));
        self.db.add_set(&NewSetLog {
            session_id,
            exercise_id,
            weight: weight.unwrap_or(default_weight),
            reps: reps.unwrap_or(default_reps),
            is_warmup,
            timestamp: now(),
        })
    }

    pub fn update_set(&self, id: i64, update: &UpdateSetLog) -> Result<SetLog> {
        self.db.update_set(id, update)
    }

    pub fn delete_set(&self, id: i64) -> Result<bool> {
        self.db.delete_set(id)
    }

    pub fn sets_for_session(&self, session_id: i64) -> Result<Vec<SetLog>> {
        self.db.sets_for_session(session_id)
    }

    // --- Progress ---

    /// Per-session stats for one exercise over completed sessions, oldest
    /// first, with the change between the last two.
    pub fn exercise_progress(
        &self,
        exercise_id: i64,
        program_id: Option<i64>,
    ) -> Result<ExerciseProgress> {
        let exercise = self.db.get_exercise(exercise_id)?;
        let sessions = self.db.list_sessions(SessionFilter {
            program_id,
            completed_only: true,
        })?;
        let sets = self.db.list_sets()?;
        let stats = analytics::get_exercise_stats(exercise_id, &sessions, &sets);
        let delta = analytics::detect_progress(&stats);
        Ok(ExerciseProgress {
            exercise,
            stats,
            delta,
        })
    }

    pub fn program_trends(&self, program_id: i64) -> Result<Vec<ProgramTrend>> {
        self.db.get_program(program_id)?;
        let sessions = self.db.list_sessions(SessionFilter {
            program_id: Some(program_id),
            completed_only: true,
        })?;
        let sets = self.db.list_sets()?;
        Ok(analytics::get_program_trends(program_id, &sessions, &sets))
    }

    pub fn progress_overview(&self) -> Result<ProgressOverview> {
        let sessions = self.db.list_sessions(SessionFilter {
            program_id: None,
            completed_only: true,
        })?;
        let sets = self.db.list_sets()?;
        Ok(analytics::progress_overview(&sessions, &sets))
    }

    /// Muscle heatmap over the last `days` days.
    pub fn muscle_heatmap(&self, days: i64) -> Result<MuscleHeatmap> {
        self.muscle_heatmap_since(now() - Duration::days(days))
    }

    pub fn muscle_heatmap_since(&self, since: NaiveDateTime) -> Result<MuscleHeatmap> {
        let sessions = self.db.list_sessions(SessionFilter {
            program_id: None,
            completed_only: true,
        })?;
        let sets = self.db.list_sets()?;
        let exercises = self.db.list_exercises()?;
        let groups = analytics::muscle_group_tally(&sessions, &sets, &exercises, since);
        Ok(MuscleHeatmap {
            regions: muscle_map::build_volume_map(&groups),
            max: muscle_map::heatmap_max(&groups),
            groups,
        })
    }

    // --- Body ---

    /// Record a measurement and refresh the profile from it. In auto mode
    /// the nutrition targets are recalculated.
    pub fn log_body_metrics(&self, input: &BodyMetricsInput) -> Result<BodyLogOutcome> {
        let existing = self.db.get_user_profile()?;
        let height = match input.height {
            Some(h) => h,
            None => self
                .db
                .latest_body_metric()?
                .map(|m| m.height)
                .or_else(|| existing.as_ref().map(|p| p.height))
                .context("Height is required for the first measurement")?,
        };
        if height <= 0.0 {
            bail!("Height must be greater than 0");
        }

        let metric = self.db.add_body_metric(&NewBodyMetric {
            date: input.date,
            weight: input.weight,
            height,
            fat_percentage: input.body_fat_percentage,
        })?;

        let profile = self.db.upsert_user_profile(&ProfileUpdate {
            weight: input.weight,
            height,
            age: input.age.or_else(|| existing.as_ref().and_then(|p| p.age)),
            gender: Some(
                input
                    .gender
                    .or_else(|| existing.as_ref().and_then(|p| p.gender))
                    .unwrap_or(Gender::Male),
            ),
            body_fat_percentage: input
                .body_fat_percentage
                .or_else(|| existing.as_ref().and_then(|p| p.body_fat_percentage)),
        })?;

        let goals = self.db.get_nutrition_goals()?;
        let goals = if goals.mode == GoalMode::Auto {
            Some(self.recalculate(goals, &profile)?)
        } else {
            None
        };

        Ok(BodyLogOutcome {
            metric,
            profile,
            goals,
        })
    }

    pub fn body_history(&self, limit: Option<i64>) -> Result<Vec<BodyMetric>> {
        self.db.list_body_metrics(limit)
    }

    pub fn delete_body_metric(&self, id: i64) -> Result<()> {
        self.db.delete_body_metric(id)
    }

    pub fn get_user_profile(&self) -> Result<Option<UserProfile>> {
        self.db.get_user_profile()
    }

    // --- Goals ---

    pub fn get_nutrition_goals(&self) -> Result<NutritionGoals> {
        self.db.get_nutrition_goals()
    }

    /// Targets the calculator would produce for the stored profile.
    pub fn preview_targets(
        &self,
        goal_type: GoalType,
        activity_level: ActivityLevel,
    ) -> Result<Option<NutritionTargets>> {
        Ok(self
            .db
            .get_user_profile()?
            .map(|p| calculate_nutrition_goals(&p, goal_type, activity_level)))
    }

    pub fn set_goal_mode(&self, mode: GoalMode) -> Result<NutritionGoals> {
        let mut goals = self.db.get_nutrition_goals()?;
        goals.mode = mode;
        self.save_goals(goals)
    }

    pub fn set_goal_type(&self, goal_type: GoalType) -> Result<NutritionGoals> {
        let mut goals = self.db.get_nutrition_goals()?;
        goals.goal_type = goal_type;
        self.save_goals(goals)
    }

    pub fn set_activity_level(&self, level: ActivityLevel) -> Result<NutritionGoals> {
        let mut goals = self.db.get_nutrition_goals()?;
        goals.activity_level = level;
        self.save_goals(goals)
    }

    /// Enter targets by hand. Switches goals to manual mode.
    pub fn set_manual_targets(
        &self,
        calories: i64,
        protein: i64,
        carbs: i64,
        fat: i64,
    ) -> Result<NutritionGoals> {
        if [calories, protein, carbs, fat].iter().any(|v| *v < 0) {
            bail!("Targets must be non-negative");
        }
        let mut goals = self.db.get_nutrition_goals()?;
        goals.mode = GoalMode::Manual;
        goals.calories_target = calories;
        goals.protein_target = protein;
        goals.carbs_target = carbs;
        goals.fat_target = fat;
        goals.last_calculated = Local::now().to_rfc3339();
        self.db.update_nutrition_goals(&goals)
    }

    /// Persist goal settings, recalculating when in auto mode and a profile
    /// exists.
    fn save_goals(&self, goals: NutritionGoals) -> Result<NutritionGoals> {
        if goals.mode == GoalMode::Auto {
            if let Some(profile) = self.db.get_user_profile()? {
                return self.recalculate(goals, &profile);
            }
        }
        self.db.update_nutrition_goals(&goals)
    }

    fn recalculate(
        &self,
        mut goals: NutritionGoals,
        profile: &UserProfile,
    ) -> Result<NutritionGoals> {
        let targets = calculate_nutrition_goals(profile, goals.goal_type, goals.activity_level);
        log::debug!("Recalculated nutrition targets: {targets:?}");
        goals.calories_target = targets.calories_target;
        goals.protein_target = targets.protein_target;
        goals.carbs_target = targets.carbs_target;
        goals.fat_target = targets.fat_target;
        goals.last_calculated = Local::now().to_rfc3339();
        self.db.update_nutrition_goals(&goals)
    }

    // --- Nutrition ---

    pub fn get_nutrition_log(&self, date: NaiveDate) -> Result<Option<NutritionLog>> {
        self.db.get_nutrition_log(date)
    }

    pub fn add_meal_item(&self, date: NaiveDate, item: &NewMealItem) -> Result<NutritionLog> {
        self.db.add_meal_item(date, item)
    }

    pub fn update_meal_item(
        &self,
        date: NaiveDate,
        item_id: &str,
        update: &UpdateMealItem,
    ) -> Result<NutritionLog> {
        self.db.update_meal_item(date, item_id, update)
    }

    pub fn delete_meal_item(&self, date: NaiveDate, item_id: &str) -> Result<NutritionLog> {
        self.db.delete_meal_item(date, item_id)
    }

    pub fn reset_nutrition_day(&self, date: NaiveDate) -> Result<Option<NutritionLog>> {
        self.db.reset_nutrition_day(date)
    }

    // --- Resets ---

    pub fn reset_analytics(&self) -> Result<()> {
        self.db.reset_analytics()
    }

    pub fn reset_workouts(&self) -> Result<()> {
        self.db.reset_workouts()
    }

    pub fn reset_all(&self) -> Result<()> {
        self.db.reset_all()
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
