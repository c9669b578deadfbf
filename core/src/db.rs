use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use uuid::Uuid;

use crate::models::{
    ActivityLevel, BodyMetric, CascadeSummary, DATE_FORMAT, DEFAULT_TEMPLATE_NAME, Exercise,
    GoalMode, GoalType, MacroTotals, MealItem, NewBodyMetric, NewMealItem, NewProgramExercise,
    NewSession, NewSetLog, NotificationSettings, NutritionGoals, NutritionLog, ProfileUpdate,
    Program, ProgramExercise, ProgressPhoto, Session, SessionFilter, SetLog, TIMESTAMP_FORMAT,
    UpdateMealItem, UpdateSession, UpdateSetLog, UserProfile, WorkoutTemplate, validate_macros,
};

/// Latest schema version this build knows how to produce.
pub const SCHEMA_VERSION: i64 = 5;

type MigrationStep = fn(&mut Transaction<'_>) -> Result<()>;

const MIGRATIONS: &[(i64, MigrationStep)] = &[
    (1, migrate_v1),
    (2, migrate_v2),
    (3, migrate_v3),
    (4, migrate_v4),
    (5, migrate_v5),
];

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let mut conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        migrate_to(&mut conn, SCHEMA_VERSION)?;
        Ok(Database { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migrate_to(&mut conn, SCHEMA_VERSION)?;
        Ok(Database { conn })
    }

    pub fn schema_version(&self) -> Result<i64> {
        user_version(&self.conn)
    }

    // --- Programs ---

    pub fn create_program(&self, name: &str, description: Option<&str>) -> Result<Program> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Program name must not be empty");
        }
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO programs (name, description, is_archived, created_at) VALUES (?1, ?2, 0, ?3)",
            params![name, description, now],
        )?;
        self.get_program(self.conn.last_insert_rowid())
    }

    pub fn get_program(&self, id: i64) -> Result<Program> {
        self.conn
            .query_row(
                "SELECT id, name, description, is_archived, created_at FROM programs WHERE id = ?1",
                params![id],
                program_from_row,
            )
            .context("Program not found")
    }

    pub fn list_programs(&self, include_archived: bool) -> Result<Vec<Program>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, is_archived, created_at FROM programs
             WHERE ?1 OR is_archived = 0
             ORDER BY id",
        )?;
        let programs = stmt
            .query_map(params![include_archived], program_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(programs)
    }

    pub fn set_program_archived(&self, id: i64, archived: bool) -> Result<Program> {
        let rows = self.conn.execute(
            "UPDATE programs SET is_archived = ?1 WHERE id = ?2",
            params![archived, id],
        )?;
        if rows == 0 {
            bail!("Program not found");
        }
        self.get_program(id)
    }

    pub fn rename_program(&self, id: i64, name: &str) -> Result<Program> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Program name must not be empty");
        }
        let rows = self.conn.execute(
            "UPDATE programs SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        if rows == 0 {
            bail!("Program not found");
        }
        self.get_program(id)
    }

    /// Delete a program with its templates, slots, sessions and their sets,
    /// all or nothing.
    pub fn delete_program(&self, id: i64) -> Result<CascadeSummary> {
        self.get_program(id)?;

        let tx = self.conn.unchecked_transaction()?;
        let sets = tx.execute(
            "DELETE FROM set_logs WHERE session_id IN (SELECT id FROM sessions WHERE program_id = ?1)",
            params![id],
        )?;
        let sessions = tx.execute("DELETE FROM sessions WHERE program_id = ?1", params![id])?;
        let program_exercises = tx.execute(
            "DELETE FROM program_exercises WHERE program_id = ?1",
            params![id],
        )?;
        let workout_templates = tx.execute(
            "DELETE FROM workout_templates WHERE program_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM programs WHERE id = ?1", params![id])?;
        tx.commit()?;

        let summary = CascadeSummary {
            workout_templates,
            program_exercises,
            sessions,
            sets,
        };
        log::debug!("Deleted program {id}: {summary:?}");
        Ok(summary)
    }

    // --- Workout templates ---

    pub fn add_workout_template(&self, program_id: i64, name: &str) -> Result<WorkoutTemplate> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Workout name must not be empty");
        }
        self.get_program(program_id)?;
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO workout_templates (program_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![program_id, name, now],
        )?;
        self.get_workout_template(self.conn.last_insert_rowid())
    }

    pub fn get_workout_template(&self, id: i64) -> Result<WorkoutTemplate> {
        self.conn
            .query_row(
                "SELECT id, program_id, name, created_at FROM workout_templates WHERE id = ?1",
                params![id],
                template_from_row,
            )
            .context("Workout template not found")
    }

    pub fn list_workout_templates(&self, program_id: i64) -> Result<Vec<WorkoutTemplate>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, program_id, name, created_at FROM workout_templates
             WHERE program_id = ?1 ORDER BY id",
        )?;
        let templates = stmt
            .query_map(params![program_id], template_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(templates)
    }

    pub fn rename_workout_template(&self, id: i64, name: &str) -> Result<WorkoutTemplate> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Workout name must not be empty");
        }
        let rows = self.conn.execute(
            "UPDATE workout_templates SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        if rows == 0 {
            bail!("Workout template not found");
        }
        self.get_workout_template(id)
    }

    /// Delete a template and its exercise slots. Returns the number of slots
    /// removed.
    pub fn delete_workout_template(&self, id: i64) -> Result<usize> {
        let template = self.get_workout_template(id)?;

        let tx = self.conn.unchecked_transaction()?;
        let slots = tx.execute(
            "DELETE FROM program_exercises WHERE program_id = ?1 AND workout_template_id = ?2",
            params![template.program_id, id],
        )?;
        tx.execute("DELETE FROM workout_templates WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(slots)
    }

    // --- Exercises ---

    /// Case-insensitive lookup. Folding happens in Rust since SQLite's
    /// `LOWER` only folds ASCII.
    pub fn find_exercise_by_name(&self, name: &str) -> Result<Option<Exercise>> {
        let needle = name.trim().to_lowercase();
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, category, notes FROM exercises ORDER BY id")?;
        let exercises = stmt
            .query_map([], exercise_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exercises
            .into_iter()
            .find(|e| e.name.to_lowercase() == needle))
    }

    /// Reuse an exercise with the same name (case-insensitive) or create a
    /// new one. A supplied category overwrites the stored one.
    pub fn upsert_exercise(&self, name: &str, category: Option<&str>) -> Result<Exercise> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Exercise name must not be empty");
        }

        if let Some(existing) = self.find_exercise_by_name(name)? {
            if let Some(category) = category {
                self.conn.execute(
                    "UPDATE exercises SET category = ?1 WHERE id = ?2",
                    params![category, existing.id],
                )?;
            }
            return self.get_exercise(existing.id);
        }

        self.conn.execute(
            "INSERT INTO exercises (name, category) VALUES (?1, ?2)",
            params![name, category],
        )?;
        self.get_exercise(self.conn.last_insert_rowid())
    }

    pub fn get_exercise(&self, id: i64) -> Result<Exercise> {
        self.conn
            .query_row(
                "SELECT id, name, category, notes FROM exercises WHERE id = ?1",
                params![id],
                exercise_from_row,
            )
            .context("Exercise not found")
    }

    pub fn list_exercises(&self) -> Result<Vec<Exercise>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, notes FROM exercises ORDER BY name COLLATE NOCASE, id",
        )?;
        let exercises = stmt
            .query_map([], exercise_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exercises)
    }

    // --- Program exercises ---

    /// Append an exercise slot to a template. `order` is the current slot
    /// count of the template plus one.
    pub fn add_program_exercise(&self, entry: &NewProgramExercise) -> Result<ProgramExercise> {
        let template = self.get_workout_template(entry.workout_template_id)?;
        if template.program_id != entry.program_id {
            bail!(
                "Workout template {} does not belong to program {}",
                template.id,
                entry.program_id
            );
        }
        self.get_exercise(entry.exercise_id)?;

        let order = self.count_template_exercises(entry.program_id, entry.workout_template_id)? + 1;
        self.conn.execute(
            "INSERT INTO program_exercises (program_id, workout_template_id, exercise_id, sort_order, target_sets, target_reps)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.program_id,
                entry.workout_template_id,
                entry.exercise_id,
                order,
                entry.target_sets,
                entry.target_reps,
            ],
        )?;
        self.get_program_exercise(self.conn.last_insert_rowid())
    }

    pub fn get_program_exercise(&self, id: i64) -> Result<ProgramExercise> {
        self.conn
            .query_row(
                "SELECT pe.id, pe.program_id, pe.workout_template_id, pe.exercise_id, pe.sort_order,
                        pe.target_sets, pe.target_reps, e.name, e.category
                 FROM program_exercises pe
                 LEFT JOIN exercises e ON e.id = pe.exercise_id
                 WHERE pe.id = ?1",
                params![id],
                program_exercise_from_row,
            )
            .context("Program exercise not found")
    }

    /// Slots of one template in display order; ties on `order` fall back to
    /// insertion order.
    pub fn list_template_exercises(
        &self,
        program_id: i64,
        workout_template_id: i64,
    ) -> Result<Vec<ProgramExercise>> {
        let mut stmt = self.conn.prepare(
            "SELECT pe.id, pe.program_id, pe.workout_template_id, pe.exercise_id, pe.sort_order,
                    pe.target_sets, pe.target_reps, e.name, e.category
             FROM program_exercises pe
             LEFT JOIN exercises e ON e.id = pe.exercise_id
             WHERE pe.program_id = ?1 AND pe.workout_template_id = ?2
             ORDER BY pe.sort_order, pe.id",
        )?;
        let slots = stmt
            .query_map(
                params![program_id, workout_template_id],
                program_exercise_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(slots)
    }

    pub fn count_template_exercises(
        &self,
        program_id: i64,
        workout_template_id: i64,
    ) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM program_exercises WHERE program_id = ?1 AND workout_template_id = ?2",
            params![program_id, workout_template_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count_program_exercises(&self, program_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM program_exercises WHERE program_id = ?1",
            params![program_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn update_program_exercise_targets(
        &self,
        id: i64,
        target_sets: Option<i64>,
        target_reps: Option<&str>,
    ) -> Result<ProgramExercise> {
        self.get_program_exercise(id)?;
        if let Some(sets) = target_sets {
            self.conn.execute(
                "UPDATE program_exercises SET target_sets = ?1 WHERE id = ?2",
                params![sets, id],
            )?;
        }
        if let Some(reps) = target_reps {
            self.conn.execute(
                "UPDATE program_exercises SET target_reps = ?1 WHERE id = ?2",
                params![reps, id],
            )?;
        }
        self.get_program_exercise(id)
    }

    /// Remove one slot. Remaining slots keep their `order`.
    pub fn remove_program_exercise(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM program_exercises WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Sessions ---

    pub fn start_session(&self, session: &NewSession) -> Result<Session> {
        if let Some(program_id) = session.program_id {
            self.get_program(program_id)?;
        }
        if let Some(template_id) = session.template_id {
            self.get_workout_template(template_id)?;
        }
        self.conn.execute(
            "INSERT INTO sessions (program_id, template_id, date, is_completed) VALUES (?1, ?2, ?3, 0)",
            params![
                session.program_id,
                session.template_id,
                format_timestamp(session.date),
            ],
        )?;
        self.get_session(self.conn.last_insert_rowid())
    }

    pub fn get_session(&self, id: i64) -> Result<Session> {
        self.conn
            .query_row(
                "SELECT id, program_id, template_id, date, note, end_time, is_completed
                 FROM sessions WHERE id = ?1",
                params![id],
                session_from_row,
            )
            .context("Session not found")
    }

    pub fn finish_session(&self, id: i64, end_time: NaiveDateTime) -> Result<Session> {
        let rows = self.conn.execute(
            "UPDATE sessions SET is_completed = 1, end_time = ?1 WHERE id = ?2",
            params![format_timestamp(end_time), id],
        )?;
        if rows == 0 {
            bail!("Session not found");
        }
        self.get_session(id)
    }

    /// Discard a session and every set logged in it. Returns the number of
    /// sets removed.
    pub fn cancel_session(&self, id: i64) -> Result<usize> {
        self.get_session(id)?;

        let tx = self.conn.unchecked_transaction()?;
        let sets = tx.execute("DELETE FROM set_logs WHERE session_id = ?1", params![id])?;
        tx.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(sets)
    }

    pub fn update_session(&self, id: i64, update: &UpdateSession) -> Result<Session> {
        self.get_session(id)?;
        if let Some(date) = update.date {
            self.conn.execute(
                "UPDATE sessions SET date = ?1 WHERE id = ?2",
                params![format_timestamp(date), id],
            )?;
        }
        if let Some(ref note) = update.note {
            self.conn.execute(
                "UPDATE sessions SET note = ?1 WHERE id = ?2",
                params![note, id],
            )?;
        }
        self.get_session(id)
    }

    /// Sessions matching `filter`, oldest first.
    pub fn list_sessions(&self, filter: SessionFilter) -> Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, program_id, template_id, date, note, end_time, is_completed
             FROM sessions
             WHERE (?1 IS NULL OR program_id = ?1) AND (NOT ?2 OR is_completed = 1)
             ORDER BY date, id",
        )?;
        let sessions = stmt
            .query_map(
                params![filter.program_id, filter.completed_only],
                session_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Sessions with `from <= date < to`, oldest first.
    pub fn sessions_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, program_id, template_id, date, note, end_time, is_completed
             FROM sessions
             WHERE date >= ?1 AND date < ?2
             ORDER BY date, id",
        )?;
        let sessions = stmt
            .query_map(
                params![format_timestamp(from), format_timestamp(to)],
                session_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    pub fn count_sessions(&self, filter: SessionFilter) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions
             WHERE (?1 IS NULL OR program_id = ?1) AND (NOT ?2 OR is_completed = 1)",
            params![filter.program_id, filter.completed_only],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn latest_completed_session(&self, program_id: i64) -> Result<Option<Session>> {
        let session = self
            .conn
            .query_row(
                "SELECT id, program_id, template_id, date, note, end_time, is_completed
                 FROM sessions
                 WHERE program_id = ?1 AND is_completed = 1
                 ORDER BY date DESC, id DESC LIMIT 1",
                params![program_id],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    // --- Set logs ---

    /// Log a set. Its set number continues the exercise's count within the
    /// session.
    pub fn add_set(&self, set: &NewSetLog) -> Result<SetLog> {
        self.get_session(set.session_id)?;
        self.get_exercise(set.exercise_id)?;
        if set.weight < 0.0 || set.reps < 0 {
            bail!("Weight and reps must be non-negative");
        }

        let existing: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM set_logs WHERE session_id = ?1 AND exercise_id = ?2",
            params![set.session_id, set.exercise_id],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO set_logs (session_id, exercise_id, set_number, weight, reps, is_warmup, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                set.session_id,
                set.exercise_id,
                existing + 1,
                set.weight,
                set.reps,
                set.is_warmup,
                format_timestamp(set.timestamp),
            ],
        )?;
        self.get_set(self.conn.last_insert_rowid())
    }

    pub fn get_set(&self, id: i64) -> Result<SetLog> {
        self.conn
            .query_row(
                "SELECT id, session_id, exercise_id, set_number, weight, reps, is_warmup, timestamp
                 FROM set_logs WHERE id = ?1",
                params![id],
                set_from_row,
            )
            .context("Set not found")
    }

    pub fn update_set(&self, id: i64, update: &UpdateSetLog) -> Result<SetLog> {
        self.get_set(id)?;
        if let Some(weight) = update.weight {
            if weight < 0.0 {
                bail!("Weight must be non-negative");
            }
            self.conn.execute(
                "UPDATE set_logs SET weight = ?1 WHERE id = ?2",
                params![weight, id],
            )?;
        }
        if let Some(reps) = update.reps {
            if reps < 0 {
                bail!("Reps must be non-negative");
            }
            self.conn.execute(
                "UPDATE set_logs SET reps = ?1 WHERE id = ?2",
                params![reps, id],
            )?;
        }
        if let Some(is_warmup) = update.is_warmup {
            self.conn.execute(
                "UPDATE set_logs SET is_warmup = ?1 WHERE id = ?2",
                params![is_warmup, id],
            )?;
        }
        self.get_set(id)
    }

    pub fn delete_set(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM set_logs WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn sets_for_session(&self, session_id: i64) -> Result<Vec<SetLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, exercise_id, set_number, weight, reps, is_warmup, timestamp
             FROM set_logs WHERE session_id = ?1 ORDER BY id",
        )?;
        let sets = stmt
            .query_map(params![session_id], set_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    pub fn last_set_for_exercise(
        &self,
        session_id: i64,
        exercise_id: i64,
    ) -> Result<Option<SetLog>> {
        let set = self
            .conn
            .query_row(
                "SELECT id, session_id, exercise_id, set_number, weight, reps, is_warmup, timestamp
                 FROM set_logs WHERE session_id = ?1 AND exercise_id = ?2
                 ORDER BY set_number DESC, id DESC LIMIT 1",
                params![session_id, exercise_id],
                set_from_row,
            )
            .optional()?;
        Ok(set)
    }

    pub fn list_sets(&self) -> Result<Vec<SetLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, exercise_id, set_number, weight, reps, is_warmup, timestamp
             FROM set_logs ORDER BY id",
        )?;
        let sets = stmt
            .query_map([], set_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    // --- Body metrics ---

    pub fn add_body_metric(&self, metric: &NewBodyMetric) -> Result<BodyMetric> {
        if metric.weight <= 0.0 {
            bail!("Weight must be greater than 0");
        }
        self.conn.execute(
            "INSERT INTO body_metrics (date, weight, height, fat_percentage) VALUES (?1, ?2, ?3, ?4)",
            params![
                format_timestamp(metric.date),
                metric.weight,
                metric.height,
                metric.fat_percentage,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT id, date, weight, height, fat_percentage FROM body_metrics WHERE id = ?1",
                params![id],
                body_metric_from_row,
            )
            .context("Body metric not found")
    }

    /// Newest first, optionally limited to the last `limit` entries.
    pub fn list_body_metrics(&self, limit: Option<i64>) -> Result<Vec<BodyMetric>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, weight, height, fat_percentage FROM body_metrics
             ORDER BY date DESC, id DESC LIMIT ?1",
        )?;
        let metrics = stmt
            .query_map(params![limit.unwrap_or(-1)], body_metric_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(metrics)
    }

    pub fn latest_body_metric(&self) -> Result<Option<BodyMetric>> {
        Ok(self.list_body_metrics(Some(1))?.into_iter().next())
    }

    pub fn delete_body_metric(&self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM body_metrics WHERE id = ?1", params![id])?;
        if rows == 0 {
            bail!("Body metric not found");
        }
        Ok(())
    }

    // --- User profile ---

    pub fn get_user_profile(&self) -> Result<Option<UserProfile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT id, weight, height, age, gender, body_fat_percentage, updated_at
                 FROM user_profile ORDER BY id LIMIT 1",
                [],
                profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    /// Update the single profile row, creating it on first use.
    pub fn upsert_user_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let now = Local::now().to_rfc3339();
        let gender = update.gender.map(|g| g.as_str());
        if let Some(existing) = self.get_user_profile()? {
            self.conn.execute(
                "UPDATE user_profile SET weight = ?1, height = ?2, age = ?3, gender = ?4,
                        body_fat_percentage = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    update.weight,
                    update.height,
                    update.age,
                    gender,
                    update.body_fat_percentage,
                    now,
                    existing.id,
                ],
            )?;
        } else {
            self.conn.execute(
                "INSERT INTO user_profile (weight, height, age, gender, body_fat_percentage, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    update.weight,
                    update.height,
                    update.age,
                    gender,
                    update.body_fat_percentage,
                    now,
                ],
            )?;
        }
        self.get_user_profile()?
            .context("User profile not found after upsert")
    }

    // --- Nutrition goals ---

    /// The single goals row, seeded with defaults when missing.
    pub fn get_nutrition_goals(&self) -> Result<NutritionGoals> {
        let select = |conn: &Connection| {
            conn.query_row(
                "SELECT id, calories_target, protein_target, carbs_target, fat_target,
                        mode, goal_type, activity_level, last_calculated
                 FROM nutrition_goals ORDER BY id LIMIT 1",
                [],
                goals_from_row,
            )
            .optional()
        };
        if let Some(goals) = select(&self.conn)? {
            return Ok(goals);
        }
        insert_default_goals(&self.conn)?;
        select(&self.conn)?.context("Nutrition goals not found after insert")
    }

    pub fn update_nutrition_goals(&self, goals: &NutritionGoals) -> Result<NutritionGoals> {
        let rows = self.conn.execute(
            "UPDATE nutrition_goals SET calories_target = ?1, protein_target = ?2, carbs_target = ?3,
                    fat_target = ?4, mode = ?5, goal_type = ?6, activity_level = ?7, last_calculated = ?8
             WHERE id = ?9",
            params![
                goals.calories_target,
                goals.protein_target,
                goals.carbs_target,
                goals.fat_target,
                goals.mode.as_str(),
                goals.goal_type.as_str(),
                goals.activity_level.as_str(),
                goals.last_calculated,
                goals.id,
            ],
        )?;
        if rows == 0 {
            bail!("Nutrition goals not found");
        }
        self.get_nutrition_goals()
    }

    // --- Notification settings ---

    pub fn get_notification_settings(&self) -> Result<NotificationSettings> {
        let select = |conn: &Connection| {
            conn.query_row(
                "SELECT id, enabled, start_time, end_time, silent_days, last_notification_date
                 FROM notification_settings ORDER BY id LIMIT 1",
                [],
                notification_settings_from_row,
            )
            .optional()
        };
        if let Some(settings) = select(&self.conn)? {
            return Ok(settings);
        }
        insert_default_notification_settings(&self.conn)?;
        select(&self.conn)?.context("Notification settings not found after insert")
    }

    pub fn update_notification_settings(
        &self,
        settings: &NotificationSettings,
    ) -> Result<NotificationSettings> {
        if settings.silent_days.iter().any(|d| *d > 6) {
            bail!("Silent days must be weekday numbers 0-6");
        }
        let silent_days = serde_json::to_string(&settings.silent_days)?;
        let rows = self.conn.execute(
            "UPDATE notification_settings SET enabled = ?1, start_time = ?2, end_time = ?3,
                    silent_days = ?4, last_notification_date = ?5
             WHERE id = ?6",
            params![
                settings.enabled,
                settings.start_time,
                settings.end_time,
                silent_days,
                settings.last_notification_date,
                settings.id,
            ],
        )?;
        if rows == 0 {
            bail!("Notification settings not found");
        }
        self.get_notification_settings()
    }

    // --- Nutrition logs ---

    pub fn get_nutrition_log(&self, date: NaiveDate) -> Result<Option<NutritionLog>> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let mut stmt = self.conn.prepare(
            "SELECT id, date, calories, protein, carbs, fat, items FROM nutrition_logs WHERE date = ?1",
        )?;
        let mut rows = stmt.query(params![date_str])?;
        if let Some(row) = rows.next()? {
            Ok(Some(nutrition_log_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Append an item to the day's log, creating the day if needed. Unnamed
    /// items are called "Meal N".
    pub fn add_meal_item(&self, date: NaiveDate, item: &NewMealItem) -> Result<NutritionLog> {
        validate_macros(item.calories, item.protein, item.carbs, item.fat)?;
        let mut items = self
            .get_nutrition_log(date)?
            .map(|log| log.items)
            .unwrap_or_default();
        let name = match item.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => format!("Meal {}", items.len() + 1),
        };
        items.push(MealItem {
            id: Uuid::new_v4().to_string(),
            name,
            calories: item.calories,
            protein: item.protein,
            carbs: item.carbs,
            fat: item.fat,
        });
        self.save_nutrition_day(date, &items)
    }

    pub fn update_meal_item(
        &self,
        date: NaiveDate,
        item_id: &str,
        update: &UpdateMealItem,
    ) -> Result<NutritionLog> {
        let mut log = self
            .get_nutrition_log(date)?
            .context("No nutrition log for this date")?;
        let item = log
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .context("Meal item not found")?;

        if let Some(ref name) = update.name {
            item.name.clone_from(name);
        }
        if let Some(calories) = update.calories {
            item.calories = calories;
        }
        if let Some(protein) = update.protein {
            item.protein = protein;
        }
        if let Some(carbs) = update.carbs {
            item.carbs = carbs;
        }
        if let Some(fat) = update.fat {
            item.fat = fat;
        }
        validate_macros(item.calories, item.protein, item.carbs, item.fat)?;

        self.save_nutrition_day(date, &log.items)
    }

    pub fn delete_meal_item(&self, date: NaiveDate, item_id: &str) -> Result<NutritionLog> {
        let log = self
            .get_nutrition_log(date)?
            .context("No nutrition log for this date")?;
        if !log.items.iter().any(|i| i.id == item_id) {
            bail!("Meal item not found");
        }
        let items: Vec<MealItem> = log.items.into_iter().filter(|i| i.id != item_id).collect();
        self.save_nutrition_day(date, &items)
    }

    /// Clear every item of a day. Returns `None` when nothing was logged.
    pub fn reset_nutrition_day(&self, date: NaiveDate) -> Result<Option<NutritionLog>> {
        if self.get_nutrition_log(date)?.is_none() {
            return Ok(None);
        }
        self.save_nutrition_day(date, &[]).map(Some)
    }

    fn save_nutrition_day(&self, date: NaiveDate, items: &[MealItem]) -> Result<NutritionLog> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let totals = MacroTotals::from_items(items);
        let items_json = serde_json::to_string(items)?;
        self.conn.execute(
            "INSERT INTO nutrition_logs (date, calories, protein, carbs, fat, items)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(date) DO UPDATE SET
                calories = excluded.calories,
                protein = excluded.protein,
                carbs = excluded.carbs,
                fat = excluded.fat,
                items = excluded.items",
            params![
                date_str,
                totals.calories,
                totals.protein,
                totals.carbs,
                totals.fat,
                items_json,
            ],
        )?;
        self.get_nutrition_log(date)?
            .context("Nutrition log not found after upsert")
    }

    // --- Progress photos ---

    pub fn add_progress_photo(
        &self,
        date: NaiveDateTime,
        image_path: &str,
        note: Option<&str>,
    ) -> Result<ProgressPhoto> {
        self.conn.execute(
            "INSERT INTO progress_photos (date, image_path, note) VALUES (?1, ?2, ?3)",
            params![format_timestamp(date), image_path, note],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT id, date, image_path, note FROM progress_photos WHERE id = ?1",
                params![id],
                photo_from_row,
            )
            .context("Progress photo not found")
    }

    pub fn list_progress_photos(&self) -> Result<Vec<ProgressPhoto>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, image_path, note FROM progress_photos ORDER BY date DESC, id DESC",
        )?;
        let photos = stmt
            .query_map([], photo_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    pub fn delete_progress_photo(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM progress_photos WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Resets ---

    /// Drop all workout history (sessions and sets). Programs stay.
    pub fn reset_analytics(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(
            "DELETE FROM set_logs;
             DELETE FROM sessions;",
        )?;
        tx.commit()?;
        log::info!("Workout history cleared");
        Ok(())
    }

    /// Drop every program together with its history.
    pub fn reset_workouts(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(
            "DELETE FROM set_logs;
             DELETE FROM sessions;
             DELETE FROM program_exercises;
             DELETE FROM workout_templates;
             DELETE FROM programs;",
        )?;
        tx.commit()?;
        log::info!("Programs and workout history cleared");
        Ok(())
    }

    /// Wipe every table, then restore the default singleton rows.
    pub fn reset_all(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(
            "DELETE FROM set_logs;
             DELETE FROM sessions;
             DELETE FROM program_exercises;
             DELETE FROM workout_templates;
             DELETE FROM programs;
             DELETE FROM exercises;
             DELETE FROM body_metrics;
             DELETE FROM user_profile;
             DELETE FROM nutrition_logs;
             DELETE FROM nutrition_goals;
             DELETE FROM notification_settings;
             DELETE FROM progress_photos;",
        )?;
        insert_default_notification_settings(&tx)?;
        insert_default_goals(&tx)?;
        tx.commit()?;
        log::info!("All data cleared");
        Ok(())
    }
}

// --- Migrations ---

fn user_version(conn: &Connection) -> Result<i64> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Apply every step above the stored version, up to `target`. All pending
/// steps and the version bump share one transaction, so a failure leaves the
/// store at the version it started from.
fn migrate_to(conn: &mut Connection, target: i64) -> Result<()> {
    let version = user_version(conn)?;
    let mut tx = conn.transaction()?;
    let mut reached = version;
    for &(step, apply) in MIGRATIONS {
        if step <= version || step > target {
            continue;
        }
        log::info!("Migrating database schema to v{step}");
        apply(&mut tx).with_context(|| format!("Schema migration to v{step} failed"))?;
        reached = step;
    }
    if reached > version {
        tx.pragma_update(None, "user_version", reached)?;
    }
    tx.commit()?;
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|n| n == column))
}

/// Add a column unless it is already there. Returns true when added.
fn ensure_column(conn: &Connection, table: &str, column: &str, decl: &str) -> Result<bool> {
    if column_exists(conn, table, column)? {
        return Ok(false);
    }
    conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"))?;
    Ok(true)
}

fn migrate_v1(tx: &mut Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS body_metrics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            weight REAL NOT NULL,
            height REAL NOT NULL,
            fat_percentage REAL
        );

        CREATE TABLE IF NOT EXISTS nutrition_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL UNIQUE,
            calories REAL NOT NULL DEFAULT 0,
            protein REAL NOT NULL DEFAULT 0,
            carbs REAL NOT NULL DEFAULT 0,
            fat REAL NOT NULL DEFAULT 0,
            items TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS programs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            is_archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT,
            notes TEXT
        );

        CREATE TABLE IF NOT EXISTS program_exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            program_id INTEGER NOT NULL REFERENCES programs(id),
            exercise_id INTEGER NOT NULL REFERENCES exercises(id),
            sort_order INTEGER NOT NULL,
            target_sets INTEGER,
            target_reps TEXT
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            program_id INTEGER REFERENCES programs(id),
            date TEXT NOT NULL,
            note TEXT,
            end_time TEXT
        );

        CREATE TABLE IF NOT EXISTS set_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES sessions(id),
            exercise_id INTEGER NOT NULL REFERENCES exercises(id),
            set_number INTEGER NOT NULL,
            weight REAL NOT NULL,
            reps INTEGER NOT NULL,
            is_warmup INTEGER NOT NULL DEFAULT 0,
            timestamp TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_body_metrics_date ON body_metrics(date);
        CREATE INDEX IF NOT EXISTS idx_programs_name ON programs(name);
        CREATE INDEX IF NOT EXISTS idx_programs_archived ON programs(is_archived);
        CREATE INDEX IF NOT EXISTS idx_exercises_name ON exercises(name);
        CREATE INDEX IF NOT EXISTS idx_program_exercises_program ON program_exercises(program_id);
        CREATE INDEX IF NOT EXISTS idx_program_exercises_exercise ON program_exercises(exercise_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);
        CREATE INDEX IF NOT EXISTS idx_sessions_program ON sessions(program_id);
        CREATE INDEX IF NOT EXISTS idx_set_logs_session ON set_logs(session_id);
        CREATE INDEX IF NOT EXISTS idx_set_logs_exercise ON set_logs(exercise_id);",
    )?;
    Ok(())
}

fn migrate_v2(tx: &mut Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS user_profile (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            weight REAL NOT NULL,
            height REAL NOT NULL,
            age INTEGER,
            gender TEXT,
            body_fat_percentage REAL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS nutrition_goals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            calories_target INTEGER NOT NULL,
            protein_target INTEGER NOT NULL,
            carbs_target INTEGER NOT NULL,
            fat_target INTEGER NOT NULL,
            mode TEXT NOT NULL,
            goal_type TEXT NOT NULL,
            activity_level TEXT NOT NULL,
            last_calculated TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS notification_settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            enabled INTEGER NOT NULL DEFAULT 0,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            silent_days TEXT NOT NULL DEFAULT '[]',
            last_notification_date TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_user_profile_updated ON user_profile(updated_at);
        CREATE INDEX IF NOT EXISTS idx_nutrition_goals_mode ON nutrition_goals(mode);
        CREATE INDEX IF NOT EXISTS idx_nutrition_goals_calculated ON nutrition_goals(last_calculated);",
    )?;

    let settings: i64 =
        tx.query_row("SELECT COUNT(*) FROM notification_settings", [], |row| row.get(0))?;
    if settings == 0 {
        insert_default_notification_settings(tx)?;
    }
    let goals: i64 = tx.query_row("SELECT COUNT(*) FROM nutrition_goals", [], |row| row.get(0))?;
    if goals == 0 {
        insert_default_goals(tx)?;
    }
    Ok(())
}

fn migrate_v3(tx: &mut Transaction<'_>) -> Result<()> {
    // Sessions logged before completion tracking existed count as completed.
    if ensure_column(tx, "sessions", "is_completed", "INTEGER NOT NULL DEFAULT 0")? {
        tx.execute("UPDATE sessions SET is_completed = 1", [])?;
    }
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_sessions_completed ON sessions(is_completed);",
    )?;
    Ok(())
}

fn migrate_v4(tx: &mut Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS workout_templates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            program_id INTEGER NOT NULL REFERENCES programs(id),
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_workout_templates_program ON workout_templates(program_id);
        CREATE INDEX IF NOT EXISTS idx_workout_templates_name ON workout_templates(name);",
    )?;
    ensure_column(tx, "program_exercises", "workout_template_id", "INTEGER")?;
    ensure_column(tx, "sessions", "template_id", "INTEGER")?;
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_program_exercises_template
            ON program_exercises(program_id, workout_template_id);
         CREATE INDEX IF NOT EXISTS idx_sessions_template ON sessions(template_id);",
    )?;

    let program_ids: Vec<i64> = {
        let mut stmt = tx.prepare(
            "SELECT id FROM programs p
             WHERE NOT EXISTS (SELECT 1 FROM workout_templates t WHERE t.program_id = p.id)
             ORDER BY id",
        )?;
        stmt.query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?
    };

    let now = Local::now().to_rfc3339();
    for program_id in program_ids {
        let sp = tx.savepoint()?;
        match backfill_default_template(&sp, program_id, &now) {
            Ok(template_id) => {
                sp.commit()?;
                log::debug!("Program {program_id} linked to default template {template_id}");
            }
            // Dropping the savepoint rolls back this program only.
            Err(e) => {
                log::warn!("Default template backfill failed for program {program_id}: {e:#}");
            }
        }
    }
    Ok(())
}

fn backfill_default_template(conn: &Connection, program_id: i64, now: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO workout_templates (program_id, name, created_at) VALUES (?1, ?2, ?3)",
        params![program_id, DEFAULT_TEMPLATE_NAME, now],
    )?;
    let template_id = conn.last_insert_rowid();
    conn.execute(
        "UPDATE program_exercises SET workout_template_id = ?1 WHERE program_id = ?2",
        params![template_id, program_id],
    )?;
    conn.execute(
        "UPDATE sessions SET template_id = ?1 WHERE program_id = ?2",
        params![template_id, program_id],
    )?;
    Ok(template_id)
}

fn migrate_v5(tx: &mut Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS progress_photos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            image_path TEXT NOT NULL,
            note TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_progress_photos_date ON progress_photos(date);",
    )?;
    Ok(())
}

fn insert_default_notification_settings(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO notification_settings (enabled, start_time, end_time, silent_days)
         VALUES (0, '18:00', '00:00', '[]')",
        [],
    )?;
    Ok(())
}

fn insert_default_goals(conn: &Connection) -> Result<()> {
    let now = Local::now().to_rfc3339();
    conn.execute(
        "INSERT INTO nutrition_goals (calories_target, protein_target, carbs_target, fat_target,
                                      mode, goal_type, activity_level, last_calculated)
         VALUES (2500, 180, 250, 70, ?1, ?2, ?3, ?4)",
        params![
            GoalMode::Manual.as_str(),
            GoalType::Maintain.as_str(),
            ActivityLevel::Moderate.as_str(),
            now,
        ],
    )?;
    Ok(())
}

// --- Row mapping helpers ---

fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn conversion_error(
    idx: usize,
    err: Box<dyn std::error::Error + Send + Sync + 'static>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err)
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .map_err(|e| conversion_error(idx, Box::new(e)))
}

fn optional_timestamp_column(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => timestamp_column(row, idx).map(Some),
        None => Ok(None),
    }
}

fn enum_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: anyhow::Error| conversion_error(idx, e.into()))
}

fn program_from_row(row: &rusqlite::Row) -> rusqlite::Result<Program> {
    Ok(Program {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_archived: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn template_from_row(row: &rusqlite::Row) -> rusqlite::Result<WorkoutTemplate> {
    Ok(WorkoutTemplate {
        id: row.get(0)?,
        program_id: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn exercise_from_row(row: &rusqlite::Row) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        notes: row.get(3)?,
    })
}

// Expects columns:
// 0: pe.id, 1: pe.program_id, 2: pe.workout_template_id, 3: pe.exercise_id,
// 4: pe.sort_order, 5: pe.target_sets, 6: pe.target_reps, 7: e.name, 8: e.category
fn program_exercise_from_row(row: &rusqlite::Row) -> rusqlite::Result<ProgramExercise> {
    Ok(ProgramExercise {
        id: row.get(0)?,
        program_id: row.get(1)?,
        workout_template_id: row.get(2)?,
        exercise_id: row.get(3)?,
        order: row.get(4)?,
        target_sets: row.get(5)?,
        target_reps: row.get(6)?,
        exercise_name: row.get(7)?,
        exercise_category: row.get(8)?,
    })
}

fn session_from_row(row: &rusqlite::Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        program_id: row.get(1)?,
        template_id: row.get(2)?,
        date: timestamp_column(row, 3)?,
        note: row.get(4)?,
        end_time: optional_timestamp_column(row, 5)?,
        is_completed: row.get(6)?,
    })
}

fn set_from_row(row: &rusqlite::Row) -> rusqlite::Result<SetLog> {
    Ok(SetLog {
        id: row.get(0)?,
        session_id: row.get(1)?,
        exercise_id: row.get(2)?,
        set_number: row.get(3)?,
        weight: row.get(4)?,
        reps: row.get(5)?,
        is_warmup: row.get(6)?,
        timestamp: timestamp_column(row, 7)?,
    })
}

fn body_metric_from_row(row: &rusqlite::Row) -> rusqlite::Result<BodyMetric> {
    Ok(BodyMetric {
        id: row.get(0)?,
        date: timestamp_column(row, 1)?,
        weight: row.get(2)?,
        height: row.get(3)?,
        fat_percentage: row.get(4)?,
    })
}

fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserProfile> {
    let gender = match row.get::<_, Option<String>>(4)? {
        Some(_) => Some(enum_column(row, 4)?),
        None => None,
    };
    Ok(UserProfile {
        id: row.get(0)?,
        weight: row.get(1)?,
        height: row.get(2)?,
        age: row.get(3)?,
        gender,
        body_fat_percentage: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn goals_from_row(row: &rusqlite::Row) -> rusqlite::Result<NutritionGoals> {
    Ok(NutritionGoals {
        id: row.get(0)?,
        calories_target: row.get(1)?,
        protein_target: row.get(2)?,
        carbs_target: row.get(3)?,
        fat_target: row.get(4)?,
        mode: enum_column(row, 5)?,
        goal_type: enum_column(row, 6)?,
        activity_level: enum_column(row, 7)?,
        last_calculated: row.get(8)?,
    })
}

fn notification_settings_from_row(row: &rusqlite::Row) -> rusqlite::Result<NotificationSettings> {
    let silent_days: String = row.get(4)?;
    Ok(NotificationSettings {
        id: row.get(0)?,
        enabled: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        silent_days: serde_json::from_str(&silent_days)
            .map_err(|e| conversion_error(4, Box::new(e)))?,
        last_notification_date: row.get(5)?,
    })
}

fn nutrition_log_from_row(row: &rusqlite::Row) -> rusqlite::Result<NutritionLog> {
    let date_str: String = row.get(1)?;
    let items_json: String = row.get(6)?;
    Ok(NutritionLog {
        id: row.get(0)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| conversion_error(1, Box::new(e)))?,
        calories: row.get(2)?,
        protein: row.get(3)?,
        carbs: row.get(4)?,
        fat: row.get(5)?,
        items: serde_json::from_str(&items_json).map_err(|e| conversion_error(6, Box::new(e)))?,
    })
}

fn photo_from_row(row: &rusqlite::Row) -> rusqlite::Result<ProgressPhoto> {
    Ok(ProgressPhoto {
        id: row.get(0)?,
        date: timestamp_column(row, 1)?,
        image_path: row.get(2)?,
        note: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::Gender;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn program_with_template(db: &Database, name: &str) -> (Program, WorkoutTemplate) {
        let program = db.create_program(name, None).unwrap();
        let template = db.add_workout_template(program.id, "Push").unwrap();
        (program, template)
    }

    fn slot(
        db: &Database,
        program: &Program,
        template: &WorkoutTemplate,
        exercise: &str,
    ) -> ProgramExercise {
        let exercise = db.upsert_exercise(exercise, None).unwrap();
        db.add_program_exercise(&NewProgramExercise {
            program_id: program.id,
            workout_template_id: template.id,
            exercise_id: exercise.id,
            target_sets: Some(3),
            target_reps: Some("8-12".to_string()),
        })
        .unwrap()
    }

    fn log_set(db: &Database, session_id: i64, exercise_id: i64, weight: f64, reps: i64) -> SetLog {
        db.add_set(&NewSetLog {
            session_id,
            exercise_id,
            weight,
            reps,
            is_warmup: false,
            timestamp: ts(1, 10),
        })
        .unwrap()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_fresh_database_is_current_and_seeded() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);

        let goals = db.get_nutrition_goals().unwrap();
        assert_eq!(goals.calories_target, 2500);
        assert_eq!(goals.protein_target, 180);
        assert_eq!(goals.carbs_target, 250);
        assert_eq!(goals.fat_target, 70);
        assert_eq!(goals.mode, GoalMode::Manual);
        assert_eq!(goals.goal_type, GoalType::Maintain);
        assert_eq!(goals.activity_level, ActivityLevel::Moderate);

        let settings = db.get_notification_settings().unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.start_time, "18:00");
        assert_eq!(settings.end_time, "00:00");
        assert!(settings.silent_days.is_empty());
    }

    #[test]
    fn test_reopen_does_not_reapply_migrations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.db");
        {
            let db = Database::open(&path).unwrap();
            db.create_program("PPL", None).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
        assert_eq!(count(&db, "nutrition_goals"), 1);
        assert_eq!(count(&db, "notification_settings"), 1);
        assert_eq!(db.list_programs(true).unwrap().len(), 1);
    }

    #[test]
    fn test_singletons_get_or_create() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute_batch("DELETE FROM nutrition_goals; DELETE FROM notification_settings;")
            .unwrap();

        let first = db.get_nutrition_goals().unwrap();
        let second = db.get_nutrition_goals().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(count(&db, "nutrition_goals"), 1);

        db.get_notification_settings().unwrap();
        db.get_notification_settings().unwrap();
        assert_eq!(count(&db, "notification_settings"), 1);
    }

    #[test]
    fn test_v3_upgrade_marks_existing_sessions_completed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.db");
        {
            let mut conn = Connection::open(&path).unwrap();
            migrate_to(&mut conn, 2).unwrap();
            conn.execute_batch(
                "INSERT INTO sessions (program_id, date) VALUES (NULL, '2024-01-01T10:00:00');
                 INSERT INTO sessions (program_id, date) VALUES (NULL, '2024-01-02T10:00:00');",
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let sessions = db.list_sessions(SessionFilter::default()).unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().all(|s| s.is_completed));

        // Sessions started after the upgrade are in progress
        let live = db
            .start_session(&NewSession {
                program_id: None,
                template_id: None,
                date: ts(3, 9),
            })
            .unwrap();
        assert!(!live.is_completed);
    }

    #[test]
    fn test_v4_upgrade_gives_each_program_a_default_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.db");
        {
            let mut conn = Connection::open(&path).unwrap();
            migrate_to(&mut conn, 3).unwrap();
            conn.execute_batch(
                "INSERT INTO exercises (id, name) VALUES (1, 'Bench'), (2, 'Squat');
                 INSERT INTO programs (id, name, is_archived, created_at) VALUES
                    (1, 'A', 0, 'x'), (2, 'B', 0, 'x'), (3, 'C', 1, 'x');
                 INSERT INTO program_exercises (program_id, exercise_id, sort_order) VALUES
                    (1, 1, 1), (1, 2, 2), (2, 1, 1), (3, 2, 1);
                 INSERT INTO sessions (program_id, date, is_completed) VALUES
                    (1, '2024-01-01T10:00:00', 1),
                    (2, '2024-01-02T10:00:00', 1),
                    (3, '2024-01-03T10:00:00', 1);",
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);

        for program_id in 1..=3 {
            let templates = db.list_workout_templates(program_id).unwrap();
            assert_eq!(templates.len(), 1, "program {program_id}");
            assert_eq!(templates[0].name, DEFAULT_TEMPLATE_NAME);

            let orphans: i64 = db
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM program_exercises
                     WHERE program_id = ?1 AND (workout_template_id IS NULL OR workout_template_id != ?2)",
                    params![program_id, templates[0].id],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(orphans, 0);

            let sessions = db
                .list_sessions(SessionFilter {
                    program_id: Some(program_id),
                    completed_only: false,
                })
                .unwrap();
            assert!(sessions.iter().all(|s| s.template_id == Some(templates[0].id)));
        }
        assert_eq!(count(&db, "workout_templates"), 3);

        let template_id = db.list_workout_templates(1).unwrap()[0].id;
        let slots = db.list_template_exercises(1, template_id).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].exercise_name.as_deref(), Some("Bench"));
    }

    #[test]
    fn test_v4_backfill_failure_is_isolated_per_program() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.db");
        {
            let mut conn = Connection::open(&path).unwrap();
            migrate_to(&mut conn, 3).unwrap();
            conn.execute_batch(
                "INSERT INTO programs (id, name, is_archived, created_at) VALUES
                    (1, 'A', 0, 'x'), (2, 'B', 0, 'x'), (3, 'C', 0, 'x');
                 INSERT INTO sessions (program_id, date, is_completed) VALUES
                    (1, '2024-01-01T10:00:00', 1),
                    (2, '2024-01-02T10:00:00', 1),
                    (3, '2024-01-03T10:00:00', 1);
                 CREATE TRIGGER fail_program_two BEFORE UPDATE ON sessions
                 WHEN OLD.program_id = 2
                 BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
        assert_eq!(db.list_workout_templates(1).unwrap().len(), 1);
        assert!(db.list_workout_templates(2).unwrap().is_empty());
        assert_eq!(db.list_workout_templates(3).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_migration_keeps_previous_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.db");
        {
            let mut conn = Connection::open(&path).unwrap();
            migrate_to(&mut conn, 2).unwrap();
            // A stray table without a date column makes the v5 index fail
            conn.execute_batch("CREATE TABLE progress_photos (id INTEGER PRIMARY KEY);")
                .unwrap();
        }

        assert!(Database::open(&path).is_err());
        let conn = Connection::open(&path).unwrap();
        assert_eq!(user_version(&conn).unwrap(), 2);
        // Steps v3 and v4 were rolled back with v5
        assert!(!column_exists(&conn, "sessions", "is_completed").unwrap());
        assert!(!column_exists(&conn, "sessions", "template_id").unwrap());
    }

    #[test]
    fn test_program_crud_and_archive() {
        let db = Database::open_in_memory().unwrap();
        let p = db.create_program("  Upper/Lower ", Some("4 days")).unwrap();
        assert_eq!(p.name, "Upper/Lower");
        assert!(!p.is_archived);
        assert!(db.create_program("   ", None).is_err());

        db.set_program_archived(p.id, true).unwrap();
        assert!(db.list_programs(false).unwrap().is_empty());
        assert_eq!(db.list_programs(true).unwrap().len(), 1);

        let renamed = db.rename_program(p.id, "UL").unwrap();
        assert_eq!(renamed.name, "UL");
        assert!(db.rename_program(999, "x").is_err());
        assert!(db.get_program(999).is_err());
    }

    #[test]
    fn test_upsert_exercise_is_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        let a = db.upsert_exercise("Bench Press", Some("chest")).unwrap();
        let b = db.upsert_exercise("bench press", None).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.category.as_deref(), Some("chest"));

        let c = db.upsert_exercise("BENCH PRESS", Some("arms")).unwrap();
        assert_eq!(c.id, a.id);
        assert_eq!(c.category.as_deref(), Some("arms"));
        assert_eq!(db.list_exercises().unwrap().len(), 1);
        assert!(db.upsert_exercise("", None).is_err());
    }

    #[test]
    fn test_upsert_exercise_folds_non_ascii_case() {
        let db = Database::open_in_memory().unwrap();
        let a = db.upsert_exercise("Écarté", Some("chest")).unwrap();
        let b = db.upsert_exercise("écarté", None).unwrap();
        let c = db.upsert_exercise(" ÉCARTÉ ", None).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, c.id);
        assert_eq!(b.name, "Écarté");
        assert_eq!(db.list_exercises().unwrap().len(), 1);
        assert_eq!(db.find_exercise_by_name("ÉCARTÉ").unwrap().unwrap().id, a.id);
        assert!(db.find_exercise_by_name("Ecarte").unwrap().is_none());
    }

    #[test]
    fn test_program_exercise_order_and_gaps() {
        let db = Database::open_in_memory().unwrap();
        let (program, template) = program_with_template(&db, "PPL");
        let bench = slot(&db, &program, &template, "Bench");
        let fly = slot(&db, &program, &template, "Fly");
        let dips = slot(&db, &program, &template, "Dips");
        assert_eq!((bench.order, fly.order, dips.order), (1, 2, 3));

        assert!(db.remove_program_exercise(fly.id).unwrap());
        let remaining = db.list_template_exercises(program.id, template.id).unwrap();
        let orders: Vec<i64> = remaining.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 3]);

        // Count-based numbering can collide after a removal; id breaks the tie
        let press = slot(&db, &program, &template, "Press");
        assert_eq!(press.order, 3);
        let names: Vec<String> = db
            .list_template_exercises(program.id, template.id)
            .unwrap()
            .into_iter()
            .filter_map(|s| s.exercise_name)
            .collect();
        assert_eq!(names, vec!["Bench", "Dips", "Press"]);
        assert_eq!(db.count_program_exercises(program.id).unwrap(), 3);
    }

    #[test]
    fn test_program_exercise_requires_matching_template() {
        let db = Database::open_in_memory().unwrap();
        let (_, template) = program_with_template(&db, "A");
        let other = db.create_program("B", None).unwrap();
        let ex = db.upsert_exercise("Row", None).unwrap();
        let result = db.add_program_exercise(&NewProgramExercise {
            program_id: other.id,
            workout_template_id: template.id,
            exercise_id: ex.id,
            target_sets: None,
            target_reps: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_update_targets() {
        let db = Database::open_in_memory().unwrap();
        let (program, template) = program_with_template(&db, "PPL");
        let s = slot(&db, &program, &template, "Bench");
        let updated = db.update_program_exercise_targets(s.id, Some(5), None).unwrap();
        assert_eq!(updated.target_sets, Some(5));
        assert_eq!(updated.target_reps.as_deref(), Some("8-12"));
    }

    #[test]
    fn test_delete_template_removes_its_slots() {
        let db = Database::open_in_memory().unwrap();
        let (program, push) = program_with_template(&db, "PPL");
        let pull = db.add_workout_template(program.id, "Pull").unwrap();
        slot(&db, &program, &push, "Bench");
        slot(&db, &program, &push, "Fly");
        slot(&db, &program, &pull, "Row");

        assert_eq!(db.delete_workout_template(push.id).unwrap(), 2);
        assert!(db.get_workout_template(push.id).is_err());
        assert_eq!(db.list_template_exercises(program.id, pull.id).unwrap().len(), 1);
        assert_eq!(db.count_program_exercises(program.id).unwrap(), 1);
    }

    #[test]
    fn test_cascade_delete_program() {
        let db = Database::open_in_memory().unwrap();
        let (program, template) = program_with_template(&db, "PPL");
        let bench = slot(&db, &program, &template, "Bench");
        let session = db
            .start_session(&NewSession {
                program_id: Some(program.id),
                template_id: Some(template.id),
                date: ts(1, 10),
            })
            .unwrap();
        log_set(&db, session.id, bench.exercise_id, 60.0, 10);
        log_set(&db, session.id, bench.exercise_id, 60.0, 8);

        let (other, other_template) = program_with_template(&db, "Other");
        slot(&db, &other, &other_template, "Squat");

        let summary = db.delete_program(program.id).unwrap();
        assert_eq!(summary.workout_templates, 1);
        assert_eq!(summary.program_exercises, 1);
        assert_eq!(summary.sessions, 1);
        assert_eq!(summary.sets, 2);

        assert!(db.get_program(program.id).is_err());
        assert_eq!(count(&db, "set_logs"), 0);
        assert_eq!(count(&db, "sessions"), 0);
        assert_eq!(db.list_workout_templates(other.id).unwrap().len(), 1);
        assert_eq!(db.count_program_exercises(other.id).unwrap(), 1);
        // Exercises are shared and survive
        assert!(db.find_exercise_by_name("Bench").unwrap().is_some());
    }

    #[test]
    fn test_cascade_delete_is_all_or_nothing() {
        let db = Database::open_in_memory().unwrap();
        let (program, template) = program_with_template(&db, "PPL");
        let bench = slot(&db, &program, &template, "Bench");
        let session = db
            .start_session(&NewSession {
                program_id: Some(program.id),
                template_id: Some(template.id),
                date: ts(1, 10),
            })
            .unwrap();
        log_set(&db, session.id, bench.exercise_id, 60.0, 10);

        db.conn
            .execute_batch(
                "CREATE TRIGGER fail_program_delete BEFORE DELETE ON programs
                 BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
            )
            .unwrap();

        assert!(db.delete_program(program.id).is_err());
        assert!(db.get_program(program.id).is_ok());
        assert_eq!(count(&db, "workout_templates"), 1);
        assert_eq!(count(&db, "program_exercises"), 1);
        assert_eq!(count(&db, "sessions"), 1);
        assert_eq!(count(&db, "set_logs"), 1);
    }

    #[test]
    fn test_delete_missing_program_errors() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.delete_program(42).is_err());
    }

    #[test]
    fn test_session_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let (program, template) = program_with_template(&db, "PPL");
        let session = db
            .start_session(&NewSession {
                program_id: Some(program.id),
                template_id: Some(template.id),
                date: ts(1, 10),
            })
            .unwrap();
        assert!(!session.is_completed);
        assert!(session.end_time.is_none());
        assert!(db.latest_completed_session(program.id).unwrap().is_none());

        let edited = db
            .update_session(
                session.id,
                &UpdateSession {
                    date: Some(ts(1, 9)),
                    note: Some(Some("felt strong".to_string())),
                },
            )
            .unwrap();
        assert_eq!(edited.date, ts(1, 9));
        assert_eq!(edited.note.as_deref(), Some("felt strong"));

        let finished = db.finish_session(session.id, ts(1, 11)).unwrap();
        assert!(finished.is_completed);
        assert_eq!(finished.end_time, Some(ts(1, 11)));
        assert_eq!(
            db.latest_completed_session(program.id).unwrap().map(|s| s.id),
            Some(session.id)
        );

        let cleared = db
            .update_session(
                session.id,
                &UpdateSession {
                    date: None,
                    note: Some(None),
                },
            )
            .unwrap();
        assert!(cleared.note.is_none());
    }

    #[test]
    fn test_cancel_session_removes_sets() {
        let db = Database::open_in_memory().unwrap();
        let ex = db.upsert_exercise("Squat", Some("legs")).unwrap();
        let keep = db
            .start_session(&NewSession {
                program_id: None,
                template_id: None,
                date: ts(1, 10),
            })
            .unwrap();
        let discarded = db
            .start_session(&NewSession {
                program_id: None,
                template_id: None,
                date: ts(2, 10),
            })
            .unwrap();
        log_set(&db, keep.id, ex.id, 100.0, 5);
        log_set(&db, discarded.id, ex.id, 100.0, 5);
        log_set(&db, discarded.id, ex.id, 100.0, 5);

        assert_eq!(db.cancel_session(discarded.id).unwrap(), 2);
        assert!(db.get_session(discarded.id).is_err());
        assert_eq!(db.sets_for_session(keep.id).unwrap().len(), 1);
        assert!(db.cancel_session(discarded.id).is_err());
    }

    #[test]
    fn test_session_filters_and_ranges() {
        let db = Database::open_in_memory().unwrap();
        let (program, template) = program_with_template(&db, "PPL");
        for d in [3, 1, 2] {
            let s = db
                .start_session(&NewSession {
                    program_id: Some(program.id),
                    template_id: Some(template.id),
                    date: ts(d, 10),
                })
                .unwrap();
            if d != 2 {
                db.finish_session(s.id, ts(d, 11)).unwrap();
            }
        }
        db.start_session(&NewSession {
            program_id: None,
            template_id: None,
            date: ts(4, 10),
        })
        .unwrap();

        let all = db.list_sessions(SessionFilter::default()).unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].date <= w[1].date));

        let filter = SessionFilter {
            program_id: Some(program.id),
            completed_only: true,
        };
        assert_eq!(db.count_sessions(filter).unwrap(), 2);
        assert_eq!(db.list_sessions(filter).unwrap()[0].date, ts(1, 10));

        let ranged = db.sessions_between(ts(2, 0), ts(4, 0)).unwrap();
        let dates: Vec<NaiveDateTime> = ranged.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![ts(2, 10), ts(3, 10)]);
    }

    #[test]
    fn test_set_numbering_per_exercise() {
        let db = Database::open_in_memory().unwrap();
        let bench = db.upsert_exercise("Bench", None).unwrap();
        let squat = db.upsert_exercise("Squat", None).unwrap();
        let session = db
            .start_session(&NewSession {
                program_id: None,
                template_id: None,
                date: ts(1, 10),
            })
            .unwrap();

        assert_eq!(log_set(&db, session.id, bench.id, 60.0, 10).set_number, 1);
        assert_eq!(log_set(&db, session.id, bench.id, 62.5, 8).set_number, 2);
        assert_eq!(log_set(&db, session.id, squat.id, 100.0, 5).set_number, 1);

        let last = db.last_set_for_exercise(session.id, bench.id).unwrap().unwrap();
        assert!((last.weight - 62.5).abs() < f64::EPSILON);
        assert!(db.last_set_for_exercise(session.id, 999).unwrap().is_none());
    }

    #[test]
    fn test_set_update_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let ex = db.upsert_exercise("Bench", None).unwrap();
        let session = db
            .start_session(&NewSession {
                program_id: None,
                template_id: None,
                date: ts(1, 10),
            })
            .unwrap();
        let set = log_set(&db, session.id, ex.id, 60.0, 10);

        let updated = db
            .update_set(
                set.id,
                &UpdateSetLog {
                    weight: Some(65.0),
                    reps: None,
                    is_warmup: Some(true),
                },
            )
            .unwrap();
        assert!((updated.weight - 65.0).abs() < f64::EPSILON);
        assert_eq!(updated.reps, 10);
        assert!(updated.is_warmup);

        assert!(
            db.update_set(
                set.id,
                &UpdateSetLog {
                    reps: Some(-1),
                    ..UpdateSetLog::default()
                }
            )
            .is_err()
        );
        assert!(db.delete_set(set.id).unwrap());
        assert!(!db.delete_set(set.id).unwrap());
    }

    #[test]
    fn test_add_set_rejects_unknown_session() {
        let db = Database::open_in_memory().unwrap();
        let ex = db.upsert_exercise("Bench", None).unwrap();
        let result = db.add_set(&NewSetLog {
            session_id: 77,
            exercise_id: ex.id,
            weight: 60.0,
            reps: 5,
            is_warmup: false,
            timestamp: ts(1, 10),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_body_metrics_newest_first() {
        let db = Database::open_in_memory().unwrap();
        for (d, w) in [(1, 80.0), (3, 79.0), (2, 79.5)] {
            db.add_body_metric(&NewBodyMetric {
                date: ts(d, 8),
                weight: w,
                height: 180.0,
                fat_percentage: None,
            })
            .unwrap();
        }
        let all = db.list_body_metrics(None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date, ts(3, 8));
        assert_eq!(db.list_body_metrics(Some(2)).unwrap().len(), 2);
        let latest = db.latest_body_metric().unwrap().unwrap();
        assert!((latest.weight - 79.0).abs() < f64::EPSILON);

        db.delete_body_metric(latest.id).unwrap();
        assert!(db.delete_body_metric(latest.id).is_err());
        assert!(
            db.add_body_metric(&NewBodyMetric {
                date: ts(4, 8),
                weight: 0.0,
                height: 180.0,
                fat_percentage: None,
            })
            .is_err()
        );
    }

    #[test]
    fn test_profile_upsert_keeps_single_row() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_user_profile().unwrap().is_none());

        let first = db
            .upsert_user_profile(&ProfileUpdate {
                weight: 80.0,
                height: 180.0,
                age: Some(30),
                gender: Some(Gender::Other),
                body_fat_percentage: None,
            })
            .unwrap();
        let second = db
            .upsert_user_profile(&ProfileUpdate {
                weight: 78.0,
                height: 180.0,
                age: Some(31),
                gender: Some(Gender::Female),
                body_fat_percentage: Some(20.0),
            })
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.gender, Some(Gender::Female));
        assert_eq!(second.age, Some(31));
        assert_eq!(count(&db, "user_profile"), 1);
    }

    #[test]
    fn test_update_goals_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let mut goals = db.get_nutrition_goals().unwrap();
        goals.mode = GoalMode::Auto;
        goals.goal_type = GoalType::NormalCut;
        goals.calories_target = 2100;
        let saved = db.update_nutrition_goals(&goals).unwrap();
        assert_eq!(saved.mode, GoalMode::Auto);
        assert_eq!(saved.goal_type, GoalType::NormalCut);
        assert_eq!(saved.calories_target, 2100);
    }

    #[test]
    fn test_notification_silent_days() {
        let db = Database::open_in_memory().unwrap();
        let mut settings = db.get_notification_settings().unwrap();
        settings.enabled = true;
        settings.silent_days = vec![0, 6];
        let saved = db.update_notification_settings(&settings).unwrap();
        assert!(saved.enabled);
        assert_eq!(saved.silent_days, vec![0, 6]);

        settings.silent_days = vec![7];
        assert!(db.update_notification_settings(&settings).is_err());
    }

    #[test]
    fn test_meal_items_keep_totals_in_sync() {
        let db = Database::open_in_memory().unwrap();
        let log = db
            .add_meal_item(
                day(5),
                &NewMealItem {
                    name: None,
                    calories: 500.0,
                    protein: 40.0,
                    carbs: 50.0,
                    fat: 15.0,
                },
            )
            .unwrap();
        assert_eq!(log.items[0].name, "Meal 1");

        let log = db
            .add_meal_item(
                day(5),
                &NewMealItem {
                    name: Some("Shake".to_string()),
                    calories: 300.0,
                    protein: 30.0,
                    carbs: 20.0,
                    fat: 5.0,
                },
            )
            .unwrap();
        assert_eq!(log.items.len(), 2);
        assert!((log.calories - 800.0).abs() < f64::EPSILON);
        assert!((log.protein - 70.0).abs() < f64::EPSILON);

        let shake_id = log.items[1].id.clone();
        let log = db
            .update_meal_item(
                day(5),
                &shake_id,
                &UpdateMealItem {
                    calories: Some(350.0),
                    ..UpdateMealItem::default()
                },
            )
            .unwrap();
        assert!((log.calories - 850.0).abs() < f64::EPSILON);

        let log = db.delete_meal_item(day(5), &shake_id).unwrap();
        assert_eq!(log.items.len(), 1);
        assert!((log.calories - 500.0).abs() < f64::EPSILON);
        assert!((log.fat - 15.0).abs() < f64::EPSILON);

        assert!(db.delete_meal_item(day(5), "missing").is_err());
        assert_eq!(count(&db, "nutrition_logs"), 1);
    }

    #[test]
    fn test_meal_item_rejects_negative_macros() {
        let db = Database::open_in_memory().unwrap();
        let result = db.add_meal_item(
            day(5),
            &NewMealItem {
                calories: -10.0,
                ..NewMealItem::default()
            },
        );
        assert!(result.is_err());
        assert!(db.get_nutrition_log(day(5)).unwrap().is_none());
    }

    #[test]
    fn test_reset_nutrition_day() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.reset_nutrition_day(day(6)).unwrap().is_none());
        db.add_meal_item(
            day(6),
            &NewMealItem {
                calories: 400.0,
                ..NewMealItem::default()
            },
        )
        .unwrap();
        let log = db.reset_nutrition_day(day(6)).unwrap().unwrap();
        assert!(log.items.is_empty());
        assert!(log.calories.abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_photos() {
        let db = Database::open_in_memory().unwrap();
        let first = db.add_progress_photo(ts(1, 8), "front.jpg", None).unwrap();
        db.add_progress_photo(ts(9, 8), "side.jpg", Some("week 2")).unwrap();
        let photos = db.list_progress_photos().unwrap();
        assert_eq!(photos[0].image_path, "side.jpg");
        assert!(db.delete_progress_photo(first.id).unwrap());
        assert_eq!(db.list_progress_photos().unwrap().len(), 1);
    }

    fn seed_everything(db: &Database) {
        let (program, template) = program_with_template(db, "PPL");
        let bench = slot(db, &program, &template, "Bench");
        let session = db
            .start_session(&NewSession {
                program_id: Some(program.id),
                template_id: Some(template.id),
                date: ts(1, 10),
            })
            .unwrap();
        log_set(db, session.id, bench.exercise_id, 60.0, 10);
        db.add_body_metric(&NewBodyMetric {
            date: ts(1, 8),
            weight: 80.0,
            height: 180.0,
            fat_percentage: None,
        })
        .unwrap();
        db.add_meal_item(
            day(1),
            &NewMealItem {
                calories: 500.0,
                ..NewMealItem::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn test_reset_analytics_keeps_programs() {
        let db = Database::open_in_memory().unwrap();
        seed_everything(&db);
        db.reset_analytics().unwrap();
        assert_eq!(count(&db, "sessions"), 0);
        assert_eq!(count(&db, "set_logs"), 0);
        assert_eq!(count(&db, "programs"), 1);
        assert_eq!(count(&db, "program_exercises"), 1);
    }

    #[test]
    fn test_reset_workouts_keeps_body_and_nutrition() {
        let db = Database::open_in_memory().unwrap();
        seed_everything(&db);
        db.reset_workouts().unwrap();
        assert_eq!(count(&db, "programs"), 0);
        assert_eq!(count(&db, "workout_templates"), 0);
        assert_eq!(count(&db, "exercises"), 1);
        assert_eq!(count(&db, "body_metrics"), 1);
        assert_eq!(count(&db, "nutrition_logs"), 1);
    }

    #[test]
    fn test_reset_all_reseeds_singletons() {
        let db = Database::open_in_memory().unwrap();
        seed_everything(&db);
        let mut goals = db.get_nutrition_goals().unwrap();
        goals.calories_target = 1800;
        db.update_nutrition_goals(&goals).unwrap();

        db.reset_all().unwrap();
        for table in [
            "programs",
            "exercises",
            "sessions",
            "set_logs",
            "body_metrics",
            "nutrition_logs",
        ] {
            assert_eq!(count(&db, table), 0, "{table}");
        }
        assert_eq!(count(&db, "nutrition_goals"), 1);
        assert_eq!(db.get_nutrition_goals().unwrap().calories_target, 2500);
        assert_eq!(count(&db, "notification_settings"), 1);
    }
}
