//! Trend statistics over already-loaded session and set history.
//!
//! Everything here is pure and total: empty input gives empty or zeroed
//! output, and rows that reference missing parents simply contribute nothing.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{Exercise, MUSCLE_CATEGORIES, Session, SetLog};

/// Per-session performance of one exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseStat {
    pub date: NaiveDateTime,
    pub max_weight: f64,
    pub volume: f64,
    pub reps: i64,
}

/// Difference between the last two entries of an [`ExerciseStat`] series.
///
/// `is_improving` is `None` when fewer than two entries exist, which is how
/// callers tell "no comparison possible" apart from "not improving".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressDelta {
    pub weight_gain: f64,
    pub volume_gain: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_improving: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramTrend {
    pub week_start: NaiveDate,
    pub volume: f64,
    pub sessions_count: usize,
    /// Mean weight per set across the week.
    pub intensity_index: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressOverview {
    pub workouts: usize,
    pub total_volume: f64,
    pub unique_exercises: usize,
}

#[allow(clippy::cast_precision_loss)]
fn set_volume(set: &SetLog) -> f64 {
    set.weight * set.reps as f64
}

/// Stats for `exercise_id` in each completed session, in the given session
/// order. Sessions where the exercise was not performed are left out.
///
/// Warm-up sets are counted like any other set.
#[must_use]
pub fn get_exercise_stats(
    exercise_id: i64,
    sessions: &[Session],
    sets: &[SetLog],
) -> Vec<ExerciseStat> {
    sessions
        .iter()
        .filter(|s| s.is_completed)
        .filter_map(|session| {
            let session_sets: Vec<&SetLog> = sets
                .iter()
                .filter(|s| s.session_id == session.id && s.exercise_id == exercise_id)
                .collect();
            if session_sets.is_empty() {
                return None;
            }

            let max_weight = session_sets
                .iter()
                .map(|s| s.weight)
                .fold(f64::NEG_INFINITY, f64::max);
            let volume = session_sets.iter().map(|s| set_volume(s)).sum();
            let reps = session_sets.iter().map(|s| s.reps).sum();

            Some(ExerciseStat {
                date: session.date,
                max_weight,
                volume,
                reps,
            })
        })
        .collect()
}

/// Compare the last two entries by position; callers must pass the series
/// oldest first.
#[must_use]
pub fn detect_progress(stats: &[ExerciseStat]) -> ProgressDelta {
    let [.., previous, latest] = stats else {
        return ProgressDelta {
            weight_gain: 0.0,
            volume_gain: 0.0,
            is_improving: None,
        };
    };

    ProgressDelta {
        weight_gain: latest.max_weight - previous.max_weight,
        volume_gain: latest.volume - previous.volume,
        is_improving: Some(
            latest.volume > previous.volume || latest.max_weight > previous.max_weight,
        ),
    }
}

/// Monday on or before `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Whole-program volume, session count and intensity per Monday-based week,
/// oldest week first.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn get_program_trends(
    program_id: i64,
    sessions: &[Session],
    sets: &[SetLog],
) -> Vec<ProgramTrend> {
    let mut weeks: BTreeMap<NaiveDate, Vec<&Session>> = BTreeMap::new();
    for session in sessions
        .iter()
        .filter(|s| s.is_completed && s.program_id == Some(program_id))
    {
        weeks
            .entry(week_start(session.date.date()))
            .or_default()
            .push(session);
    }

    weeks
        .into_iter()
        .map(|(week_start, week_sessions)| {
            let ids: HashSet<i64> = week_sessions.iter().map(|s| s.id).collect();
            let week_sets: Vec<&SetLog> =
                sets.iter().filter(|s| ids.contains(&s.session_id)).collect();

            let volume = week_sets.iter().map(|s| set_volume(s)).sum();
            let total_weight: f64 = week_sets.iter().map(|s| s.weight).sum();
            let intensity_index = if week_sets.is_empty() {
                0.0
            } else {
                total_weight / week_sets.len() as f64
            };

            ProgramTrend {
                week_start,
                volume,
                sessions_count: week_sessions.len(),
                intensity_index,
            }
        })
        .collect()
}

/// Headline numbers across all completed sessions.
#[must_use]
pub fn progress_overview(sessions: &[Session], sets: &[SetLog]) -> ProgressOverview {
    let completed: HashSet<i64> = sessions
        .iter()
        .filter(|s| s.is_completed)
        .map(|s| s.id)
        .collect();
    let logged = sets.iter().filter(|s| completed.contains(&s.session_id));

    let mut total_volume = 0.0;
    let mut exercises = HashSet::new();
    for set in logged {
        total_volume += set_volume(set);
        exercises.insert(set.exercise_id);
    }

    ProgressOverview {
        workouts: completed.len(),
        total_volume,
        unique_exercises: exercises.len(),
    }
}

/// Number of sets per muscle category in completed sessions dated on or
/// after `since`. Every known category is present; exercises without a
/// known category are ignored.
#[must_use]
pub fn muscle_group_tally(
    sessions: &[Session],
    sets: &[SetLog],
    exercises: &[Exercise],
    since: NaiveDateTime,
) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, u32> = MUSCLE_CATEGORIES
        .iter()
        .map(|c| ((*c).to_string(), 0))
        .collect();

    let recent: HashSet<i64> = sessions
        .iter()
        .filter(|s| s.is_completed && s.date >= since)
        .map(|s| s.id)
        .collect();
    let categories: HashMap<i64, &str> = exercises
        .iter()
        .filter_map(|e| e.category.as_deref().map(|c| (e.id, c)))
        .collect();

    for set in sets.iter().filter(|s| recent.contains(&s.session_id)) {
        if let Some(count) = categories
            .get(&set.exercise_id)
            .and_then(|c| counts.get_mut(*c))
        {
            *count += 1;
        }
    }

    counts
}
