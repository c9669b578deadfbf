use anyhow::Result;
use clap::ValueEnum;

use ironlog_core::service::TrackerService;

use super::helpers::{print_json, require_confirmation};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum ResetScope {
    /// Sessions and sets
    Analytics,
    /// Programs, workout days, sessions and sets
    Workouts,
    /// Everything, goals and settings back to defaults
    All,
}

impl ResetScope {
    fn description(self) -> &'static str {
        match self {
            ResetScope::Analytics => "all workout history (sessions and sets)",
            ResetScope::Workouts => "all programs together with their workout history",
            ResetScope::All => "ALL data, including body, nutrition and goals",
        }
    }
}

pub(crate) fn cmd_reset(
    svc: &TrackerService,
    scope: ResetScope,
    yes: bool,
    json: bool,
) -> Result<()> {
    require_confirmation(yes, scope.description())?;
    match scope {
        ResetScope::Analytics => svc.reset_analytics()?,
        ResetScope::Workouts => svc.reset_workouts()?,
        ResetScope::All => svc.reset_all()?,
    }

    if json {
        print_json(&serde_json::json!({ "reset": format!("{scope:?}").to_lowercase() }))?;
    } else {
        println!("Deleted {}", scope.description());
    }
    Ok(())
}
