mod body;
mod goals;
mod helpers;
mod nutrition;
mod program;
mod progress;
mod reset;
mod session;

pub(crate) use body::{cmd_body_delete, cmd_body_history, cmd_body_log};
pub(crate) use goals::{
    cmd_goals_activity, cmd_goals_manual, cmd_goals_mode, cmd_goals_show, cmd_goals_type,
};
pub(crate) use nutrition::{
    cmd_food_add, cmd_food_delete, cmd_food_reset, cmd_food_show, cmd_food_update,
};
pub(crate) use program::{
    cmd_day_add, cmd_day_delete, cmd_day_list, cmd_day_rename, cmd_exercise_add,
    cmd_exercise_list, cmd_exercise_remove, cmd_exercise_targets, cmd_program_archive,
    cmd_program_create, cmd_program_delete, cmd_program_list, cmd_program_rename,
    cmd_program_show,
};
pub(crate) use progress::{
    cmd_progress_exercise, cmd_progress_heatmap, cmd_progress_overview, cmd_progress_program,
};
pub(crate) use reset::{ResetScope, cmd_reset};
pub(crate) use session::{
    cmd_session_cancel, cmd_session_edit, cmd_session_finish, cmd_session_list,
    cmd_session_start, cmd_set_delete, cmd_set_list, cmd_set_log, cmd_set_update,
};
