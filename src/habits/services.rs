use tracing::{info, instrument};

use super::repo_types::{Habit, HabitWrite, NewHabit};
use crate::{
    auth::extractors::Identity,
    error::{AppError, AppResult},
    goals::repo_types::Goal,
    state::AppState,
};

const MAX_NAME_LEN: usize = 50;
const MAX_IMPACT_LEN: usize = 25;

/// Caller-supplied changes. `version` is the version the caller last read.
#[derive(Debug, Clone, Default)]
pub struct HabitPatch {
    pub version: i32,
    pub name: Option<String>,
    pub impact: Option<String>,
    pub goal_id: Option<i64>,
}

fn validate(name: &str, impact: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation("name too long"));
    }
    if impact.trim().is_empty() {
        return Err(AppError::validation("impact is required"));
    }
    if impact.chars().count() > MAX_IMPACT_LEN {
        return Err(AppError::validation("impact too long"));
    }
    Ok(())
}

/// Goal links may only point at the caller's own goals.
async fn check_goal(state: &AppState, identity: &Identity, goal_id: Option<i64>) -> AppResult<()> {
    let Some(goal_id) = goal_id else {
        return Ok(());
    };
    match Goal::get_by_id(&state.db, goal_id, identity.user_id).await {
        Ok(goal) => identity.authorize(&goal),
        Err(AppError::NotFound) => Err(AppError::validation("invalid goal")),
        Err(e) => Err(e),
    }
}

#[instrument(skip(state), fields(user_id = identity.user_id))]
pub async fn create_habit(state: &AppState, identity: &Identity, new: NewHabit) -> AppResult<Habit> {
    let new = NewHabit {
        name: new.name.trim().to_string(),
        impact: new.impact.trim().to_string(),
        goal_id: new.goal_id,
    };
    validate(&new.name, &new.impact)?;
    check_goal(state, identity, new.goal_id).await?;

    let habit = Habit::create(&state.db, identity.user_id, &new).await?;
    info!(habit_id = habit.id, "habit created");
    Ok(habit)
}

pub async fn get_habit(state: &AppState, identity: &Identity, id: i64) -> AppResult<Habit> {
    let habit = Habit::get_by_id(&state.db, id, identity.user_id).await?;
    identity.authorize(&habit)?;
    Ok(habit)
}

/// Applies `patch` on top of the stored row and writes it back only if the
/// row is still at `patch.version`.
#[instrument(skip(state), fields(user_id = identity.user_id))]
pub async fn update_habit(
    state: &AppState,
    identity: &Identity,
    id: i64,
    patch: HabitPatch,
) -> AppResult<Habit> {
    let current = get_habit(state, identity, id).await?;

    let write = HabitWrite {
        id: current.id,
        observed_version: patch.version,
        name: patch.name.map(|n| n.trim().to_string()).unwrap_or(current.name),
        impact: patch.impact.map(|i| i.trim().to_string()).unwrap_or(current.impact),
        goal_id: patch.goal_id.or(current.goal_id),
    };
    validate(&write.name, &write.impact)?;
    if patch.goal_id.is_some() {
        check_goal(state, identity, write.goal_id).await?;
    }

    let habit = Habit::update(&state.db, &write, identity.user_id).await?;
    info!(habit_id = habit.id, version = habit.version, "habit updated");
    Ok(habit)
}

#[instrument(skip(state), fields(user_id = identity.user_id))]
pub async fn delete_habit(state: &AppState, identity: &Identity, id: i64) -> AppResult<()> {
    let habit = get_habit(state, identity, id).await?;
    Habit::delete(&state.db, habit.id, identity.user_id).await?;
    info!(habit_id = id, "habit deleted");
    Ok(())
}
