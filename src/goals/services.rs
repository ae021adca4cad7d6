use tracing::{info, instrument};

use super::repo_types::{Goal, GoalWrite, NewGoal, CATEGORIES};
use crate::{
    auth::extractors::Identity,
    error::{AppError, AppResult},
    state::AppState,
};

const MIN_YEAR: i32 = 2020;
const MAX_YEAR: i32 = 2100;
const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub version: i32,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

fn validate_description(description: &str) -> AppResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation("description too long"));
    }
    Ok(())
}

fn validate_new(new: &NewGoal) -> AppResult<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&new.year) {
        return Err(AppError::validation(format!(
            "year must be between {MIN_YEAR} and {MAX_YEAR}"
        )));
    }
    if !CATEGORIES.contains(&new.category.as_str()) {
        return Err(AppError::validation(format!(
            "category must be one of {}",
            CATEGORIES.join(", ")
        )));
    }
    validate_description(&new.description)
}

#[instrument(skip(state), fields(user_id = identity.user_id))]
pub async fn create_goal(state: &AppState, identity: &Identity, new: NewGoal) -> AppResult<Goal> {
    let new = NewGoal {
        year: new.year,
        category: new.category.trim().to_lowercase(),
        description: new.description.trim().to_string(),
    };
    validate_new(&new)?;

    let goal = Goal::create(&state.db, identity.user_id, &new).await?;
    info!(goal_id = goal.id, year = goal.year, category = %goal.category, "goal created");
    Ok(goal)
}

pub async fn get_goal(state: &AppState, identity: &Identity, id: i64) -> AppResult<Goal> {
    let goal = Goal::get_by_id(&state.db, id, identity.user_id).await?;
    identity.authorize(&goal)?;
    Ok(goal)
}

#[instrument(skip(state), fields(user_id = identity.user_id))]
pub async fn update_goal(
    state: &AppState,
    identity: &Identity,
    id: i64,
    patch: GoalPatch,
) -> AppResult<Goal> {
    let current = get_goal(state, identity, id).await?;

    let write = GoalWrite {
        id: current.id,
        observed_version: patch.version,
        description: patch
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or(current.description),
        completed: patch.completed.or(current.completed),
    };
    validate_description(&write.description)?;

    let goal = Goal::update(&state.db, &write, identity.user_id).await?;
    info!(goal_id = goal.id, version = goal.version, "goal updated");
    Ok(goal)
}

#[instrument(skip(state), fields(user_id = identity.user_id))]
pub async fn delete_goal(state: &AppState, identity: &Identity, id: i64) -> AppResult<()> {
    let goal = get_goal(state, identity, id).await?;
    Goal::delete(&state.db, goal.id, identity.user_id).await?;
    info!(goal_id = id, "goal deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(year: i32, category: &str) -> NewGoal {
        NewGoal {
            year,
            category: category.into(),
            description: String::new(),
        }
    }

    #[test]
    fn year_and_category_are_checked() {
        assert!(validate_new(&goal(2025, "health")).is_ok());
        assert!(validate_new(&goal(2019, "health")).is_err());
        assert!(validate_new(&goal(2101, "health")).is_err());
        assert!(validate_new(&goal(2025, "hobbies")).is_err());
    }

    #[test]
    fn description_is_bounded() {
        assert!(validate_description(&"d".repeat(500)).is_ok());
        assert!(validate_description(&"d".repeat(501)).is_err());
    }
}
