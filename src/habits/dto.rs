use serde::Deserialize;

use super::{repo_types::NewHabit, services::HabitPatch};

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub name: String,
    pub impact: String,
    pub goal_id: Option<i64>,
}

impl From<CreateHabitRequest> for NewHabit {
    fn from(r: CreateHabitRequest) -> Self {
        Self {
            name: r.name,
            impact: r.impact,
            goal_id: r.goal_id,
        }
    }
}

/// `version` is required: it is the version the client last saw.
#[derive(Debug, Deserialize)]
pub struct UpdateHabitRequest {
    pub version: i32,
    pub name: Option<String>,
    pub impact: Option<String>,
    pub goal_id: Option<i64>,
}

impl From<UpdateHabitRequest> for HabitPatch {
    fn from(r: UpdateHabitRequest) -> Self {
        Self {
            version: r.version,
            name: r.name,
            impact: r.impact,
            goal_id: r.goal_id,
        }
    }
}
