use serde::Deserialize;

use super::{repo_types::NewGoal, services::GoalPatch};

#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub year: i32,
    pub category: String,
    #[serde(default)]
    pub description: String,
}

impl From<CreateGoalRequest> for NewGoal {
    fn from(r: CreateGoalRequest) -> Self {
        Self {
            year: r.year,
            category: r.category,
            description: r.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub version: i32,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl From<UpdateGoalRequest> for GoalPatch {
    fn from(r: UpdateGoalRequest) -> Self {
        Self {
            version: r.version,
            description: r.description,
            completed: r.completed,
        }
    }
}
