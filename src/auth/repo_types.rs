use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::password::Password;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,                      // internal row id, never exposed
    pub public_id: Uuid,              // handle used in APIs and as the token subject
    pub username: String,
    pub email: String,
    pub password_hash: String,        // Argon2 PHC string
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationState {
    Pending,
    Active,
}

impl User {
    pub fn state(&self) -> ActivationState {
        if self.is_active {
            ActivationState::Active
        } else {
            ActivationState::Pending
        }
    }

    pub fn password(&self) -> Password {
        Password::from_hash(self.password_hash.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(active: bool) -> User {
        User {
            id: 1,
            public_id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@x.test".into(),
            password_hash: "$argon2id$bogus".into(),
            is_active: active,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn state_follows_activation_flag() {
        assert_eq!(user(false).state(), ActivationState::Pending);
        assert_eq!(user(true).state(), ActivationState::Active);
        assert_eq!(serde_json::to_string(&ActivationState::Pending).unwrap(), "\"pending\"");
    }
}
