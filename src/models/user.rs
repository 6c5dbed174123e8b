use serde::{Deserialize, Serialize};

use crate::entities::{auth_groups, users};

/// A registered user. The password hash never leaves the store layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub enabled: bool,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            enabled: model.enabled,
        }
    }
}

/// Roles a user may hold. A user can hold several roles at once through
/// multiple [`AuthGroup`] rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "ROLE_USER",
            Self::Admin => "ROLE_ADMIN",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ROLE_USER" => Some(Self::User),
            "ROLE_ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Binds a role to a username (email). Deliberately keyed by the email
/// string rather than `users.id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthGroup {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthGroup {
    pub(crate) fn from_model(model: auth_groups::Model) -> Option<Self> {
        Role::parse(&model.role).map(|role| Self {
            id: model.id,
            username: model.username,
            role,
        })
    }
}
