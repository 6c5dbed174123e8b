use serde::{Deserialize, Serialize};

use crate::models::{Document, User};

/// Account tiers. The quota fields are advisory metadata; nothing
/// enforces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceLevel {
    Bronze,
    Silver,
    Gold,
    Unlimited,
    Enterprise,
}

impl ServiceLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "BRONZE",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
            Self::Unlimited => "UNLIMITED",
            Self::Enterprise => "ENTERPRISE",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BRONZE" => Some(Self::Bronze),
            "SILVER" => Some(Self::Silver),
            "GOLD" => Some(Self::Gold),
            "UNLIMITED" => Some(Self::Unlimited),
            "ENTERPRISE" => Some(Self::Enterprise),
            _ => None,
        }
    }

    /// (max uploads, max uploads per month, max users); -1 means unbounded.
    #[must_use]
    pub const fn quotas(self) -> (i32, i32, i32) {
        match self {
            Self::Bronze => (2, 2, 1),
            Self::Silver => (5, 10, 1),
            Self::Gold => (20, 50, 2),
            Self::Unlimited => (-1, -1, 10),
            Self::Enterprise => (-1, -1, 200),
        }
    }
}

/// An account with its resolved member and document sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub service_level: ServiceLevel,
    pub users: Vec<User>,
    pub documents: Vec<Document>,
}
