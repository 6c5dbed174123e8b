use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};

use crate::entities::auth_groups;
use crate::models::Role;

pub struct AuthGroupRepository {
    conn: DatabaseConnection,
}

impl AuthGroupRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Role bindings are keyed by the email string, not the user row.
    pub async fn find_by_username(&self, username: &str) -> Result<Vec<auth_groups::Model>> {
        auth_groups::Entity::find()
            .filter(auth_groups::Column::Username.eq(username))
            .all(&self.conn)
            .await
            .context("Failed to query auth groups by username")
    }
}

pub async fn insert_auth_group<C: ConnectionTrait>(
    db: &C,
    username: &str,
    role: Role,
) -> Result<auth_groups::Model> {
    let active = auth_groups::ActiveModel {
        username: Set(username.to_string()),
        role: Set(role.as_str().to_string()),
        ..Default::default()
    };

    active
        .insert(db)
        .await
        .context("Failed to insert auth group")
}
