use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};

use crate::entities::documents;

/// Input for a document row. `account_id` is `None` for standalone uploads
/// that have not been attached to an account.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub extension: String,
    pub content: Vec<u8>,
    pub account_id: Option<i64>,
}

pub struct DocumentRepository {
    conn: DatabaseConnection,
}

impl DocumentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<documents::Model>> {
        documents::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query document by ID")
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<documents::Model>> {
        documents::Entity::find()
            .filter(documents::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query document by name")
    }

    pub async fn insert(&self, new: NewDocument) -> Result<documents::Model> {
        insert_document(&self.conn, new).await
    }

    /// Returns whether a row was actually removed.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let result = documents::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete document")?;
        Ok(result.rows_affected > 0)
    }
}

pub async fn insert_document<C: ConnectionTrait>(
    db: &C,
    new: NewDocument,
) -> Result<documents::Model> {
    let active = documents::ActiveModel {
        name: Set(new.name),
        extension: Set(new.extension),
        content: Set(new.content),
        account_id: Set(new.account_id),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };

    active.insert(db).await.context("Failed to insert document")
}
