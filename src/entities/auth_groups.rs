use sea_orm::entity::prelude::*;

/// Role grants are keyed by username string, not a foreign key to
/// `users.id`; one user may hold several rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "auth_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The user's email.
    pub username: String,

    /// "ROLE_USER" or "ROLE_ADMIN"
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
