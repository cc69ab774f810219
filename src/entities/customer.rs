use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer account directory entry.
///
/// Referenced by tracking items for ownership checks and denormalization;
/// account lifecycle (registration, credentials) is managed elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Human-readable account code used for login.
    #[sea_orm(unique)]
    pub user_id: String,

    pub name: String,
    pub email: String,
    pub phone: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tracking_item::Entity")]
    TrackingItems,
}

impl Related<super::tracking_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackingItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
