use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::tracking_item::{StatusTitle, TrackingStatus};

/// One immutable snapshot of a tracking item's status at a point in time.
///
/// Rows are appended by the lifecycle manager alongside every item creation
/// and status update, and are never mutated or deleted individually; they only
/// go away when the owning item is removed (cascade).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracking_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub tracking_item_id: i64,

    /// Values assigned to the parent item at the time of this entry. They may
    /// repeat when a later edit leaves them unchanged.
    pub status_title: StatusTitle,
    pub status: TrackingStatus,

    pub location: Option<String>,

    /// Free-text operator note.
    pub description: Option<String>,

    /// Ordering key for display (newest first).
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tracking_item::Entity",
        from = "Column::TrackingItemId",
        to = "super::tracking_item::Column::Id",
        on_delete = "Cascade"
    )]
    TrackingItem,
}

impl Related<super::tracking_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackingItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
