use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    db::DbPool,
    entities::activity_log::{self, ActorType},
    errors::ServiceError,
};

/// Best-effort audit sink for admin and customer actions.
#[derive(Clone)]
pub struct ActivityLogService {
    db: Arc<DbPool>,
}

impl ActivityLogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Records one audit entry. Failures are logged and swallowed: audit
    /// unavailability must never fail or roll back the operation being
    /// audited.
    #[instrument(skip(self, description))]
    pub async fn record(
        &self,
        user_type: ActorType,
        user_id: i64,
        action: &str,
        description: Option<String>,
        ip_address: Option<String>,
    ) {
        let entry = activity_log::ActiveModel {
            user_type: Set(user_type),
            user_id: Set(user_id),
            action: Set(action.to_string()),
            description: Set(description),
            ip_address: Set(ip_address.unwrap_or_else(|| "unknown".to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        if let Err(e) = entry.insert(&*self.db).await {
            error!(error = %e, action, "failed to record activity log entry");
        }
    }

    /// Lists audit entries newest first, with the total count for paging.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<activity_log::Model>, u64), ServiceError> {
        let total = activity_log::Entity::find().count(&*self.db).await?;

        let entries = activity_log::Entity::find()
            .order_by_desc(activity_log::Column::CreatedAt)
            .order_by_desc(activity_log::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&*self.db)
            .await?;

        Ok((entries, total))
    }
}
