use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::{
    db::DbPool,
    entities::{
        activity_log::ActorType,
        customer, tracking_history,
        tracking_item::{self, StatusTitle, TrackingStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::activity_log::ActivityLogService,
};

/// Input for creating a tracking item. Omitted fields take the documented
/// defaults; the customer snapshot is taken from the directory at this point
/// and never synced afterwards.
#[derive(Debug, Clone)]
pub struct NewTrackingItem {
    pub tracking_number: String,
    pub customer_id: i64,
    pub product_name: Option<String>,
    pub product_quantity: Option<i32>,
    pub status_title: Option<StatusTitle>,
    pub status: Option<TrackingStatus>,
    pub current_location: Option<String>,
    pub expected_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Partial update for a tracking item. Plain `Option` fields keep the stored
/// value when `None`; the double-`Option` fields additionally distinguish
/// "omitted" (`None`, keep) from "explicitly cleared" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct TrackingItemPatch {
    pub status_title: Option<StatusTitle>,
    pub status: Option<TrackingStatus>,
    pub current_location: Option<Option<String>>,
    pub expected_date: Option<Option<NaiveDate>>,
    pub description: Option<String>,
}

/// A tracking item merged with its history trail, newest entry first.
#[derive(Debug, Clone)]
pub struct TrackingRecord {
    pub item: tracking_item::Model,
    pub histories: Vec<tracking_history::Model>,
}

/// Who performed an admin mutation, for the audit trail.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub actor_id: i64,
    pub source_ip: Option<String>,
}

/// The tracking lifecycle manager: sole authority for creating and
/// transitioning tracking items.
///
/// Every mutation of the status-relevant fields runs in one transaction that
/// also appends exactly one history entry carrying the post-merge state, so
/// the newest history row always agrees with the item itself. The audit log
/// and the event channel sit outside the transaction and are best-effort.
#[derive(Clone)]
pub struct TrackingService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    activity_log: Arc<ActivityLogService>,
}

impl TrackingService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        activity_log: Arc<ActivityLogService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            activity_log,
        }
    }

    /// Creates a tracking item together with its seed history entry.
    ///
    /// Defaults: `status_title = order_completed`, `status` derived from the
    /// milestone, `product_quantity = 1`.
    #[instrument(skip(self, input, audit), fields(tracking_number = %input.tracking_number))]
    pub async fn create_tracking_item(
        &self,
        input: NewTrackingItem,
        audit: AuditContext,
    ) -> Result<TrackingRecord, ServiceError> {
        let tracking_number = input.tracking_number.trim().to_string();
        if tracking_number.is_empty() {
            return Err(ServiceError::ValidationError(
                "tracking number must not be empty".to_string(),
            ));
        }

        let number_for_txn = tracking_number.clone();
        let item = self
            .db
            .transaction::<_, tracking_item::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let customer = customer::Entity::find_by_id(input.customer_id)
                        .one(txn)
                        .await?
                        .ok_or(ServiceError::CustomerNotFound(input.customer_id))?;

                    let taken = tracking_item::Entity::find()
                        .filter(tracking_item::Column::TrackingNumber.eq(number_for_txn.clone()))
                        .one(txn)
                        .await?;
                    if taken.is_some() {
                        return Err(ServiceError::DuplicateTrackingNumber(number_for_txn));
                    }

                    let status_title = input.status_title.unwrap_or(StatusTitle::OrderCompleted);
                    let status = input
                        .status
                        .unwrap_or_else(|| status_title.coarse_status());
                    let now = Utc::now();

                    let item = tracking_item::ActiveModel {
                        tracking_number: Set(number_for_txn.clone()),
                        customer_id: Set(Some(customer.id)),
                        customer_name: Set(customer.name.clone()),
                        customer_email: Set(customer.email.clone()),
                        product_name: Set(input.product_name),
                        product_quantity: Set(input.product_quantity.unwrap_or(1)),
                        status_title: Set(status_title),
                        status: Set(status),
                        current_location: Set(input.current_location.clone()),
                        expected_date: Set(input.expected_date),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| match e.sql_err() {
                        // Race between the pre-check and the unique index.
                        Some(SqlErr::UniqueConstraintViolation(_)) => {
                            ServiceError::DuplicateTrackingNumber(number_for_txn.clone())
                        }
                        _ => ServiceError::DatabaseError(e),
                    })?;

                    tracking_history::ActiveModel {
                        tracking_item_id: Set(item.id),
                        status_title: Set(status_title),
                        status: Set(status),
                        location: Set(item.current_location.clone()),
                        description: Set(input.description),
                        created_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(item)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        let _ = self
            .event_sender
            .send(Event::TrackingItemCreated {
                tracking_item_id: item.id,
                tracking_number: item.tracking_number.clone(),
            })
            .await;

        self.activity_log
            .record(
                ActorType::Admin,
                audit.actor_id,
                "created tracking item",
                Some(format!(
                    "{} - {}",
                    item.tracking_number, item.customer_name
                )),
                audit.source_ip,
            )
            .await;

        self.fetch_record(item).await
    }

    /// Applies a partial status update and appends the matching history entry
    /// in the same transaction.
    #[instrument(skip(self, patch, audit))]
    pub async fn update_status(
        &self,
        tracking_item_id: i64,
        patch: TrackingItemPatch,
        audit: AuditContext,
    ) -> Result<TrackingRecord, ServiceError> {
        let item = self
            .db
            .transaction::<_, tracking_item::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = tracking_item::Entity::find_by_id(tracking_item_id)
                        .one(txn)
                        .await?
                        .ok_or(ServiceError::TrackingItemNotFound(tracking_item_id))?;

                    let next_status_title = patch.status_title.unwrap_or(existing.status_title);
                    let next_status = patch.status.unwrap_or(existing.status);
                    let next_location = match patch.current_location {
                        Some(location) => location,
                        None => existing.current_location.clone(),
                    };
                    let next_expected_date = match patch.expected_date {
                        Some(date) => date,
                        None => existing.expected_date,
                    };
                    let now = Utc::now();

                    let mut active: tracking_item::ActiveModel = existing.into();
                    active.status_title = Set(next_status_title);
                    active.status = Set(next_status);
                    active.current_location = Set(next_location.clone());
                    active.expected_date = Set(next_expected_date);
                    active.updated_at = Set(now);
                    let updated = active.update(txn).await?;

                    // The entry records the post-merge state, not the deltas.
                    tracking_history::ActiveModel {
                        tracking_item_id: Set(updated.id),
                        status_title: Set(next_status_title),
                        status: Set(next_status),
                        location: Set(next_location),
                        description: Set(patch.description),
                        created_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(updated)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        let _ = self
            .event_sender
            .send(Event::TrackingItemUpdated {
                tracking_item_id: item.id,
                tracking_number: item.tracking_number.clone(),
            })
            .await;

        self.activity_log
            .record(
                ActorType::Admin,
                audit.actor_id,
                "updated tracking status",
                Some(format!(
                    "{} -> {}",
                    item.tracking_number, item.status_title
                )),
                audit.source_ip,
            )
            .await;

        self.fetch_record(item).await
    }

    /// Removes a tracking item and its entire history trail. Returns the
    /// removed tracking number.
    #[instrument(skip(self, audit))]
    pub async fn delete_tracking_item(
        &self,
        tracking_item_id: i64,
        audit: AuditContext,
    ) -> Result<String, ServiceError> {
        let tracking_number = self
            .db
            .transaction::<_, String, ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = tracking_item::Entity::find_by_id(tracking_item_id)
                        .one(txn)
                        .await?
                        .ok_or(ServiceError::TrackingItemNotFound(tracking_item_id))?;
                    let tracking_number = item.tracking_number.clone();

                    // Explicit cascade: not every backend has FK enforcement
                    // turned on.
                    tracking_history::Entity::delete_many()
                        .filter(tracking_history::Column::TrackingItemId.eq(tracking_item_id))
                        .exec(txn)
                        .await?;
                    item.delete(txn).await?;

                    Ok(tracking_number)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        let _ = self
            .event_sender
            .send(Event::TrackingItemDeleted {
                tracking_item_id,
                tracking_number: tracking_number.clone(),
            })
            .await;

        self.activity_log
            .record(
                ActorType::Admin,
                audit.actor_id,
                "deleted tracking item",
                Some(tracking_number.clone()),
                audit.source_ip,
            )
            .await;

        Ok(tracking_number)
    }

    /// Public lookup by exact tracking number. A missing number is a normal
    /// outcome for anonymous callers, not an error.
    #[instrument(skip(self))]
    pub async fn search_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<TrackingRecord>, ServiceError> {
        let found = tracking_item::Entity::find()
            .filter(tracking_item::Column::TrackingNumber.eq(tracking_number))
            .one(&*self.db)
            .await?;

        match found {
            Some(item) => Ok(Some(self.fetch_record(item).await?)),
            None => Ok(None),
        }
    }

    /// Every tracking item with nested history, newest-created item first.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<TrackingRecord>, ServiceError> {
        let items = tracking_item::Entity::find()
            .order_by_desc(tracking_item::Column::CreatedAt)
            .order_by_desc(tracking_item::Column::Id)
            .all(&*self.db)
            .await?;
        self.load_histories(items).await
    }

    /// Same as [`list_all`](Self::list_all), scoped to one customer.
    #[instrument(skip(self))]
    pub async fn list_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<TrackingRecord>, ServiceError> {
        let items = tracking_item::Entity::find()
            .filter(tracking_item::Column::CustomerId.eq(customer_id))
            .order_by_desc(tracking_item::Column::CreatedAt)
            .order_by_desc(tracking_item::Column::Id)
            .all(&*self.db)
            .await?;
        self.load_histories(items).await
    }

    /// Customer self-service: corrects the delivery location of an owned
    /// shipment. Touches only `current_location` and `updated_at`, and
    /// deliberately appends NO history entry — a location correction is not a
    /// status milestone. (Asymmetric with [`update_status`](Self::update_status)
    /// on purpose; the operator-facing path always logs.)
    #[instrument(skip(self, current_location))]
    pub async fn update_location_only(
        &self,
        tracking_item_id: i64,
        customer_id: i64,
        current_location: String,
    ) -> Result<tracking_item::Model, ServiceError> {
        if current_location.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "current location must not be empty".to_string(),
            ));
        }

        let item = tracking_item::Entity::find_by_id(tracking_item_id)
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::TrackingItemNotFound(tracking_item_id))?;

        if item.customer_id != Some(customer_id) {
            return Err(ServiceError::Forbidden(
                "tracking item belongs to another customer".to_string(),
            ));
        }

        let mut active: tracking_item::ActiveModel = item.into();
        active.current_location = Set(Some(current_location));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        Ok(updated)
    }

    /// Merges one item with its full history, newest entry first.
    async fn fetch_record(
        &self,
        item: tracking_item::Model,
    ) -> Result<TrackingRecord, ServiceError> {
        let histories = tracking_history::Entity::find()
            .filter(tracking_history::Column::TrackingItemId.eq(item.id))
            .order_by_desc(tracking_history::Column::CreatedAt)
            .order_by_desc(tracking_history::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(TrackingRecord { item, histories })
    }

    /// Batch-fetches histories for many items in one query and groups them in
    /// memory, avoiding a query per item on the list endpoints.
    async fn load_histories(
        &self,
        items: Vec<tracking_item::Model>,
    ) -> Result<Vec<TrackingRecord>, ServiceError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
        let rows = tracking_history::Entity::find()
            .filter(tracking_history::Column::TrackingItemId.is_in(ids))
            .order_by_desc(tracking_history::Column::CreatedAt)
            .order_by_desc(tracking_history::Column::Id)
            .all(&*self.db)
            .await?;

        let mut grouped: HashMap<i64, Vec<tracking_history::Model>> = HashMap::new();
        for row in rows {
            grouped.entry(row.tracking_item_id).or_default().push(row);
        }

        Ok(items
            .into_iter()
            .map(|item| TrackingRecord {
                histories: grouped.remove(&item.id).unwrap_or_default(),
                item,
            })
            .collect())
    }
}
