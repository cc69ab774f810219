use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

/// Shipment milestone as shown on the tracking timeline.
///
/// The milestone drives the customer-facing progress display. Transitions are
/// deliberately unconstrained: an operator may set any milestone from any
/// other at any time (manual corrections happen in practice).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum StatusTitle {
    #[sea_orm(string_value = "order_completed")]
    OrderCompleted,

    #[sea_orm(string_value = "china_in_transit")]
    ChinaInTransit,

    #[sea_orm(string_value = "overseas_warehouse")]
    OverseasWarehouse,

    #[sea_orm(string_value = "expected_delivery")]
    ExpectedDelivery,

    #[sea_orm(string_value = "delivery_completed")]
    DeliveryCompleted,
}

impl StatusTitle {
    /// Coarse operational status implied by a milestone. Used as the default
    /// for the `status` field when the caller does not set it explicitly;
    /// operators may still override the pairing.
    pub fn coarse_status(self) -> TrackingStatus {
        match self {
            StatusTitle::OrderCompleted => TrackingStatus::Pending,
            StatusTitle::ChinaInTransit => TrackingStatus::InTransit,
            StatusTitle::OverseasWarehouse => TrackingStatus::Processing,
            StatusTitle::ExpectedDelivery => TrackingStatus::InTransit,
            StatusTitle::DeliveryCompleted => TrackingStatus::Delivered,
        }
    }
}

impl fmt::Display for StatusTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusTitle::OrderCompleted => write!(f, "order_completed"),
            StatusTitle::ChinaInTransit => write!(f, "china_in_transit"),
            StatusTitle::OverseasWarehouse => write!(f, "overseas_warehouse"),
            StatusTitle::ExpectedDelivery => write!(f, "expected_delivery"),
            StatusTitle::DeliveryCompleted => write!(f, "delivery_completed"),
        }
    }
}

impl std::str::FromStr for StatusTitle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "order_completed" => Ok(StatusTitle::OrderCompleted),
            "china_in_transit" => Ok(StatusTitle::ChinaInTransit),
            "overseas_warehouse" => Ok(StatusTitle::OverseasWarehouse),
            "expected_delivery" => Ok(StatusTitle::ExpectedDelivery),
            "delivery_completed" => Ok(StatusTitle::DeliveryCompleted),
            other => Err(format!("unknown status title '{}'", other)),
        }
    }
}

/// Coarse machine status kept alongside the milestone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "in_transit")]
    InTransit,

    #[sea_orm(string_value = "processing")]
    Processing,

    #[sea_orm(string_value = "delivered")]
    Delivered,
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingStatus::Pending => write!(f, "pending"),
            TrackingStatus::InTransit => write!(f, "in_transit"),
            TrackingStatus::Processing => write!(f, "processing"),
            TrackingStatus::Delivered => write!(f, "delivered"),
        }
    }
}

impl std::str::FromStr for TrackingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(TrackingStatus::Pending),
            "in_transit" => Ok(TrackingStatus::InTransit),
            "processing" => Ok(TrackingStatus::Processing),
            "delivered" => Ok(TrackingStatus::Delivered),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Current-state snapshot of one shipment. One row per tracking number;
/// the version trail lives in `tracking_history`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "tracking_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    #[validate(length(min = 1, max = 64, message = "Tracking number must not be empty"))]
    pub tracking_number: String,

    /// Owning customer account, if the shipment has been linked to one.
    pub customer_id: Option<i64>,

    /// Denormalized customer snapshot taken at creation time; deliberately
    /// not kept in sync with later customer edits.
    pub customer_name: String,
    pub customer_email: String,

    pub product_name: Option<String>,
    pub product_quantity: i32,

    pub status_title: StatusTitle,
    pub status: TrackingStatus,

    pub current_location: Option<String>,

    /// Plain calendar date. Stored and served without any time or timezone
    /// component; timezone-shifted conversions caused off-by-one-day bugs
    /// upstream.
    pub expected_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tracking_history::Entity")]
    TrackingHistory,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::tracking_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackingHistory.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
