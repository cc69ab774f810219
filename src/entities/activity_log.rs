use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Kind of actor that performed an audited action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    #[sea_orm(string_value = "admin")]
    Admin,

    #[sea_orm(string_value = "customer")]
    Customer,
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorType::Admin => write!(f, "admin"),
            ActorType::Customer => write!(f, "customer"),
        }
    }
}

/// One audit record of an actor's action. Best-effort: writes here must never
/// block or roll back the operation being audited.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_type: ActorType,
    pub user_id: i64,

    pub action: String,
    pub description: Option<String>,
    pub ip_address: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
