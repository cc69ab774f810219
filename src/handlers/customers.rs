use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{auth::AdminUser, entities::customer, ApiResponse, ApiResult, AppState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub id: i64,
    /// Human-readable account code
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<customer::Model> for CustomerView {
    fn from(model: customer::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            created_at: model.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    responses(
        (status = 200, description = "Customer directory", body = ApiResponse<Vec<CustomerView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Vec<CustomerView>> {
    let customers = state.customer_service().list_customers().await?;
    let views: Vec<CustomerView> = customers.into_iter().map(CustomerView::from).collect();
    Ok(Json(ApiResponse::success(views)))
}
