use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::AdminUser,
    entities::activity_log::{self, ActorType},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityLogQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogView {
    pub id: i64,
    pub user_type: ActorType,
    pub user_id: i64,
    pub action: String,
    pub description: Option<String>,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}

impl From<activity_log::Model> for ActivityLogView {
    fn from(model: activity_log::Model) -> Self {
        Self {
            id: model.id,
            user_type: model.user_type,
            user_id: model.user_id,
            action: model.action,
            description: model.description,
            ip_address: model.ip_address,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityLogPage {
    pub items: Vec<ActivityLogView>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/activity-logs",
    params(ActivityLogQuery),
    responses(
        (status = 200, description = "Audit entries, newest first", body = ApiResponse<ActivityLogPage>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "activity-logs"
)]
pub async fn list_activity_logs(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ActivityLogQuery>,
) -> ApiResult<ActivityLogPage> {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let offset = query.offset.unwrap_or(0);

    let (entries, total) = state.activity_log_service().list(limit, offset).await?;
    let items: Vec<ActivityLogView> = entries.into_iter().map(ActivityLogView::from).collect();

    Ok(Json(ApiResponse::success(ActivityLogPage {
        items,
        total,
        limit,
        offset,
    })))
}
