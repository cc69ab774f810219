use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    auth::{AdminUser, AuthUser},
    entities::{
        tracking_history,
        tracking_item::{self, StatusTitle, TrackingStatus},
    },
    errors::ServiceError,
    services::tracking::{AuditContext, NewTrackingItem, TrackingItemPatch, TrackingRecord},
    ApiResponse, ApiResult, AppState,
};

/// Tracking item as served to admin and customer views.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "trackingNumber": "TRK001",
    "customerId": 5,
    "customerName": "Jane Doe",
    "customerEmail": "jane@example.com",
    "productName": "Solar panels",
    "productQuantity": 2,
    "statusTitle": "china_in_transit",
    "status": "in_transit",
    "currentLocation": "Guangzhou",
    "expectedDate": "2025-03-14",
    "createdAt": "2025-03-01T08:00:00Z",
    "updatedAt": "2025-03-05T10:30:00Z"
}))]
pub struct TrackingItemView {
    pub id: i64,
    pub tracking_number: String,
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: String,
    pub product_name: Option<String>,
    pub product_quantity: i32,
    pub status_title: StatusTitle,
    pub status: TrackingStatus,
    pub current_location: Option<String>,
    /// Plain calendar date, never a timestamp
    #[schema(value_type = Option<String>, example = "2025-03-14")]
    pub expected_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<tracking_item::Model> for TrackingItemView {
    fn from(model: tracking_item::Model) -> Self {
        Self {
            id: model.id,
            tracking_number: model.tracking_number,
            customer_id: model.customer_id,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            product_name: model.product_name,
            product_quantity: model.product_quantity,
            status_title: model.status_title,
            status: model.status,
            current_location: model.current_location,
            expected_date: model.expected_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingHistoryView {
    pub id: i64,
    pub tracking_item_id: i64,
    pub status_title: StatusTitle,
    pub status: TrackingStatus,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<tracking_history::Model> for TrackingHistoryView {
    fn from(model: tracking_history::Model) -> Self {
        Self {
            id: model.id,
            tracking_item_id: model.tracking_item_id,
            status_title: model.status_title,
            status: model.status,
            location: model.location,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

/// Item merged with its history, newest entry first.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingRecordView {
    #[serde(flatten)]
    pub item: TrackingItemView,
    pub histories: Vec<TrackingHistoryView>,
}

impl From<TrackingRecord> for TrackingRecordView {
    fn from(record: TrackingRecord) -> Self {
        Self {
            item: record.item.into(),
            histories: record
                .histories
                .into_iter()
                .map(TrackingHistoryView::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "trackingNumber": "TRK001",
    "customerId": 5,
    "productName": "Solar panels",
    "productQuantity": 2,
    "statusTitle": "order_completed",
    "currentLocation": "Shenzhen warehouse",
    "expectedDate": "2025-03-14",
    "description": "Intake registered"
}))]
pub struct CreateTrackingItemRequest {
    #[validate(length(min = 1, max = 64))]
    pub tracking_number: String,
    pub customer_id: i64,
    pub product_name: Option<String>,
    #[validate(range(min = 1))]
    pub product_quantity: Option<i32>,
    /// Milestone (order_completed, china_in_transit, overseas_warehouse,
    /// expected_delivery, delivery_completed); defaults to order_completed
    pub status_title: Option<String>,
    /// Coarse status (pending, in_transit, processing, delivered); derived
    /// from the milestone when omitted
    pub status: Option<String>,
    pub current_location: Option<String>,
    /// ISO calendar date, `YYYY-MM-DD`
    pub expected_date: Option<String>,
    pub description: Option<String>,
}

/// Deserializes a present-but-null field as `Some(None)`, leaving absent
/// fields as `None`. This is what lets callers clear a value explicitly.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrackingItemRequest {
    pub status_title: Option<String>,
    pub status: Option<String>,
    /// Omit to keep the stored location; send `null` to clear it
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub current_location: Option<Option<String>>,
    /// Omit to keep the stored date; send `null` to clear it
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub expected_date: Option<Option<String>>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    #[validate(length(min = 1))]
    pub current_location: String,
}

#[derive(Debug, Deserialize, Default, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub tracking_number: Option<String>,
}

fn parse_status_title(value: &str) -> Result<StatusTitle, ServiceError> {
    StatusTitle::from_str(value).map_err(ServiceError::ValidationError)
}

fn parse_status(value: &str) -> Result<TrackingStatus, ServiceError> {
    TrackingStatus::from_str(value).map_err(ServiceError::ValidationError)
}

/// Parses an ISO date string into a plain calendar date, taking the literal
/// year/month/day. A trailing time component is ignored rather than fed
/// through a timezone conversion (historically an off-by-one-day source).
fn parse_expected_date(value: &str) -> Result<NaiveDate, ServiceError> {
    let date_part = value
        .trim()
        .split(['T', ' '])
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
        ServiceError::ValidationError(format!("invalid expected date '{}'", value))
    })
}

/// Best-effort client IP for the audit trail.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string())
        })
}

#[utoipa::path(
    get,
    path = "/api/v1/tracking",
    responses(
        (status = 200, description = "All tracking items with nested history", body = ApiResponse<Vec<TrackingRecordView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn list_tracking_items(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Vec<TrackingRecordView>> {
    let records = state.tracking_service().list_all().await?;
    let views: Vec<TrackingRecordView> =
        records.into_iter().map(TrackingRecordView::from).collect();
    Ok(Json(ApiResponse::success(views)))
}

#[utoipa::path(
    post,
    path = "/api/v1/tracking",
    request_body = CreateTrackingItemRequest,
    responses(
        (status = 201, description = "Tracking item created", body = ApiResponse<TrackingRecordView>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Tracking number already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn create_tracking_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    headers: HeaderMap,
    Json(payload): Json<CreateTrackingItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TrackingRecordView>>), ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let status_title = payload
        .status_title
        .as_deref()
        .map(parse_status_title)
        .transpose()?;
    let status = payload.status.as_deref().map(parse_status).transpose()?;
    let expected_date = payload
        .expected_date
        .as_deref()
        .map(parse_expected_date)
        .transpose()?;

    let input = NewTrackingItem {
        tracking_number: payload.tracking_number,
        customer_id: payload.customer_id,
        product_name: payload.product_name,
        product_quantity: payload.product_quantity,
        status_title,
        status,
        current_location: payload.current_location,
        expected_date,
        description: payload.description,
    };
    let audit = AuditContext {
        actor_id: admin.id,
        source_ip: client_ip(&headers),
    };

    let record = state
        .tracking_service()
        .create_tracking_item(input, audit)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TrackingRecordView::from(record))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/tracking/{id}",
    params(("id" = i64, Path, description = "Tracking item ID")),
    request_body = UpdateTrackingItemRequest,
    responses(
        (status = 200, description = "Tracking item updated", body = ApiResponse<TrackingRecordView>),
        (status = 404, description = "Tracking item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn update_tracking_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<UpdateTrackingItemRequest>,
) -> ApiResult<TrackingRecordView> {
    let status_title = payload
        .status_title
        .as_deref()
        .map(parse_status_title)
        .transpose()?;
    let status = payload.status.as_deref().map(parse_status).transpose()?;
    let expected_date = match payload.expected_date {
        None => None,
        Some(None) => Some(None),
        Some(Some(raw)) => Some(Some(parse_expected_date(&raw)?)),
    };

    let patch = TrackingItemPatch {
        status_title,
        status,
        current_location: payload.current_location,
        expected_date,
        description: payload.description,
    };
    let audit = AuditContext {
        actor_id: admin.id,
        source_ip: client_ip(&headers),
    };

    let record = state
        .tracking_service()
        .update_status(id, patch, audit)
        .await?;
    Ok(Json(ApiResponse::success(TrackingRecordView::from(record))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tracking/{id}",
    params(("id" = i64, Path, description = "Tracking item ID")),
    responses(
        (status = 200, description = "Tracking item and its history removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Tracking item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn delete_tracking_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<serde_json::Value> {
    let audit = AuditContext {
        actor_id: admin.id,
        source_ip: client_ip(&headers),
    };
    let tracking_number = state
        .tracking_service()
        .delete_tracking_item(id, audit)
        .await?;
    Ok(Json(ApiResponse::success(
        json!({ "trackingNumber": tracking_number }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/tracking/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search result; a miss is reported in the body, not as an error", body = ApiResponse<TrackingRecordView>),
        (status = 400, description = "Missing tracking number", body = crate::errors::ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn search_tracking_item(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<TrackingRecordView> {
    let tracking_number = query
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ServiceError::ValidationError("tracking number is required".to_string())
        })?;

    // Anonymous callers get a plain miss, never an error, for unknown numbers.
    match state
        .tracking_service()
        .search_by_tracking_number(tracking_number)
        .await?
    {
        Some(record) => Ok(Json(ApiResponse::success(TrackingRecordView::from(record)))),
        None => Ok(Json(ApiResponse::error(
            "tracking item not found".to_string(),
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/customer/tracking",
    responses(
        (status = 200, description = "The caller's tracking items with nested history", body = ApiResponse<Vec<TrackingRecordView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "customer"
)]
pub async fn my_tracking_items(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<TrackingRecordView>> {
    let records = state.tracking_service().list_for_customer(user.id).await?;
    let views: Vec<TrackingRecordView> =
        records.into_iter().map(TrackingRecordView::from).collect();
    Ok(Json(ApiResponse::success(views)))
}

#[utoipa::path(
    put,
    path = "/api/v1/customer/tracking/{id}/location",
    params(("id" = i64, Path, description = "Tracking item ID")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Delivery location updated", body = ApiResponse<TrackingItemView>),
        (status = 403, description = "Tracking item owned by another customer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Tracking item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customer"
)]
pub async fn update_my_tracking_location(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLocationRequest>,
) -> ApiResult<TrackingItemView> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let updated = state
        .tracking_service()
        .update_location_only(id, user.id, payload.current_location)
        .await?;
    Ok(Json(ApiResponse::success(TrackingItemView::from(updated))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_date_is_taken_literally() {
        assert_eq!(
            parse_expected_date("2025-03-14").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
        );
        // A time component is ignored, never timezone-shifted.
        assert_eq!(
            parse_expected_date("2025-03-14T23:30:00+07:00").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
        );
        assert!(parse_expected_date("14/03/2025").is_err());
        assert!(parse_expected_date("").is_err());
    }

    #[test]
    fn unknown_status_strings_are_rejected() {
        assert!(parse_status_title("order_completed").is_ok());
        assert!(parse_status_title("lost_in_space").is_err());
        assert!(parse_status("pending").is_ok());
        assert!(parse_status("unknown").is_err());
    }

    #[test]
    fn update_request_distinguishes_omitted_from_null() {
        let omitted: UpdateTrackingItemRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(omitted.current_location, None);
        assert_eq!(omitted.expected_date, None);

        let cleared: UpdateTrackingItemRequest =
            serde_json::from_str(r#"{"currentLocation": null, "expectedDate": null}"#).unwrap();
        assert_eq!(cleared.current_location, Some(None));
        assert_eq!(cleared.expected_date, Some(None));

        let set: UpdateTrackingItemRequest =
            serde_json::from_str(r#"{"currentLocation": "Bangkok"}"#).unwrap();
        assert_eq!(set.current_location, Some(Some("Bangkok".to_string())));
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(client_ip(&headers), Some("203.0.113.7".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(client_ip(&headers), Some("198.51.100.2".to_string()));

        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
