use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CargoTrack API",
        version = "1.0.0",
        description = r#"
# CargoTrack Shipment Tracking API

Back-office and customer-facing API for cross-border shipment tracking.

- **Tracking items**: one record per tracking number with the current
  milestone, coarse status, location, and expected delivery date
- **History ledger**: every status update appends an entry; the trail is
  never rewritten
- **Customer portal**: customers list their own shipments and may correct
  the delivery location
- **Audit**: administrative mutations are recorded in an activity log

## Authentication

Administrative and customer endpoints require a JWT bearer token:

```
Authorization: Bearer <token>
```

The public search endpoint takes no credentials.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "tracking", description = "Tracking item management"),
        (name = "customer", description = "Customer portal endpoints"),
        (name = "customers", description = "Customer directory"),
        (name = "activity-logs", description = "Activity audit trail")
    ),
    paths(
        crate::handlers::tracking::list_tracking_items,
        crate::handlers::tracking::create_tracking_item,
        crate::handlers::tracking::update_tracking_item,
        crate::handlers::tracking::delete_tracking_item,
        crate::handlers::tracking::search_tracking_item,
        crate::handlers::tracking::my_tracking_items,
        crate::handlers::tracking::update_my_tracking_location,
        crate::handlers::customers::list_customers,
        crate::handlers::activity_logs::list_activity_logs,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,
            crate::entities::StatusTitle,
            crate::entities::TrackingStatus,
            crate::entities::ActorType,
            crate::handlers::tracking::TrackingItemView,
            crate::handlers::tracking::TrackingHistoryView,
            crate::handlers::tracking::TrackingRecordView,
            crate::handlers::tracking::CreateTrackingItemRequest,
            crate::handlers::tracking::UpdateTrackingItemRequest,
            crate::handlers::tracking::UpdateLocationRequest,
            crate::handlers::customers::CustomerView,
            crate::handlers::activity_logs::ActivityLogView,
            crate::handlers::activity_logs::ActivityLogPage,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_covers_core_routes() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("CargoTrack"));
        assert!(json.contains("/api/v1/tracking"));
        assert!(json.contains("/api/v1/tracking/search"));
        assert!(json.contains("/api/v1/customer/tracking"));
        assert!(json.contains("/api/v1/activity-logs"));
    }
}
