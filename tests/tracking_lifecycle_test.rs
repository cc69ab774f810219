mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde_json::json;

use cargotrack_api::{
    entities::{
        tracking_history, tracking_item,
        tracking_item::{StatusTitle, TrackingStatus},
    },
    errors::ServiceError,
    services::tracking::TrackingItemPatch,
};

use common::{audit, new_item, spawn_app};

#[tokio::test]
async fn create_applies_defaults_and_seeds_history() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-001", "Jane Doe", "jane@example.com").await;

    let record = app
        .state
        .tracking_service()
        .create_tracking_item(new_item("TRK001", customer.id), audit())
        .await
        .unwrap();

    assert_eq!(record.item.tracking_number, "TRK001");
    assert_eq!(record.item.status_title, StatusTitle::OrderCompleted);
    assert_eq!(record.item.status, TrackingStatus::Pending);
    assert_eq!(record.item.product_quantity, 1);
    assert_eq!(record.item.customer_id, Some(customer.id));
    assert_eq!(record.item.customer_name, "Jane Doe");
    assert_eq!(record.item.customer_email, "jane@example.com");

    // The seed history entry mirrors the item.
    assert_eq!(record.histories.len(), 1);
    let seed = &record.histories[0];
    assert_eq!(seed.tracking_item_id, record.item.id);
    assert_eq!(seed.status_title, record.item.status_title);
    assert_eq!(seed.status, record.item.status);
    assert_eq!(seed.location, record.item.current_location);
}

#[tokio::test]
async fn newest_history_entry_always_matches_the_item() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-002", "Li Wei", "li@example.com").await;
    let service = app.state.tracking_service();

    let record = service
        .create_tracking_item(new_item("TRK002", customer.id), audit())
        .await
        .unwrap();

    let record = service
        .update_status(
            record.item.id,
            TrackingItemPatch {
                status_title: Some(StatusTitle::ChinaInTransit),
                status: Some(TrackingStatus::InTransit),
                current_location: Some(Some("Guangzhou".to_string())),
                ..Default::default()
            },
            audit(),
        )
        .await
        .unwrap();

    let record = service
        .update_status(
            record.item.id,
            TrackingItemPatch {
                status_title: Some(StatusTitle::OverseasWarehouse),
                status: Some(TrackingStatus::Processing),
                current_location: Some(Some("Rotterdam".to_string())),
                ..Default::default()
            },
            audit(),
        )
        .await
        .unwrap();

    // One seed entry plus one per update, newest first.
    assert_eq!(record.histories.len(), 3);
    let newest = &record.histories[0];
    assert_eq!(newest.status_title, record.item.status_title);
    assert_eq!(newest.status, record.item.status);
    assert_eq!(newest.location, record.item.current_location);

    // Earlier entries are never rewritten.
    assert_eq!(record.histories[2].status_title, StatusTitle::OrderCompleted);
    assert_eq!(record.histories[1].status_title, StatusTitle::ChinaInTransit);
    assert_eq!(record.histories[1].location.as_deref(), Some("Guangzhou"));
}

#[tokio::test]
async fn duplicate_tracking_number_is_rejected() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-003", "Ana", "ana@example.com").await;
    let service = app.state.tracking_service();

    service
        .create_tracking_item(new_item("TRK003", customer.id), audit())
        .await
        .unwrap();

    let err = service
        .create_tracking_item(new_item("TRK003", customer.id), audit())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::DuplicateTrackingNumber(number) if number == "TRK003");

    let rows = tracking_item::Entity::find()
        .filter(tracking_item::Column::TrackingNumber.eq("TRK003"))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn create_rolls_back_fully_when_history_insert_fails() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-004", "Omar", "omar@example.com").await;

    // Force a deterministic failure between the two inserts of the creation
    // transaction.
    app.state
        .db
        .execute_unprepared("DROP TABLE tracking_history")
        .await
        .unwrap();

    let result = app
        .state
        .tracking_service()
        .create_tracking_item(new_item("TRK004", customer.id), audit())
        .await;
    assert!(result.is_err());

    // The item insert succeeded inside the transaction but must not persist.
    let rows = tracking_item::Entity::find()
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn create_with_unknown_customer_fails() {
    let app = spawn_app().await;
    let err = app
        .state
        .tracking_service()
        .create_tracking_item(new_item("TRK005", 9999), audit())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::CustomerNotFound(9999));
}

#[tokio::test]
async fn milestones_may_move_backwards() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-005", "Mia", "mia@example.com").await;
    let service = app.state.tracking_service();

    let mut item = new_item("TRK006", customer.id);
    item.status_title = Some(StatusTitle::DeliveryCompleted);
    let record = service.create_tracking_item(item, audit()).await.unwrap();
    assert_eq!(record.item.status, TrackingStatus::Delivered);

    // Manual corrections go backwards; no transition rules apply.
    let record = service
        .update_status(
            record.item.id,
            TrackingItemPatch {
                status_title: Some(StatusTitle::OrderCompleted),
                ..Default::default()
            },
            audit(),
        )
        .await
        .unwrap();
    assert_eq!(record.item.status_title, StatusTitle::OrderCompleted);
    // The coarse status is only derived at creation, never re-derived.
    assert_eq!(record.item.status, TrackingStatus::Delivered);
}

#[tokio::test]
async fn expected_date_distinguishes_omitted_from_cleared() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-006", "Ken", "ken@example.com").await;
    let service = app.state.tracking_service();

    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let mut item = new_item("TRK007", customer.id);
    item.expected_date = Some(date);
    let record = service.create_tracking_item(item, audit()).await.unwrap();
    assert_eq!(record.item.expected_date, Some(date));

    // Omitted keeps the stored date.
    let record = service
        .update_status(
            record.item.id,
            TrackingItemPatch {
                status_title: Some(StatusTitle::ChinaInTransit),
                ..Default::default()
            },
            audit(),
        )
        .await
        .unwrap();
    assert_eq!(record.item.expected_date, Some(date));

    // An explicit null clears it.
    let record = service
        .update_status(
            record.item.id,
            TrackingItemPatch {
                expected_date: Some(None),
                ..Default::default()
            },
            audit(),
        )
        .await
        .unwrap();
    assert_eq!(record.item.expected_date, None);

    // And a new value replaces it.
    let later = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
    let record = service
        .update_status(
            record.item.id,
            TrackingItemPatch {
                expected_date: Some(Some(later)),
                ..Default::default()
            },
            audit(),
        )
        .await
        .unwrap();
    assert_eq!(record.item.expected_date, Some(later));
}

#[tokio::test]
async fn location_correction_writes_no_history_and_enforces_ownership() {
    let app = spawn_app().await;
    let owner = app.seed_customer("acct-007", "Ivy", "ivy@example.com").await;
    let other = app.seed_customer("acct-008", "Sam", "sam@example.com").await;
    let service = app.state.tracking_service();

    let record = service
        .create_tracking_item(new_item("TRK008", owner.id), audit())
        .await
        .unwrap();
    let item_id = record.item.id;

    let updated = service
        .update_location_only(item_id, owner.id, "Hamburg port".to_string())
        .await
        .unwrap();
    assert_eq!(updated.current_location.as_deref(), Some("Hamburg port"));
    assert_eq!(updated.status_title, record.item.status_title);

    // Still just the seed entry.
    let histories = tracking_history::Entity::find()
        .filter(tracking_history::Column::TrackingItemId.eq(item_id))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(histories.len(), 1);

    // Another customer may not touch it, and nothing changes.
    let err = service
        .update_location_only(item_id, other.id, "Elsewhere".to_string())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
    let current = tracking_item::Entity::find_by_id(item_id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.current_location.as_deref(), Some("Hamburg port"));

    // Blank locations are rejected.
    let err = service
        .update_location_only(item_id, owner.id, "   ".to_string())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn delete_removes_item_and_its_history() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-009", "Noa", "noa@example.com").await;
    let service = app.state.tracking_service();

    let record = service
        .create_tracking_item(new_item("TRK009", customer.id), audit())
        .await
        .unwrap();
    service
        .update_status(
            record.item.id,
            TrackingItemPatch {
                status_title: Some(StatusTitle::ChinaInTransit),
                ..Default::default()
            },
            audit(),
        )
        .await
        .unwrap();

    let number = service
        .delete_tracking_item(record.item.id, audit())
        .await
        .unwrap();
    assert_eq!(number, "TRK009");

    assert!(service
        .search_by_tracking_number("TRK009")
        .await
        .unwrap()
        .is_none());
    let histories = tracking_history::Entity::find()
        .filter(tracking_history::Column::TrackingItemId.eq(record.item.id))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert!(histories.is_empty());

    // Deleting again reports the missing item.
    let err = service
        .delete_tracking_item(record.item.id, audit())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::TrackingItemNotFound(_));
}

#[tokio::test]
async fn customer_listing_is_scoped_and_newest_first() {
    let app = spawn_app().await;
    let jane = app.seed_customer("acct-010", "Jane", "jane2@example.com").await;
    let li = app.seed_customer("acct-011", "Li", "li2@example.com").await;
    let service = app.state.tracking_service();

    service
        .create_tracking_item(new_item("TRK010", jane.id), audit())
        .await
        .unwrap();
    service
        .create_tracking_item(new_item("TRK011", li.id), audit())
        .await
        .unwrap();
    service
        .create_tracking_item(new_item("TRK012", jane.id), audit())
        .await
        .unwrap();

    let records = service.list_for_customer(jane.id).await.unwrap();
    let numbers: Vec<&str> = records
        .iter()
        .map(|record| record.item.tracking_number.as_str())
        .collect();
    assert_eq!(numbers, vec!["TRK012", "TRK010"]);

    let all = service.list_all().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].item.tracking_number, "TRK012");
    assert!(all.iter().all(|record| !record.histories.is_empty()));
}

#[tokio::test]
async fn admin_mutations_are_audited() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-012", "Aki", "aki@example.com").await;
    let service = app.state.tracking_service();

    let record = service
        .create_tracking_item(new_item("TRK013", customer.id), audit())
        .await
        .unwrap();
    service
        .update_status(
            record.item.id,
            TrackingItemPatch {
                status_title: Some(StatusTitle::DeliveryCompleted),
                ..Default::default()
            },
            audit(),
        )
        .await
        .unwrap();
    service
        .delete_tracking_item(record.item.id, audit())
        .await
        .unwrap();

    let (entries, total) = app.state.activity_log_service().list(10, 0).await.unwrap();
    assert_eq!(total, 3);
    let actions: Vec<&str> = entries.iter().map(|entry| entry.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "deleted tracking item",
            "updated tracking status",
            "created tracking item"
        ]
    );
    assert!(entries.iter().all(|entry| entry.ip_address == "203.0.113.1"));
}

#[tokio::test]
async fn public_search_reports_misses_in_the_body() {
    let app = spawn_app().await;

    let (status, body) = app
        .request(
            "GET",
            "/api/v1/tracking/search?trackingNumber=NONEXISTENT",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("tracking item not found"));

    // A missing query parameter is a real error, though.
    let (status, _) = app.request("GET", "/api/v1/tracking/search", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tracking_lifecycle_over_http() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-013", "Rin", "rin@example.com").await;
    let admin = app.admin_token();

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/tracking",
            Some(&admin),
            Some(json!({
                "trackingNumber": "TRK014",
                "customerId": customer.id,
                "productName": "Solar panels",
                "productQuantity": 2,
                "expectedDate": "2025-03-14"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    assert_eq!(data["trackingNumber"], json!("TRK014"));
    assert_eq!(data["statusTitle"], json!("order_completed"));
    assert_eq!(data["status"], json!("pending"));
    // The date survives as the literal calendar day.
    assert_eq!(data["expectedDate"], json!("2025-03-14"));
    assert_eq!(data["histories"].as_array().unwrap().len(), 1);
    let item_id = data["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/v1/tracking/{}", item_id),
            Some(&admin),
            Some(json!({
                "statusTitle": "china_in_transit",
                "status": "in_transit",
                "currentLocation": "Guangzhou"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["statusTitle"], json!("china_in_transit"));
    assert_eq!(body["data"]["currentLocation"], json!("Guangzhou"));
    assert_eq!(body["data"]["histories"].as_array().unwrap().len(), 2);

    // Explicit null clears the location; the omitted date is untouched.
    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/v1/tracking/{}", item_id),
            Some(&admin),
            Some(json!({ "currentLocation": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentLocation"], json!(null));
    assert_eq!(body["data"]["expectedDate"], json!("2025-03-14"));

    let (status, body) = app
        .request(
            "GET",
            "/api/v1/tracking/search?trackingNumber=TRK014",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["histories"].as_array().unwrap().len(), 3);

    let (status, body) = app
        .request(
            "DELETE",
            &format!("/api/v1/tracking/{}", item_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["trackingNumber"], json!("TRK014"));

    let (_, body) = app
        .request(
            "GET",
            "/api/v1/tracking/search?trackingNumber=TRK014",
            None,
            None,
        )
        .await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn duplicate_create_over_http_returns_conflict() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-014", "Taj", "taj@example.com").await;
    let admin = app.admin_token();
    let payload = json!({ "trackingNumber": "TRK015", "customerId": customer.id });

    let (status, _) = app
        .request("POST", "/api/v1/tracking", Some(&admin), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request("POST", "/api/v1/tracking", Some(&admin), Some(payload))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        json!("Tracking number 'TRK015' is already in use")
    );
}

#[tokio::test]
async fn admin_routes_reject_missing_and_underprivileged_tokens() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-015", "Val", "val@example.com").await;

    let (status, _) = app.request("GET", "/api/v1/tracking", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer_token = app.customer_token(customer.id);
    let (status, _) = app
        .request("GET", "/api/v1/tracking", Some(&customer_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request("GET", "/api/v1/activity-logs", Some(&customer_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request("GET", "/api/v1/customers", Some(&customer_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin_token();
    let (status, body) = app
        .request("GET", "/api/v1/tracking", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn customer_portal_over_http() {
    let app = spawn_app().await;
    let rin = app.seed_customer("acct-016", "Rin", "rin2@example.com").await;
    let other = app.seed_customer("acct-017", "Oda", "oda@example.com").await;
    let service = app.state.tracking_service();

    let record = service
        .create_tracking_item(new_item("TRK016", rin.id), audit())
        .await
        .unwrap();
    service
        .create_tracking_item(new_item("TRK017", other.id), audit())
        .await
        .unwrap();

    let token = app.customer_token(rin.id);
    let (status, body) = app
        .request("GET", "/api/v1/customer/tracking", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["trackingNumber"], json!("TRK016"));

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/v1/customer/tracking/{}/location", record.item.id),
            Some(&token),
            Some(json!({ "currentLocation": "Oslo depot" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentLocation"], json!("Oslo depot"));

    // The other customer's shipment stays out of reach.
    let other_id = service
        .search_by_tracking_number("TRK017")
        .await
        .unwrap()
        .unwrap()
        .item
        .id;
    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/v1/customer/tracking/{}/location", other_id),
            Some(&token),
            Some(json!({ "currentLocation": "Oslo depot" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn activity_log_endpoint_pages_newest_first() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-018", "Uma", "uma@example.com").await;
    let service = app.state.tracking_service();

    for n in 0..3 {
        service
            .create_tracking_item(new_item(&format!("TRK02{}", n), customer.id), audit())
            .await
            .unwrap();
    }

    let admin = app.admin_token();
    let (status, body) = app
        .request(
            "GET",
            "/api/v1/activity-logs?limit=2&offset=0",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(3));
    assert_eq!(body["data"]["limit"], json!(2));
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["description"].as_str().unwrap(), "TRK022 - Uma");
    assert_eq!(items[0]["userType"], json!("admin"));
}

#[tokio::test]
async fn status_and_health_endpoints_respond() {
    let app = spawn_app().await;

    let (status, body) = app.request("GET", "/api/v1/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["service"], json!("cargotrack-api"));

    let (status, body) = app.request("GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checks"]["database"], json!("healthy"));
}

#[tokio::test]
async fn invalid_status_strings_are_rejected_over_http() {
    let app = spawn_app().await;
    let customer = app.seed_customer("acct-019", "Zed", "zed@example.com").await;
    let admin = app.admin_token();

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/tracking",
            Some(&admin),
            Some(json!({
                "trackingNumber": "TRK030",
                "customerId": customer.id,
                "statusTitle": "lost_in_space"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/tracking",
            Some(&admin),
            Some(json!({
                "trackingNumber": "TRK031",
                "customerId": customer.id,
                "expectedDate": "14/03/2025"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
