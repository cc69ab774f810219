pub mod activity_logs;
pub mod customers;
pub mod tracking;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    activity_log::ActivityLogService, customers::CustomerService, tracking::TrackingService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub tracking: Arc<TrackingService>,
    pub customers: Arc<CustomerService>,
    pub activity_logs: Arc<ActivityLogService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        let activity_logs = Arc::new(ActivityLogService::new(db.clone()));
        let tracking = Arc::new(TrackingService::new(
            db.clone(),
            event_sender,
            activity_logs.clone(),
        ));
        let customers = Arc::new(CustomerService::new(db));

        Self {
            tracking,
            customers,
            activity_logs,
        }
    }
}
