pub mod activity_log;
pub mod customer;
pub mod tracking_history;
pub mod tracking_item;

pub use activity_log::ActorType;
pub use tracking_item::{StatusTitle, TrackingStatus};
