pub mod activity_log;
pub mod customers;
pub mod tracking;
