pub mod dashboard;
pub mod projection;
pub mod settings;
pub mod subscriptions;
