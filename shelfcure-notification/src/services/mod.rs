pub mod generator;
pub mod notification_service;
pub mod store_service;
