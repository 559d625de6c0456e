//! Infrastructure shared by the ShelfCure services: the error taxonomy,
//! response envelopes, auth claims and extractors, the event-bus types, and
//! the database/RabbitMQ clients.

pub mod clients;
pub mod errors;
pub mod middleware;
pub mod types;

pub use errors::{AppError, AppResult, ErrorCode};
pub use types::*;
