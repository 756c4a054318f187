//! Typed client for the appointments backend.
//!
//! Every method is a thin [`ApiRequest`](crate::http::ApiRequest) builder layered on
//! [`Gateway::send`](crate::gateway::Gateway::send), so token attachment, refresh, and the 401
//! retry apply uniformly. Booking and profile payloads are validated locally before anything is
//! sent.

pub mod appointments;
pub mod auth;
pub mod payments;
pub mod profiles;

pub use auth::Credentials;
pub use payments::*;
