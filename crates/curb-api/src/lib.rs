//! # curb-api
//!
//! HTTP API layer and background workers for curbside.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for zones, quotes, sessions and reminders
//! - Periodic lifecycle scans and the reminder dispatcher
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/zones/{zone}` | Zone rate schedule |
//! | POST | `/api/v1/quotes` | Price a duration |
//! | POST | `/api/v1/sessions` | Start a paid session |
//! | GET | `/api/v1/sessions` | Caller's sessions |
//! | PUT | `/api/v1/sessions/{id}/reminder` | Set or cancel a reminder |
//! | GET | `/api/v1/admin/reconciliation` | Attempts pending reconciliation |

pub mod handlers;
pub mod routes;
pub mod state;
pub mod worker;

pub use routes::create_router;
pub use state::{AppConfig, AppState, ServiceSettings};
