//! HTTP surface of the sync proxy.
//!
//! Exposes [`proxy::SyncProxy`] to the browser client:
//!
//! | Route | Method | Success | Failure |
//! |-------|--------|---------|---------|
//! | `/api/sync?path=..` | GET | 200, the stored JSON document | `{"error"}` |
//! | `/api/sync` | POST `{path?, content}` | 200 `{"success": true, "message", "commit"}` | `{"success": false, "error"}` |
//! | `/api/sync` | other | — | 405 `{"error"}` |
//! | `/healthz` | GET | 200 `ok` | — |
//!
//! Failure statuses come from [`proxy::SyncError::status_code`]; backend
//! statuses and messages are passed through unchanged. A malformed query or
//! body is a 400 and a body over the configured limit a 413, both in the
//! envelope of the route's method.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, extraction, CORS and HTTP tracing live here.
//! The [`proxy`] crate sees none of it.

mod error;
mod routes;
mod server;

pub use error::{ApiError, Envelope};
pub use routes::{router, AppState};
pub use server::{cors_layer, serve, ListenerError, ServerConfig};
