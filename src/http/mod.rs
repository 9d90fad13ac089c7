//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, peer address, timeouts, body limit)
//!     → middleware/capture.rs (snapshot once, log "Incoming Request")
//!     → route match
//!         /errorcode/{code} (GET) → response.rs status_code_response
//!         everything else         → response.rs echo_response
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{extract, RequestSnapshot};
pub use response::{echo_response, status_code_response, InvalidStatusCode};
pub use server::{AppState, HttpServer};
