//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! capture middleware / status route
//!     → logging.rs (one text entry per captured request)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout or an append-only log file
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LoggingError, RequestLogger};
