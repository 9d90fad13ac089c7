//! HTTP request-introspection service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::EchoConfig;
pub use http::{HttpServer, RequestSnapshot};
pub use lifecycle::Shutdown;
pub use observability::RequestLogger;
