//! HTTP middleware.

pub mod capture;

pub use capture::capture_requests;
