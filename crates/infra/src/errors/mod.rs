//! Infrastructure error mapping

pub mod conversions;

pub use conversions::{auth_transport_error, cache_error, transport_api_error, transport_error_kind};
