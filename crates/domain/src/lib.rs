//! # Payx Domain
//!
//! Pure types for the Paychex API client.
//!
//! This crate contains:
//! - The error taxonomy and `Result` alias
//! - The response envelope, pagination and structured API errors
//! - The request parameter model and worker search criteria
//! - Client configuration and protocol constants
//! - Resource models
//!
//! ## Architecture
//! - No I/O; the request pipeline lives in `payx-infra`
//! - Depends only on `payx-common` and external crates

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::to_json_date;
