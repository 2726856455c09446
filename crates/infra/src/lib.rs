//! # Payx Infrastructure
//!
//! I/O side of the Paychex API client.
//!
//! This crate contains:
//! - The request pipeline and [`ApiClient`] facade
//! - OAuth2 client-credentials authentication
//! - Token and response caches (memory and file backed)
//! - Configuration loading from environment and files
//! - Tracing setup
//!
//! ## Architecture
//! - Types and errors come from `payx-domain`
//! - Clock and tolerant enum decoding come from `payx-common`

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;

// Re-export commonly used items
pub use api::{AccessTokenProvider, ApiClient, ApiClientBuilder, Authenticator};
pub use cache::*;
pub use http::{HttpClient, HttpClientBuilder};
pub use logging::{init_tracing, LogFormat};
