//! Common utilities shared across the payx crates.
//!
//! # Feature Tiers
//!
//! - `foundation`: clock abstraction, tolerant enum decoding, serde helpers
//! - `observability`: tracing of tolerant-decode fallbacks (enabled by default)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod clock;
#[cfg(feature = "foundation")]
pub mod tolerant;
#[cfg(feature = "foundation")]
pub mod utils;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use clock::{Clock, MockClock, SharedClock, SystemClock};
#[cfg(feature = "foundation")]
pub use tolerant::{EnumDecode, TolerantEnum, UnknownEnumValue};
#[cfg(feature = "foundation")]
pub use utils::serde::duration_secs;

// Used by `tolerant_enum!` expansions so downstream crates need no direct
// serde path of their own.
#[cfg(feature = "foundation")]
#[doc(hidden)]
pub use serde as __serde;
