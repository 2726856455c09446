//! Token and response caches
//!
//! Both caches are external collaborators of the pipeline: each operation
//! must be individually atomic, nothing more is assumed across calls.

pub mod response;
pub mod token;

pub use response::{
    FileResponseCache, MemoryResponseCache, ResponseCache, ResponseCacheConfig,
};
pub use token::{FileTokenCache, MemoryTokenCache, TokenCache};
