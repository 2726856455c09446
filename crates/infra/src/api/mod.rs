//! Request pipeline for the payroll REST API
//!
//! Data flow for one call:
//!
//! 1. [`request::RequestBuilder`] resolves the resource and parameters
//! 2. the response cache is consulted for reads
//! 3. [`transport::TransportExecutor`] authenticates and sends, bounded by the configured timeout
//! 4. [`decode::ResponseDecoder`] turns the body into an [`Envelope`](payx_domain::Envelope)
//! 5. [`envelope::post_process`] copies correlation headers into it
//! 6. [`classify::classify`] returns it or a typed [`PayxError`](payx_domain::PayxError)

pub mod auth;
pub mod classify;
pub mod client;
pub mod decode;
mod endpoints;
pub mod envelope;
pub mod request;
pub mod transport;

pub use auth::{AccessTokenProvider, Authenticator};
pub use classify::{classify, ResponseSummary};
pub use client::{ApiClient, ApiClientBuilder};
pub use decode::{LenientSwitch, ResponseDecoder};
pub use envelope::post_process;
pub use request::{PreparedRequest, RequestBuilder};
pub use transport::{Exchange, RawResponse, TransportExecutor};
