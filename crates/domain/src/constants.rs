//! Protocol constants
//!
//! Header names, placeholder names and fixed resources used by the
//! request pipeline and the endpoint methods.

use std::time::Duration;

// Headers
pub const TRANSACTION_ID_HEADER: &str = "X-payx-txid";
pub const CLIENT_CORRELATION_ID_HEADER: &str = "X-payx-client-correlationId";
pub const ETAG_HEADER: &str = "ETag";
pub const ACCEPT_HEADER: &str = "Accept";
pub const DEFAULT_ACCEPT: &str = "application/json";

// Path placeholders
pub const COMPANY_ID: &str = "companyId";
pub const PAY_PERIOD_ID: &str = "payperiodid";
pub const WORKER_ID: &str = "workerId";
pub const DISPLAY_ID: &str = "displayid";

// Pagination
pub const OFFSET_PARAM: &str = "offset";
pub const LIMIT_PARAM: &str = "limit";

// Vendor media types
pub const WORKERS_COMMUNICATIONS_MEDIA: &str = "application/vnd.paychex.workers_communications.v1+json";
pub const WORKER_COMMUNICATIONS_MEDIA: &str = "application/vnd.paychex.worker_communications.v1+json";

// Authentication
pub const AUTH_RESOURCE: &str = "auth/oauth/v2/token";
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";
/// Bound on waiting for another caller's token refresh.
pub const AUTH_LOCK_WAIT: Duration = Duration::from_secs(30);

// Configuration
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Response cache
pub const RESPONSE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const RESPONSE_CACHE_KEY_PREFIX: &str = "paychex:";
