//! Request builder
//!
//! Turns a resource template, a method and a parameter list into a
//! [`PreparedRequest`]: placeholders resolved, optional parameters
//! evaluated, correlation id attached and `Accept` defaulted.

use payx_common::SharedClock;
use payx_domain::constants::{ACCEPT_HEADER, CLIENT_CORRELATION_ID_HEADER, DEFAULT_ACCEPT};
use payx_domain::{BuildContext, Parameter, ParameterKind, PayxError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Method;
use url::Url;
use uuid::Uuid;

use crate::config::normalize_base_url;

/// Fully resolved request, ready for the transport executor.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    /// Absolute URL including the query string for reads.
    pub url: Url,
    /// Form fields for writes.
    pub form: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub correlation_id: String,
    pub cache_key: String,
}

impl PreparedRequest {
    /// Effective `Accept` media type.
    #[must_use]
    pub fn accept(&self) -> &str {
        self.headers.get(ACCEPT).and_then(|v| v.to_str().ok()).unwrap_or(DEFAULT_ACCEPT)
    }

    /// Path and query of the resolved URL.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        path_and_query(&self.url)
    }

    /// Only reads are served from and written to the response cache.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET
    }
}

/// Builds requests against one base URL.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: Url,
    clock: SharedClock,
}

impl RequestBuilder {
    /// # Errors
    ///
    /// Returns [`PayxError::Config`] if `base_url` is not absolute http(s).
    pub fn new(base_url: &str, clock: SharedClock) -> Result<Self> {
        let normalized = normalize_base_url(base_url)?;
        let base_url = Url::parse(&normalized)
            .map_err(|e| PayxError::Config(format!("Invalid url_endpoint '{base_url}': {e}")))?;
        Ok(Self { base_url, clock })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `resource` against the base URL and apply `params`.
    ///
    /// Deferred parameters are evaluated here, once, with the current time
    /// from the injected clock.
    ///
    /// # Errors
    ///
    /// Returns [`PayxError::InvalidRequest`] for an empty parameter name, a
    /// placeholder with no matching path parameter, or a header that is not
    /// valid HTTP.
    pub fn build(&self, resource: &str, method: Method, params: &[Parameter]) -> Result<PreparedRequest> {
        let ctx = BuildContext { now: self.clock.now() };

        if let Some(unnamed) = params.iter().find(|p| p.name().is_empty()) {
            return Err(PayxError::InvalidRequest(format!("parameter with empty name: {unnamed}")));
        }

        let path = resolve_template(resource, params, &ctx)?;
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| PayxError::InvalidRequest(format!("cannot resolve resource '{path}': {e}")))?;

        let correlation_id = Uuid::new_v4().simple().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-payx-client-correlationid"),
            header_value(CLIENT_CORRELATION_ID_HEADER, &correlation_id)?,
        );

        let sends_body = method_sends_body(&method);
        let mut query = Vec::new();
        let mut form = Vec::new();
        let mut accept_supplied = false;

        for param in params {
            if param.kind() == ParameterKind::Path {
                continue;
            }
            let Some(value) = param.resolve(&ctx) else {
                continue;
            };

            match param.kind() {
                ParameterKind::Query if sends_body => form.push((param.name().to_string(), value.into_owned())),
                ParameterKind::Query => query.push((param.name().to_string(), value.into_owned())),
                ParameterKind::Header => {
                    let name = HeaderName::from_bytes(param.name().as_bytes()).map_err(|e| {
                        PayxError::InvalidRequest(format!("invalid header name '{}': {e}", param.name()))
                    })?;
                    accept_supplied |= name == ACCEPT;
                    headers.insert(name, header_value(param.name(), &value)?);
                }
                ParameterKind::Path => {}
            }
        }

        if !accept_supplied {
            headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        }

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        let accept = headers.get(ACCEPT).and_then(|v| v.to_str().ok()).unwrap_or(DEFAULT_ACCEPT);
        let cache_key = cache_key(&url, accept);

        Ok(PreparedRequest { method, url, form, headers, correlation_id, cache_key })
    }
}

/// Replace every `{name}` in `template` with the matching path parameter.
///
/// Names match exactly first, then ignoring ASCII case. Values are
/// percent-encoded as a single path segment.
fn resolve_template(template: &str, params: &[Parameter], ctx: &BuildContext) -> Result<String> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        resolved.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            PayxError::InvalidRequest(format!("unterminated placeholder in resource '{template}'"))
        })?;
        let name = &after[..close];

        let value = find_path_param(params, name)
            .and_then(|p| p.resolve(ctx))
            .ok_or_else(|| {
                PayxError::InvalidRequest(format!(
                    "no path parameter supplied for placeholder '{{{name}}}' in '{template}'"
                ))
            })?;
        resolved.push_str(&urlencoding::encode(&value));
        rest = &after[close + 1..];
    }

    resolved.push_str(rest);
    Ok(resolved)
}

fn find_path_param<'a>(params: &'a [Parameter], name: &str) -> Option<&'a Parameter> {
    let mut path_params = params.iter().filter(|p| p.kind() == ParameterKind::Path);
    path_params
        .clone()
        .find(|p| p.name() == name)
        .or_else(|| path_params.find(|p| p.name().eq_ignore_ascii_case(name)))
}

fn method_sends_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| PayxError::InvalidRequest(format!("invalid value for header '{name}': {e}")))
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

/// Response cache key for a resolved URL.
///
/// Requests with a non-default `Accept` are keyed separately, since the
/// same path returns a different shape per media type.
fn cache_key(url: &Url, accept: &str) -> String {
    let mut key = path_and_query(url);
    if !accept.eq_ignore_ascii_case(DEFAULT_ACCEPT) {
        key.push('|');
        key.push_str(ACCEPT_HEADER);
        key.push('=');
        key.push_str(accept);
    }
    urlencoding::encode(&key).into_owned()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use payx_common::MockClock;
    use payx_domain::to_json_date;

    use super::*;

    fn builder() -> (RequestBuilder, MockClock) {
        let clock = MockClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let builder = RequestBuilder::new("https://api.paychex.test/v1", Arc::new(clock.clone())).unwrap();
        (builder, clock)
    }

    #[test]
    fn resolves_placeholders_and_defaults_accept() {
        let (builder, _) = builder();
        let request = builder
            .build(
                "companies/{companyId}/payperiods/{payperiodid}",
                Method::GET,
                &[Parameter::path("companyId", "C 1"), Parameter::path("payperiodid", "PP1")],
            )
            .unwrap();

        assert_eq!(request.url.as_str(), "https://api.paychex.test/v1/companies/C%201/payperiods/PP1");
        assert_eq!(request.accept(), "application/json");
        assert_eq!(request.correlation_id.len(), 32);
        assert_eq!(
            request.headers.get(CLIENT_CORRELATION_ID_HEADER).unwrap().to_str().unwrap(),
            request.correlation_id
        );
    }

    #[test]
    fn placeholder_without_parameter_is_caller_error() {
        let (builder, _) = builder();
        let err = builder.build("workers/{workerId}", Method::GET, &[]).unwrap_err();
        assert!(matches!(err, PayxError::InvalidRequest(msg) if msg.contains("{workerId}")));
    }

    #[test]
    fn placeholder_matches_case_insensitively() {
        let (builder, _) = builder();
        let request = builder
            .build("companies/{companyId}", Method::GET, &[Parameter::path("companyid", "9")])
            .unwrap();
        assert!(request.url.path().ends_with("/companies/9"));
    }

    #[test]
    fn correlation_id_is_fresh_per_build() {
        let (builder, _) = builder();
        let a = builder.build("companies", Method::GET, &[]).unwrap();
        let b = builder.build("companies", Method::GET, &[]).unwrap();
        assert_ne!(a.correlation_id, b.correlation_id);
    }

    #[test]
    fn explicit_accept_wins_and_changes_cache_key() {
        let (builder, _) = builder();
        let plain = builder.build("workers/{workerId}", Method::GET, &[Parameter::path("workerId", "W1")]).unwrap();
        let vendor = builder
            .build(
                "workers/{workerId}",
                Method::GET,
                &[
                    Parameter::path("workerId", "W1"),
                    Parameter::header("accept", "application/vnd.paychex.worker_communications.v1+json"),
                ],
            )
            .unwrap();

        assert_eq!(vendor.accept(), "application/vnd.paychex.worker_communications.v1+json");
        assert_eq!(vendor.headers.get_all(ACCEPT).iter().count(), 1);
        assert_ne!(plain.cache_key, vendor.cache_key);
        assert_eq!(plain.cache_key, urlencoding::encode("/v1/workers/W1"));
    }

    #[test]
    fn query_parameters_go_to_url_for_reads_and_form_for_writes() {
        let (builder, _) = builder();
        let params = [Parameter::query("offset", "0"), Parameter::query("limit", "5")];

        let read = builder.build("companies", Method::GET, &params).unwrap();
        assert_eq!(read.url.query(), Some("offset=0&limit=5"));
        assert_eq!(read.path_and_query(), "/v1/companies?offset=0&limit=5");
        assert!(read.form.is_empty());

        let write = builder.build("companies", Method::POST, &params).unwrap();
        assert_eq!(write.url.query(), None);
        assert_eq!(write.form, vec![("offset".into(), "0".into()), ("limit".into(), "5".into())]);
        assert!(!write.is_cacheable());
    }

    #[test]
    fn optional_parameters_evaluate_at_build_time() {
        let (builder, clock) = builder();
        let evaluations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evaluations);
        let params = [
            Parameter::optional("asOf", ParameterKind::Query, |_| true, move |ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                to_json_date(ctx.now)
            }),
            Parameter::when("status", ParameterKind::Query, false, |_| "ENTRY".into()),
        ];
        assert_eq!(evaluations.load(Ordering::SeqCst), 0);

        clock.advance(std::time::Duration::from_secs(60));
        let request = builder.build("companies", Method::GET, &params).unwrap();

        assert_eq!(evaluations.load(Ordering::SeqCst), 1);
        assert_eq!(request.url.query(), Some("asOf=2024-05-01T12%3A01%3A00Z"));
    }

    #[test]
    fn rejects_empty_parameter_name_and_bad_header() {
        let (builder, _) = builder();
        assert!(builder.build("companies", Method::GET, &[Parameter::query("", "x")]).is_err());
        assert!(builder.build("companies", Method::GET, &[Parameter::header("ETag", "a\nb")]).is_err());
    }
}
