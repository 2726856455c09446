//! Generic response envelope returned by every resource

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ETAG_HEADER, LIMIT_PARAM, OFFSET_PARAM};
use crate::types::parameter::Parameter;

/// Wrapper carrying content, errors and metadata for one API call.
///
/// `correlation_id` and `transaction_id` are filled in from response
/// headers after decoding; the server never sends them in the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub content: Vec<T>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(rename = "correlationId", default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(rename = "transactionId", default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            errors: Vec::new(),
            metadata: Metadata::default(),
            correlation_id: None,
            transaction_id: None,
        }
    }
}

impl<T> Envelope<T> {
    /// Envelope holding a single error, used when the transport failed.
    #[must_use]
    pub fn from_error(error: ApiError) -> Self {
        Self { errors: vec![error], ..Self::default() }
    }

    /// Success means no errors are present.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Pagination block, if the server returned one.
    #[must_use]
    pub fn pagination(&self) -> Option<&Pagination> {
        self.metadata.pagination.as_ref()
    }

    /// Request pagination for the page after this one.
    ///
    /// `None` when the response was not paged, the last page came back
    /// short of the limit, or the next offset does not fit in a `u32`.
    #[must_use]
    pub fn next_page(&self) -> Option<Pagination> {
        let current = self.pagination()?;
        let limit = current.limit.filter(|l| *l > 0)?;
        if self.content.len() < usize::try_from(limit).unwrap_or(usize::MAX) {
            return None;
        }
        let offset = current.offset.unwrap_or(0).checked_add(limit)?;
        Some(Pagination {
            offset: Some(offset),
            limit: Some(limit),
            item_count: 0,
            etag: current.etag.clone(),
        })
    }
}

/// Item count plus optional paging block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "ContentItemCount", default)]
    pub content_item_count: u64,
    #[serde(rename = "Pagination", default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Paging state, sent with requests and echoed back in responses.
///
/// The ETag is an opaque continuation token; on responses it is always
/// taken from the `ETag` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(rename = "Offset", default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(rename = "Limit", default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "ItemCount", default)]
    pub item_count: u64,
    #[serde(rename = "ETag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl Pagination {
    /// First page with the given size.
    #[must_use]
    pub fn first(limit: u32) -> Self {
        Self { offset: Some(0), limit: Some(limit), ..Self::default() }
    }

    /// Parameters that request this page.
    ///
    /// Nothing is sent without a limit.
    #[must_use]
    pub fn page_parameters(&self) -> Vec<Parameter> {
        let Some(limit) = self.limit else {
            return Vec::new();
        };

        let mut params = Vec::with_capacity(3);
        if let Some(offset) = self.offset {
            params.push(Parameter::query(OFFSET_PARAM, offset.to_string()));
        }
        params.push(Parameter::query(LIMIT_PARAM, limit.to_string()));
        if let Some(etag) = self.etag.as_deref().filter(|e| !e.is_empty()) {
            params.push(Parameter::header(ETAG_HEADER, etag));
        }
        params
    }
}

impl fmt::Display for Pagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "itemCount {}, offset {:?}, limit {:?}", self.item_count, self.offset, self.limit)
    }
}

/// One structured error from the envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Stamped from the `X-payx-txid` header, never read from the body.
    #[serde(rename = "transactionId", default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl ApiError {
    /// Error describing a failure below the HTTP layer.
    pub fn transport(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: Some(kind.into()),
            error_description: Some(message.into()),
            ..Self::default()
        }
    }

    /// `error_description`, falling back to `description`.
    #[must_use]
    pub fn effective_description(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.description.as_deref().filter(|s| !s.is_empty()))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Api Error: ")?;
        let mut wrote_detail = false;
        if let Some(code) = self.code.as_deref().filter(|s| !s.is_empty()) {
            f.write_str(code)?;
            wrote_detail = true;
        }
        if let Some(description) = self.effective_description() {
            write!(f, "\t{description}")?;
            wrote_detail = true;
        }
        if let Some(resolution) = self.resolution.as_deref().filter(|s| !s.is_empty()) {
            write!(f, "\nResolution: {resolution}")?;
            wrote_detail = true;
        }
        if !wrote_detail {
            if let Some(error) = &self.error {
                f.write_str(error)?;
            }
        }
        if let Some(txid) = &self.transaction_id {
            write!(f, "\nPaychex TxId: {txid}")?;
        }
        Ok(())
    }
}
