//! Response decoder
//!
//! Decodes envelopes strictly until the first payload carrying a member the
//! models do not declare. From then on the decoder stays lenient for the
//! life of the client, since upstream schema additions are permanent.

use std::fmt;
use std::sync::OnceLock;

use payx_domain::{Envelope, PayxError, Result};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Record of the payload that moved the decoder to lenient mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LenientSwitch {
    /// Paths of the undeclared members, e.g. `content.0.addedLater`.
    pub unknown_members: Vec<String>,
}

impl fmt::Display for LenientSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown members: {}", self.unknown_members.join(", "))
    }
}

#[derive(Debug, Default)]
pub struct ResponseDecoder {
    switch: OnceLock<LenientSwitch>,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether unknown members are already being ignored.
    pub fn is_lenient(&self) -> bool {
        self.switch.get().is_some()
    }

    /// Why the decoder went lenient; `None` while still strict.
    pub fn lenient_switch(&self) -> Option<&LenientSwitch> {
        self.switch.get()
    }

    /// Decode `body`, retrying once leniently on unknown members.
    ///
    /// # Errors
    ///
    /// Returns [`PayxError::Decode`] with the raw body for malformed JSON,
    /// an empty body or a type mismatch.
    pub fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<Envelope<T>> {
        if self.is_lenient() {
            return decode_lenient(body);
        }

        let mut unknown = Vec::new();
        let mut deserializer = serde_json::Deserializer::from_str(body);
        let strict: std::result::Result<Envelope<T>, _> =
            serde_ignored::deserialize(&mut deserializer, |path| unknown.push(path.to_string()));

        match strict.and_then(|envelope| deserializer.end().map(|()| envelope)) {
            Ok(envelope) if unknown.is_empty() => Ok(envelope),
            Ok(_) => {
                warn!(
                    unknown_members = ?unknown,
                    "response contains unknown members, switching decoder to lenient mode"
                );
                let _ = self.switch.set(LenientSwitch { unknown_members: unknown });
                decode_lenient(body)
            }
            Err(err) => Err(decode_error(&err, body)),
        }
    }

    /// Best-effort decode of a non-success body.
    ///
    /// Never switches the decoder mode; `None` when the body is not an
    /// envelope.
    pub fn decode_error_body<T: DeserializeOwned>(&self, body: &str) -> Option<Envelope<T>> {
        serde_json::from_str(body).ok()
    }
}

fn decode_lenient<T: DeserializeOwned>(body: &str) -> Result<Envelope<T>> {
    serde_json::from_str(body).map_err(|err| decode_error(&err, body))
}

fn decode_error(err: &serde_json::Error, body: &str) -> PayxError {
    PayxError::Decode { message: err.to_string(), raw: body.to_string() }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Item {
        item_id: String,
    }

    #[test]
    fn strict_decode_of_known_shape_stays_strict() {
        let decoder = ResponseDecoder::new();
        let envelope: Envelope<Item> = decoder
            .decode(r#"{"content":[{"itemId":"1"}],"metadata":{"ContentItemCount":1}}"#)
            .unwrap();

        assert_eq!(envelope.content, vec![Item { item_id: "1".into() }]);
        assert!(!decoder.is_lenient());
    }

    #[test]
    fn unknown_member_switches_to_lenient_and_drops_field() {
        let decoder = ResponseDecoder::new();
        let envelope: Envelope<Item> =
            decoder.decode(r#"{"content":[{"itemId":"1","addedLater":true}]}"#).unwrap();

        assert_eq!(envelope.content[0].item_id, "1");
        let switch = decoder.lenient_switch().unwrap();
        assert_eq!(switch.unknown_members.len(), 1);
        assert!(switch.unknown_members[0].ends_with("addedLater"));

        let again: Envelope<Item> = decoder.decode(r#"{"content":[{"itemId":"2","other":1}]}"#).unwrap();
        assert_eq!(again.content[0].item_id, "2");
        assert_eq!(decoder.lenient_switch(), Some(switch), "first switch is kept");
    }

    #[test]
    fn unknown_top_level_member_is_tolerated() {
        let decoder = ResponseDecoder::new();
        let envelope: Envelope<Item> = decoder.decode(r#"{"content":[],"links":[]}"#).unwrap();
        assert!(envelope.content.is_empty());
        assert_eq!(decoder.lenient_switch().unwrap().unknown_members, vec!["links".to_string()]);
    }

    #[test]
    fn malformed_json_is_fatal_with_raw_body() {
        let decoder = ResponseDecoder::new();
        let err = decoder.decode::<Item>(r#"{"content":[{"itemId":"1"}"#).unwrap_err();

        match err {
            PayxError::Decode { raw, .. } => assert_eq!(raw, r#"{"content":[{"itemId":"1"}"#),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert!(!decoder.is_lenient());
    }

    #[test]
    fn type_mismatch_is_fatal_even_when_lenient() {
        let decoder = ResponseDecoder::new();
        let _: Envelope<Item> = decoder.decode(r#"{"content":[],"extra":1}"#).unwrap();
        assert!(decoder.is_lenient());

        let err = decoder.decode::<Item>(r#"{"content":[{"itemId":5}]}"#).unwrap_err();
        assert!(matches!(err, PayxError::Decode { .. }));
    }

    #[test]
    fn empty_body_is_decode_error() {
        let decoder = ResponseDecoder::new();
        let err = decoder.decode::<Item>("  ").unwrap_err();

        match err {
            PayxError::Decode { raw, .. } => assert_eq!(raw, "  "),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert!(decoder.lenient_switch().is_none());
    }

    #[test]
    fn error_body_decode_never_flips_mode() {
        let decoder = ResponseDecoder::new();
        let envelope: Option<Envelope<Item>> =
            decoder.decode_error_body(r#"{"errors":[{"code":"E1","extra":"x"}]}"#);

        assert_eq!(envelope.unwrap().errors[0].code.as_deref(), Some("E1"));
        assert!(decoder.decode_error_body::<Item>("<html>").is_none());
        assert!(!decoder.is_lenient());
    }
}
