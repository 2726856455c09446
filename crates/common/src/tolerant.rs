//! Forward-compatible enum decoding
//!
//! The upstream API adds enum members over time. A field carrying a value
//! this client does not know about must not fail the whole response, so
//! every enum decoded from the wire goes through [`TolerantEnum::decode`]:
//!
//! 1. strings match a declared wire name ignoring ASCII case, then again with `-` read as `_`
//! 2. integers match a declared ordinal (position in [`TolerantEnum::VARIANTS`])
//! 3. anything else resolves to [`TolerantEnum::FALLBACK`] (or `None` for nullable fields)
//!    and yields an [`UnknownEnumValue`] warning
//!
//! Use [`tolerant_enum!`](crate::tolerant_enum) to declare such enums.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// An enum whose wire representation is decoded tolerantly.
pub trait TolerantEnum: Sized + Copy + PartialEq + 'static {
    /// Type name reported in warnings.
    const TYPE_NAME: &'static str;

    /// Declared members and their wire names, in ordinal order.
    const VARIANTS: &'static [(&'static str, Self)];

    /// Member substituted for unrecognized values in non-nullable fields.
    const FALLBACK: Self;

    /// Wire name of this member.
    fn wire_name(self) -> &'static str;

    /// Match a wire string, ignoring case and treating `-` as `_`.
    fn from_wire(text: &str) -> Option<Self> {
        let exact = Self::VARIANTS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(text))
            .map(|(_, value)| *value);

        exact.or_else(|| {
            let normalized = text.replace('-', "_");
            Self::VARIANTS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&normalized))
                .map(|(_, value)| *value)
        })
    }

    /// Match a declared ordinal.
    fn from_ordinal(ordinal: i64) -> Option<Self> {
        usize::try_from(ordinal).ok().and_then(|idx| Self::VARIANTS.get(idx)).map(|(_, v)| *v)
    }

    /// Decode a raw JSON value.
    ///
    /// Null and empty strings are treated as absent and produce no warning.
    fn decode(raw: &Value) -> EnumDecode<Self> {
        let matched = match raw {
            Value::Null => return EnumDecode::absent(),
            Value::String(text) if text.is_empty() => return EnumDecode::absent(),
            Value::String(text) => Self::from_wire(text),
            Value::Number(number) => number.as_i64().and_then(Self::from_ordinal),
            _ => None,
        };

        match matched {
            Some(value) => EnumDecode { value: Some(value), warning: None },
            None => EnumDecode {
                value: None,
                warning: Some(UnknownEnumValue { type_name: Self::TYPE_NAME, raw: raw_text(raw) }),
            },
        }
    }
}

/// Outcome of decoding one enum field.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecode<E> {
    /// Matched member, if any.
    pub value: Option<E>,
    /// Set when the wire value was present but not recognized.
    pub warning: Option<UnknownEnumValue>,
}

impl<E: TolerantEnum> EnumDecode<E> {
    const fn absent() -> Self {
        Self { value: None, warning: None }
    }

    /// Value for a non-nullable field.
    #[must_use]
    pub fn or_fallback(self) -> E {
        self.value.unwrap_or(E::FALLBACK)
    }

    /// Value for a nullable field.
    #[must_use]
    pub fn nullable(self) -> Option<E> {
        self.value
    }

    /// Log the warning, if any, and return `self`.
    #[must_use]
    pub fn reported(self) -> Self {
        #[cfg(feature = "observability")]
        if let Some(warning) = &self.warning {
            tracing::warn!(
                enum_type = warning.type_name,
                raw_value = %warning.raw,
                "unrecognized enum value, using fallback"
            );
        }
        self
    }
}

/// Warning event for a value that matched no declared member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEnumValue {
    /// Enum type that was being decoded.
    pub type_name: &'static str,
    /// The wire value as received.
    pub raw: String,
}

impl fmt::Display for UnknownEnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Received value {} while attempting to deserialize an enum of type {}",
            self.raw, self.type_name
        )
    }
}

fn raw_text(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Tolerant `Deserialize` body for non-nullable enum fields.
///
/// # Errors
///
/// Only fails when the input is not valid JSON at this position.
pub fn deserialize<'de, D, E>(deserializer: D) -> Result<E, D::Error>
where
    D: Deserializer<'de>,
    E: TolerantEnum,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(E::decode(&raw).reported().or_fallback())
}

/// `deserialize_with` helper for `Option<E>` fields.
///
/// Unknown values become `None` instead of the fallback member. Pair it with
/// `#[serde(default)]` so a missing field also reads as `None`.
///
/// # Errors
///
/// Only fails when the input is not valid JSON at this position.
pub fn nullable<'de, D, E>(deserializer: D) -> Result<Option<E>, D::Error>
where
    D: Deserializer<'de>,
    E: TolerantEnum,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(E::decode(&raw).reported().nullable())
}

/// Declare an enum decoded through [`TolerantEnum`].
///
/// Generates the enum, its [`TolerantEnum`] impl, `Display`, a `Serialize`
/// impl writing the wire name and a tolerant `Deserialize` impl.
///
/// # Example
///
/// ```
/// use payx_common::tolerant_enum;
///
/// tolerant_enum! {
///     /// How often a company runs payroll.
///     pub enum Frequency (fallback = Unknown) {
///         Unknown => "UNKNOWN",
///         Weekly => "WEEKLY",
///         BiWeekly => "BI_WEEKLY",
///     }
/// }
///
/// let parsed: Frequency = serde_json::from_str("\"bi-weekly\"").unwrap();
/// assert_eq!(parsed, Frequency::BiWeekly);
///
/// let unknown: Frequency = serde_json::from_str("\"FORTNIGHTLY\"").unwrap();
/// assert_eq!(unknown, Frequency::Unknown);
/// ```
#[macro_export]
macro_rules! tolerant_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident (fallback = $fallback:ident) {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::tolerant::TolerantEnum for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const VARIANTS: &'static [(&'static str, Self)] = &[ $( ($wire, Self::$variant) ),+ ];
            const FALLBACK: Self = Self::$fallback;

            fn wire_name(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire ),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str($crate::tolerant::TolerantEnum::wire_name(*self))
            }
        }

        impl $crate::__serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__serde::Serializer,
            {
                serializer.serialize_str($crate::tolerant::TolerantEnum::wire_name(*self))
            }
        }

        impl<'de> $crate::__serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: $crate::__serde::Deserializer<'de>,
            {
                $crate::tolerant::deserialize(deserializer)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    //! Unit tests for tolerant enum decoding.
    //!
    //! Covers case folding, hyphen normalisation, ordinals, and the
    //! fallback/nullable split for unrecognized values.

    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    crate::tolerant_enum! {
        enum Interval (fallback = Unset) {
            Unset => "NONE",
            Annual => "ANNUAL",
            BiWeekly => "BI_WEEKLY",
            SemiMonthly => "SEMI_MONTHLY",
        }
    }

    crate::tolerant_enum! {
        enum Status (fallback = Unknown) {
            Active => "ACTIVE",
            Unknown => "UNKNOWN",
        }
    }

    #[derive(Deserialize)]
    struct Record {
        interval: Interval,
        #[serde(default, deserialize_with = "nullable")]
        status: Option<Status>,
    }

    #[test]
    fn test_case_insensitive_match() {
        assert_eq!(Interval::decode(&json!("annual")).value, Some(Interval::Annual));
        assert_eq!(Interval::decode(&json!("Semi_Monthly")).value, Some(Interval::SemiMonthly));
    }

    #[test]
    fn test_hyphen_read_as_underscore() {
        let decoded = Interval::decode(&json!("bi-weekly"));
        assert_eq!(decoded.value, Some(Interval::BiWeekly));
        assert!(decoded.warning.is_none());
    }

    #[test]
    fn test_declared_ordinal_matches() {
        assert_eq!(Interval::decode(&json!(1)).value, Some(Interval::Annual));
    }

    #[test]
    fn test_out_of_range_ordinal_falls_back_with_warning() {
        let decoded = Interval::decode(&json!(42));
        assert_eq!(decoded.value, None);
        let warning = decoded.warning.clone().unwrap();
        assert_eq!(warning.type_name, "Interval");
        assert_eq!(warning.raw, "42");
        assert_eq!(decoded.or_fallback(), Interval::Unset);
    }

    #[test]
    fn test_unknown_string_uses_declared_fallback() {
        let decoded = Status::decode(&json!("ON_LEAVE"));
        assert_eq!(decoded.warning.as_ref().map(|w| w.raw.as_str()), Some("ON_LEAVE"));
        assert_eq!(decoded.or_fallback(), Status::Unknown);
    }

    #[test]
    fn test_empty_and_null_are_silent() {
        assert!(Status::decode(&json!("")).warning.is_none());
        assert!(Status::decode(&Value::Null).warning.is_none());
        assert_eq!(Status::decode(&Value::Null).or_fallback(), Status::Unknown);
    }

    #[test]
    fn test_serde_field_decoding() {
        let record: Record =
            serde_json::from_value(json!({ "interval": "QUARTERLY", "status": "ON_LEAVE" })).unwrap();
        assert_eq!(record.interval, Interval::Unset);
        assert_eq!(record.status, None);

        let record: Record =
            serde_json::from_value(json!({ "interval": "annual", "status": "active" })).unwrap();
        assert_eq!(record.interval, Interval::Annual);
        assert_eq!(record.status, Some(Status::Active));

        let record: Record = serde_json::from_value(json!({ "interval": 3 })).unwrap();
        assert_eq!(record.interval, Interval::SemiMonthly);
        assert_eq!(record.status, None);
    }

    #[test]
    fn test_serialize_writes_wire_name() {
        assert_eq!(serde_json::to_value(Interval::BiWeekly).unwrap(), json!("BI_WEEKLY"));
        assert_eq!(Interval::BiWeekly.to_string(), "BI_WEEKLY");
    }

    #[test]
    fn test_warning_display() {
        let warning = UnknownEnumValue { type_name: "Status", raw: "X".into() };
        assert_eq!(
            warning.to_string(),
            "Received value X while attempting to deserialize an enum of type Status"
        );
    }
}
