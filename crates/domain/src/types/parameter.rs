//! Request parameter model
//!
//! A [`Parameter`] is a name, a placement and a value. Optional parameters
//! carry an inclusion predicate and a value function instead of a value;
//! both run when the request is built, never at construction time.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Where a parameter is placed on the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Substituted into a `{name}` placeholder of the resource template.
    Path,
    /// Query string for reads, form body for writes.
    Query,
    Header,
}

/// State available to deferred parameters at build time.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext {
    pub now: DateTime<Utc>,
}

type IncludeFn = Arc<dyn Fn(&BuildContext) -> bool + Send + Sync>;
type ValueFn = Arc<dyn Fn(&BuildContext) -> String + Send + Sync>;

/// Parameter value: concrete, or computed only if the predicate holds.
#[derive(Clone)]
pub enum ParameterValue {
    Value(String),
    Deferred { include: IncludeFn, value: ValueFn },
}

impl fmt::Debug for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Deferred { .. } => f.write_str("Deferred"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    value: ParameterValue,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind, value: impl Into<String>) -> Self {
        Self { name: name.into(), kind, value: ParameterValue::Value(value.into()) }
    }

    pub fn path(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Path, value)
    }

    pub fn query(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Query, value)
    }

    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Header, value)
    }

    /// Parameter attached only when `include` holds at build time.
    ///
    /// `value` is not called unless the parameter is included.
    pub fn optional<I, V>(name: impl Into<String>, kind: ParameterKind, include: I, value: V) -> Self
    where
        I: Fn(&BuildContext) -> bool + Send + Sync + 'static,
        V: Fn(&BuildContext) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            value: ParameterValue::Deferred { include: Arc::new(include), value: Arc::new(value) },
        }
    }

    /// Optional parameter gated on a value known up front.
    pub fn when<V>(name: impl Into<String>, kind: ParameterKind, condition: bool, value: V) -> Self
    where
        V: Fn(&BuildContext) -> String + Send + Sync + 'static,
    {
        Self::optional(name, kind, move |_| condition, value)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ParameterKind {
        self.kind
    }

    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self.value, ParameterValue::Deferred { .. })
    }

    /// Evaluate the parameter, returning `None` when it is excluded.
    #[must_use]
    pub fn resolve(&self, ctx: &BuildContext) -> Option<Cow<'_, str>> {
        match &self.value {
            ParameterValue::Value(value) => Some(Cow::Borrowed(value.as_str())),
            ParameterValue::Deferred { include, value } => {
                include(ctx).then(|| Cow::Owned(value(ctx)))
            }
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ParameterValue::Value(value) => write!(f, "{}={value} ({:?})", self.name, self.kind),
            ParameterValue::Deferred { .. } => write!(f, "{}=<deferred> ({:?})", self.name, self.kind),
        }
    }
}
