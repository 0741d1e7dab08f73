//! Scalar values carried by records and interval bounds.

use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;

/// A scalar value: integer, float, or string.
///
/// Comparisons between values of different variants are defined by a fixed
/// type ordering (`Int < Float < Str`) so that `Value` can sit in an
/// ordered map key (record identity, partition ids) without panicking;
/// callers that mix types within one attribute's domain get a consistency
/// error at rule-construction time instead (see [`crate::error::Error`]).
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(OrdF64),
    Str(StrHandle),
}

/// `f64` with a total order (NaN sorts after everything, equal to itself).
///
/// Hand-rolled rather than a dependency on `ordered-float`, which is not
/// part of the workspace's dependency set.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct OrdF64(pub f64);

impl PartialEq for OrdF64 {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or_else(|| {
            match (self.0.is_nan(), other.0.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => Ordering::Equal,
            }
        })
    }
}

impl fmt::Display for OrdF64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interned-by-value string handle.
///
/// Records and formulas clone `Value`s freely (hierarchy ids, partition
/// keys, rule-synthesized formulas); a plain `String` would make that
/// expensive for string-typed attributes. `alloc::rc::Rc<str>` keeps clone
/// cheap without pulling in an interning crate not present in the pack.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct StrHandle(pub alloc::rc::Rc<str>);

impl StrHandle {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(alloc::rc::Rc::from(s.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for StrHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for StrHandle {}

impl PartialOrd for StrHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for StrHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.as_ref().cmp(other.0.as_ref())
    }
}

impl core::hash::Hash for StrHandle {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state);
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

const fn rank(v: &Value) -> u8 {
    match v {
        Value::Int(_) => 0,
        Value::Float(_) => 1,
        Value::Str(_) => 2,
    }
}

impl core::hash::Hash for Value {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.0.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{}", s.as_str()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(OrdF64(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(StrHandle::new(v))
    }
}
