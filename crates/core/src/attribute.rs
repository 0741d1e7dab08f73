//! Attribute handles: name, data type, optional qualifying table.

use core::cmp::Ordering;
use core::fmt;

use crate::value::StrHandle;

/// The data type an [`Attribute`] carries, used to reject cross-type
/// comparisons at rule-construction time rather than at tick time.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Float,
    String,
}

/// An attribute: a name, a data type, and an optional qualifying table.
///
/// Two attributes are equal iff their qualified key (`table.name`, or just
/// `name` when unqualified) matches -- the data type is not part of
/// equality, matching the record-as-map-key identity used throughout
/// (`Record`, hierarchy ids, partition ids) in the original implementation.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Attribute {
    name: StrHandle,
    data_type: DataType,
    table: Option<StrHandle>,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<alloc::string::String>, data_type: DataType) -> Self {
        Self {
            name: StrHandle::new(name.into()),
            data_type,
            table: None,
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<alloc::string::String>) -> Self {
        self.table = Some(StrHandle::new(table.into()));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_ref().map(StrHandle::as_str)
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.name == other.name
    }
}
impl Eq for Attribute {}

impl PartialOrd for Attribute {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Attribute {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.table, &self.name).cmp(&(&other.table, &other.name))
    }
}

impl core::hash::Hash for Attribute {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            write!(f, "{}.{}", table.as_str(), self.name.as_str())
        } else {
            write!(f, "{}", self.name.as_str())
        }
    }
}
