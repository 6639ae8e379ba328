//! Type descriptors: a type name with an optional array suffix.
//!
//! `geometry_msgs/msg/Point` is a single message, `geometry_msgs/msg/Point[]`
//! a dynamic-length sequence and `geometry_msgs/msg/Point[4]` a fixed array.

use std::fmt;
use std::str::FromStr;

use super::error::DynamicError;
use super::schema::FieldType;

/// Largest `N` accepted in `T[N]`.
///
/// Fixed arrays are allocated in full when a message is instantiated.
pub const MAX_FIXED_ARRAY_LEN: usize = 65_536;

/// Array suffix of a type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArraySpec {
    #[default]
    Single,
    /// `T[]` (also written `T[0]`)
    Dynamic,
    /// `T[<=N]`
    Bounded(usize),
    /// `T[N]` with N > 0
    Fixed(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub base: String,
    pub array: ArraySpec,
}

impl TypeDescriptor {
    pub fn parse(descriptor: &str) -> Result<Self, DynamicError> {
        let invalid = || DynamicError::InvalidTypeDescriptor(descriptor.to_string());
        let descriptor_trimmed = descriptor.trim();

        let (base, array) = match descriptor_trimmed.split_once('[') {
            Some((base, suffix)) => {
                let inner = suffix.strip_suffix(']').ok_or_else(invalid)?;
                let array = if inner.is_empty() {
                    ArraySpec::Dynamic
                } else if let Some(bound) = inner.strip_prefix("<=") {
                    ArraySpec::Bounded(bound.parse().map_err(|_| invalid())?)
                } else {
                    match inner.parse::<usize>().map_err(|_| invalid())? {
                        0 => ArraySpec::Dynamic,
                        n if n > MAX_FIXED_ARRAY_LEN => return Err(invalid()),
                        n => ArraySpec::Fixed(n),
                    }
                };
                (base, array)
            }
            None => (descriptor_trimmed, ArraySpec::Single),
        };

        if base.is_empty() || base.contains(']') {
            return Err(invalid());
        }
        Ok(Self {
            base: base.to_string(),
            array,
        })
    }

    /// Wrap a resolved base type according to the array suffix.
    pub fn wrap(&self, base: FieldType) -> FieldType {
        match self.array {
            ArraySpec::Single => base,
            ArraySpec::Dynamic => FieldType::Sequence(Box::new(base)),
            ArraySpec::Bounded(n) => FieldType::BoundedSequence(Box::new(base), n),
            ArraySpec::Fixed(n) => FieldType::Array(Box::new(base), n),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = DynamicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.array {
            ArraySpec::Single => write!(f, "{}", self.base),
            ArraySpec::Dynamic => write!(f, "{}[]", self.base),
            ArraySpec::Bounded(n) => write!(f, "{}[<={}]", self.base, n),
            ArraySpec::Fixed(n) => write!(f, "{}[{}]", self.base, n),
        }
    }
}
