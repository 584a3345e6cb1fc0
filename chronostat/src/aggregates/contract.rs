//! Capability traits shared by every aggregate value.
//!
//! Aggregates are immutable value objects that can be validated, deep-copied,
//! merged, and round-tripped through a restricted dictionary representation.
//! The capabilities are deliberately independent traits composed per concrete
//! type rather than a linear inheritance chain: a type opts into exactly the
//! contracts it supports.

use serde_json::Value;

use crate::errors::Result;

/// Structural invariant check, called before any risky operation.
///
/// A failure here means the value is corrupted or was constructed outside the
/// documented constructors; it is never a recoverable runtime condition.
pub trait SelfConsistent {
    /// Verifies shape, version, and ordering invariants of this value.
    fn self_consistent(&self) -> Result<()>;
}

/// Values that can be merged with a same-typed, same-configuration value to
/// represent combined coverage and data.
///
/// The merge protocol is fixed: `union` validates both operands, checks
/// compatibility, then delegates to the raw [`Unionable::combine`]. Because
/// every implementation deep-copies its numeric buffers, merge order never
/// affects the result and merged values share no storage with their inputs.
pub trait Unionable: SelfConsistent + Clone {
    /// Checks type, version, and configuration compatibility with `other`.
    fn compatible_with(&self, other: &Self) -> Result<()>;

    /// Merges two operands without any precondition checks.
    ///
    /// Callers should prefer [`Unionable::union`]; this is the raw
    /// combination step used after validation has already passed.
    fn combine(&self, other: &Self) -> Result<Self>;

    /// Validates both operands, checks compatibility, then combines them.
    fn union(&self, other: &Self) -> Result<Self> {
        self.self_consistent()?;
        other.self_consistent()?;
        self.compatible_with(other)?;
        self.combine(other)
    }

    /// Validates this value, then returns a deep copy of it.
    fn checked_clone(&self) -> Result<Self> {
        self.self_consistent()?;
        Ok(self.clone())
    }
}

/// Values that can be represented as a tagged dictionary tree.
///
/// The dictionary leaves are restricted to text, 64-bit integers, 64-bit
/// floats, homogeneous numeric arrays, and nested maps of the same shape, so
/// that any aggregate can be persisted through a hierarchical key/array
/// store. Every encoded value carries its producing type's tag and schema
/// version; decoding of an unknown tag is dispatched through the registry in
/// [`crate::aggregates::registry`].
pub trait DictSerializable: Sized {
    /// Type tag written into every encoded dictionary under the `class` key.
    const CLASS_TAG: &'static str;

    /// Encodes this value as a tagged dictionary tree.
    fn to_dict(&self) -> Value;

    /// Decodes a value previously produced by [`DictSerializable::to_dict`].
    ///
    /// The round trip is exact: `from_dict(to_dict(x)) == x`.
    fn from_dict(d: &Value) -> Result<Self>;
}
