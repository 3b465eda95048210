use std::any::{type_name, Any};

use crate::descriptor::{Erased, TypeDescriptor};
use crate::{Error, Result};

/// Read-only view of a value, one level deep.
///
/// Composite views hand out their children as `&dyn Reflect` so the encoder
/// can recurse without knowing concrete types.
#[derive(Clone)]
pub enum Peek<'a> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    F32(f32),
    F64(f64),
    Str(&'a str),
    /// Elements in index order.
    Sequence(Vec<&'a dyn Reflect>),
    /// Field values in declaration order.
    Record(Vec<&'a dyn Reflect>),
}

impl Peek<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Peek::Null => "null",
            Peek::Bool(_) => "boolean",
            Peek::Int(_) | Peek::UInt(_) => "integer",
            Peek::F32(_) | Peek::F64(_) => "floating-point number",
            Peek::Str(_) => "string",
            Peek::Sequence(_) => "sequence",
            Peek::Record(_) => "record",
        }
    }
}

impl std::fmt::Debug for Peek<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Peek::Null => f.write_str("Null"),
            Peek::Bool(b) => write!(f, "Bool({b})"),
            Peek::Int(i) => write!(f, "Int({i})"),
            Peek::UInt(u) => write!(f, "UInt({u})"),
            Peek::F32(v) => write!(f, "F32({v})"),
            Peek::F64(v) => write!(f, "F64({v})"),
            Peek::Str(s) => write!(f, "Str({s:?})"),
            Peek::Sequence(items) => write!(f, "Sequence(len = {})", items.len()),
            Peek::Record(fields) => write!(f, "Record(fields = {})", fields.len()),
        }
    }
}

/// Object-safe half of the reflection contract: exposes a value's current
/// shape to the encoder.
pub trait Reflect: Any + Send + Sync {
    fn peek(&self) -> Peek<'_>;
}

/// Static half of the reflection contract: how a type is described and how
/// a decoded, type-erased value is turned back into `Self`.
///
/// Structs normally get this through [`reflect_record!`](crate::reflect_record).
pub trait Describe: Reflect + Sized {
    /// Whether JSON `null` is a valid value of this type.
    const NULLABLE: bool = false;

    /// Builds the descriptor. Called once per type; use
    /// [`describe`](crate::describe) to get the cached copy.
    fn describe() -> Result<TypeDescriptor>;

    /// Recovers `Self` from the value the decoder produced for this type's
    /// descriptor.
    fn from_erased(value: Erased) -> Result<Self> {
        downcast(value)
    }
}

pub(crate) fn downcast<T: Any>(value: Erased) -> Result<T> {
    value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
        Error::type_mismatch(type_name::<T>(), "a value decoded for another type")
    })
}
