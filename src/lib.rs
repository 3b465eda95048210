//! Descriptor-driven JSON encoding and decoding.
//!
//! Types opt in through [`Describe`] (usually via [`reflect_record!`]); the
//! crate derives a [`TypeDescriptor`] once per type and walks it to produce or
//! consume compact JSON. A [`Codec`] spreads the walk over a worker pool while
//! keeping declaration order; the free functions here walk on the calling
//! thread and produce the same text.

pub mod codec;
pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod error;
pub mod num;
pub mod options;
pub mod parallel;
pub mod primitive;
pub mod text;
pub mod value;

pub use crate::codec::{Codec, Pending};
pub use crate::decode::{parse, parse_with_depth};
pub use crate::descriptor::{describe, validate, Describe, Peek, Reflect, TypeDescriptor};
pub use crate::error::{Error, ErrorKind, Location, Path, PathSegment};
pub use crate::options::{CodecConfig, PoolSize};
pub use crate::parallel::{CancelToken, WorkerPool};
pub use crate::value::{Number, Value};

use crate::parallel::{Context, Scope};

pub type Result<T> = std::result::Result<T, Error>;

/// Encodes on the calling thread, which needs a stack deep enough for the
/// value's nesting (see [`parallel::WORKER_STACK_SIZE`]). Values nested more
/// than the default `maxDepth` are rejected.
pub fn to_string<T: Describe>(value: &T) -> Result<String> {
    to_string_with(value, describe::<T>()?)
}

/// Encodes against an explicitly supplied descriptor.
pub fn to_string_with(value: &dyn Reflect, descriptor: &TypeDescriptor) -> Result<String> {
    let scope = Scope::unbounded();
    encode::encode_root(&Context::sequential(&scope), value, descriptor)
}

pub fn from_str<T: Describe>(input: &str) -> Result<T> {
    let value = parse(input)?;
    from_value(&value)
}

/// Like [`from_str`]; invalid UTF-8 is reported as a parse error at the
/// first bad byte.
pub fn from_slice<T: Describe>(input: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(input).map_err(|err| {
        let valid = err.valid_up_to();
        let prefix = std::str::from_utf8(&input[..valid]).unwrap_or_default();
        Error::parse(prefix, valid, "valid UTF-8")
    })?;
    from_str(text)
}

pub fn from_value<T: Describe>(value: &Value) -> Result<T> {
    let descriptor = describe::<T>()?;
    let scope = Scope::unbounded();
    let erased = decode::decode_node(&Context::sequential(&scope), value, descriptor)?;
    T::from_erased(erased)
}
