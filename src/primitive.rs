//! Primitive values to and from JSON literals.

use crate::descriptor::{Erased, Peek, PrimitiveKind};
use crate::num::number::{
    format_f32, format_f64, format_i64, format_u64, parse_float, parse_integer, NumberError,
};
use crate::text::string::write_quoted;
use crate::value::{Number, Value};
use crate::{Error, Result};

/// Appends the JSON literal for `peek` interpreted as `kind`.
pub fn encode_primitive(peek: &Peek<'_>, kind: PrimitiveKind, out: &mut String) -> Result<()> {
    match (kind, peek) {
        (PrimitiveKind::Bool, Peek::Bool(b)) => {
            out.push_str(if *b { "true" } else { "false" });
        }
        (PrimitiveKind::String, Peek::Str(s)) => write_quoted(out, s),
        (PrimitiveKind::F64, Peek::F64(v)) => {
            ensure_finite(v.is_finite(), kind, peek)?;
            out.push_str(&format_f64(*v));
        }
        (PrimitiveKind::F64 | PrimitiveKind::F32, Peek::F32(v)) => {
            ensure_finite(v.is_finite(), kind, peek)?;
            out.push_str(&format_f32(*v));
        }
        (_, Peek::Int(v)) if is_integer_kind(kind) => {
            if !integer_fits(kind, i128::from(*v)) {
                return Err(Error::out_of_range(kind.name(), v.to_string()));
            }
            format_i64(*v, out);
        }
        (_, Peek::UInt(v)) if is_integer_kind(kind) => {
            if !integer_fits(kind, i128::from(*v)) {
                return Err(Error::out_of_range(kind.name(), v.to_string()));
            }
            format_u64(*v, out);
        }
        _ => return Err(Error::type_mismatch(kind.name(), peek.kind_name())),
    }
    Ok(())
}

fn ensure_finite(finite: bool, kind: PrimitiveKind, peek: &Peek<'_>) -> Result<()> {
    if finite {
        return Ok(());
    }
    let found = match peek {
        Peek::F32(v) => v.to_string(),
        Peek::F64(v) => v.to_string(),
        other => other.kind_name().to_string(),
    };
    Err(Error::type_mismatch(format!("finite {}", kind.name()), found))
}

fn is_integer_kind(kind: PrimitiveKind) -> bool {
    matches!(kind.category(), crate::descriptor::Category::Integer)
}

fn integer_fits(kind: PrimitiveKind, value: i128) -> bool {
    match kind {
        PrimitiveKind::I8 => i8::try_from(value).is_ok(),
        PrimitiveKind::I16 => i16::try_from(value).is_ok(),
        PrimitiveKind::I32 => i32::try_from(value).is_ok(),
        PrimitiveKind::I64 => i64::try_from(value).is_ok(),
        PrimitiveKind::U8 => u8::try_from(value).is_ok(),
        PrimitiveKind::U16 => u16::try_from(value).is_ok(),
        PrimitiveKind::U32 => u32::try_from(value).is_ok(),
        PrimitiveKind::U64 => u64::try_from(value).is_ok(),
        _ => false,
    }
}

/// Converts a parsed value into the boxed Rust primitive for `kind`.
pub fn decode_primitive(value: &Value, kind: PrimitiveKind) -> Result<Erased> {
    match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(b)) => Ok(Box::new(*b)),
        (PrimitiveKind::String, Value::String(s)) => Ok(Box::new(s.clone())),
        (PrimitiveKind::I8, Value::Number(n)) => integer::<i8>(kind, n),
        (PrimitiveKind::I16, Value::Number(n)) => integer::<i16>(kind, n),
        (PrimitiveKind::I32, Value::Number(n)) => integer::<i32>(kind, n),
        (PrimitiveKind::I64, Value::Number(n)) => integer::<i64>(kind, n),
        (PrimitiveKind::U8, Value::Number(n)) => integer::<u8>(kind, n),
        (PrimitiveKind::U16, Value::Number(n)) => integer::<u16>(kind, n),
        (PrimitiveKind::U32, Value::Number(n)) => integer::<u32>(kind, n),
        (PrimitiveKind::U64, Value::Number(n)) => integer::<u64>(kind, n),
        (PrimitiveKind::F32, Value::Number(n)) => float::<f32>(kind, n),
        (PrimitiveKind::F64, Value::Number(n)) => float::<f64>(kind, n),
        _ => Err(Error::type_mismatch(kind.name(), value.kind_name())),
    }
}

fn integer<T>(kind: PrimitiveKind, number: &Number) -> Result<Erased>
where
    T: TryFrom<i128> + Send + 'static,
{
    parse_integer::<T>(number.as_str())
        .map(|value| Box::new(value) as Erased)
        .map_err(|err| number_error(err, kind, number))
}

fn float<T>(kind: PrimitiveKind, number: &Number) -> Result<Erased>
where
    T: std::str::FromStr + crate::num::number::IsFinite + Send + 'static,
{
    parse_float::<T>(number.as_str())
        .map(|value| Box::new(value) as Erased)
        .map_err(|err| number_error(err, kind, number))
}

fn number_error(err: NumberError, kind: PrimitiveKind, number: &Number) -> Error {
    match err {
        NumberError::NotInteger => {
            Error::type_mismatch(kind.name(), format!("non-integer number {number}"))
        }
        NumberError::OutOfRange => Error::out_of_range(kind.name(), number.as_str()),
    }
}
