use std::str::FromStr;

pub fn format_i64(value: i64, out: &mut String) {
    let mut buffer = itoa::Buffer::new();
    out.push_str(buffer.format(value));
}

pub fn format_u64(value: u64, out: &mut String) {
    let mut buffer = itoa::Buffer::new();
    out.push_str(buffer.format(value));
}

/// Shortest round-trip form of a finite `f64`, without a trailing `.0`.
pub fn format_f64(value: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    trim_point_zero(buffer.format_finite(value))
}

/// Shortest round-trip form of a finite `f32`; formatted at `f32` precision
/// so `0.1f32` stays `0.1`.
pub fn format_f32(value: f32) -> String {
    let mut buffer = ryu::Buffer::new();
    trim_point_zero(buffer.format_finite(value))
}

fn trim_point_zero(raw: &str) -> String {
    // ryu writes `1.0`, `1e16`, `1.5e-7`; only the bare `.0` form is redundant
    match raw.strip_suffix(".0") {
        Some(trimmed) => trimmed.to_string(),
        None => raw.to_string(),
    }
}

/// Checks `literal` against the JSON number grammar:
/// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
pub fn is_json_number(literal: &str) -> bool {
    scan_number(literal.as_bytes(), 0) == Ok(literal.len())
}

/// Scans a number starting at `start`; returns the end offset or the offset
/// of the first byte that breaks the grammar.
pub(crate) fn scan_number(bytes: &[u8], start: usize) -> Result<usize, usize> {
    let mut i = start;
    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            i += 1;
            while matches!(bytes.get(i), Some(b'0'..=b'9')) {
                i += 1;
            }
        }
        _ => return Err(i),
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        if !matches!(bytes.get(i), Some(b'0'..=b'9')) {
            return Err(i);
        }
        while matches!(bytes.get(i), Some(b'0'..=b'9')) {
            i += 1;
        }
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if !matches!(bytes.get(i), Some(b'0'..=b'9')) {
            return Err(i);
        }
        while matches!(bytes.get(i), Some(b'0'..=b'9')) {
            i += 1;
        }
    }
    Ok(i)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberError {
    /// The literal has a fraction or exponent.
    NotInteger,
    /// The value does not fit the target width.
    OutOfRange,
}

/// Parses an integer literal into `T`, distinguishing a non-integer literal
/// from one that overflows `T`.
pub fn parse_integer<T>(literal: &str) -> Result<T, NumberError>
where
    T: TryFrom<i128>,
{
    if literal.bytes().any(|b| matches!(b, b'.' | b'e' | b'E')) {
        return Err(NumberError::NotInteger);
    }
    // literals wider than i128 fail to parse and are out of range for every kind
    let wide = literal
        .parse::<i128>()
        .map_err(|_| NumberError::OutOfRange)?;
    T::try_from(wide).map_err(|_| NumberError::OutOfRange)
}

/// Parses a float literal, rejecting values that overflow to infinity.
pub fn parse_float<T>(literal: &str) -> Result<T, NumberError>
where
    T: FromStr + IsFinite,
{
    match literal.parse::<T>() {
        Ok(value) if value.finite() => Ok(value),
        _ => Err(NumberError::OutOfRange),
    }
}

pub trait IsFinite {
    fn finite(&self) -> bool;
}

impl IsFinite for f32 {
    fn finite(&self) -> bool {
        self.is_finite()
    }
}

impl IsFinite for f64 {
    fn finite(&self) -> bool {
        self.is_finite()
    }
}
