use std::fmt;
use std::time::Duration;

use smallvec::SmallVec;

/// Position inside the JSON input. `line` and `column` are 1-based,
/// `column` counts characters rather than bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn from_offset(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let mut line = 1;
        let mut line_start = 0;
        for idx in memchr::memchr_iter(b'\n', &input.as_bytes()[..offset]) {
            line += 1;
            line_start = idx + 1;
        }
        let column = input
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start)
            + 1;
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Whether a type mismatch is about the JSON kind or about numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    Kind,
    Range,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Kind => Ok(()),
            Mismatch::Range => f.write_str(" (out of range)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error("expected {expected} at {location}")]
    Parse {
        location: Location,
        expected: &'static str,
    },

    #[error("expected {expected}, found {found}{mismatch}")]
    TypeMismatch {
        expected: String,
        found: String,
        mismatch: Mismatch,
    },

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unsupported type `{type_name}`: {reason}")]
    UnsupportedType {
        type_name: &'static str,
        reason: String,
    },

    #[error("`{type_name}` declares {fields} fields but its constructor takes {params} parameters")]
    ConstructorArityMismatch {
        type_name: &'static str,
        fields: usize,
        params: usize,
    },

    #[error("nesting deeper than {limit} levels")]
    DepthLimitExceeded { limit: usize },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(&'static str),
    Index(usize),
}

/// Route from the root value to the node that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    // innermost segment first; prefixing happens while unwinding
    reversed: SmallVec<[PathSegment; 8]>,
}

impl Path {
    pub fn is_root(&self) -> bool {
        self.reversed.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.reversed.iter().rev()
    }

    fn push_parent(&mut self, segment: PathSegment) {
        self.reversed.push(segment);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in self.segments() {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    path: Path,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: Path::default(),
        }
    }

    pub fn parse(input: &str, offset: usize, expected: &'static str) -> Self {
        Self::new(ErrorKind::Parse {
            location: Location::from_offset(input, offset),
            expected,
        })
    }

    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
            mismatch: Mismatch::Kind,
        })
    }

    pub fn out_of_range(expected: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            found: literal.into(),
            mismatch: Mismatch::Range,
        })
    }

    pub fn missing_field(name: &'static str) -> Self {
        Self::new(ErrorKind::MissingField(name))
    }

    pub fn unsupported_type(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedType {
            type_name,
            reason: reason.into(),
        })
    }

    pub fn arity_mismatch(type_name: &'static str, fields: usize, params: usize) -> Self {
        Self::new(ErrorKind::ConstructorArityMismatch {
            type_name,
            fields,
            params,
        })
    }

    pub fn depth_limit(limit: usize) -> Self {
        Self::new(ErrorKind::DepthLimitExceeded { limit })
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(ErrorKind::Timeout(limit))
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig(message.into()))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True for timeouts and cancellations, which say nothing about the data.
    pub fn is_interrupted(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout(_) | ErrorKind::Cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout(_))
    }

    pub(crate) fn at_field(mut self, name: &'static str) -> Self {
        if !self.is_interrupted() {
            self.path.push_parent(PathSegment::Field(name));
        }
        self
    }

    pub(crate) fn at_index(mut self, idx: usize) -> Self {
        if !self.is_interrupted() {
            self.path.push_parent(PathSegment::Index(idx));
        }
        self
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} at {}", self.kind, self.path)
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
