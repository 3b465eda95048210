//! Structural descriptions of reflectable types.
//!
//! A [`TypeDescriptor`] is built once per type through [`Describe`] and kept
//! in the process-wide registry. Child types are referenced lazily through
//! [`TypeRef`], which lets a record contain sequences or optionals of itself.

mod impls;
mod macros;
mod reflect;
mod registry;

use std::any::{type_name, Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub use reflect::{Describe, Peek, Reflect};
pub use registry::{describe, validate};

#[cfg(test)]
pub(crate) use reflect::downcast;

use crate::{Error, Result};

/// A decoded value whose concrete type is known only to the descriptor that
/// produced it.
pub type Erased = Box<dyn Any + Send>;

type Construct = Arc<dyn Fn(Args) -> Result<Erased> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Boolean,
    Integer,
    Float,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::String => "string",
        }
    }

    pub fn category(self) -> Category {
        match self {
            PrimitiveKind::Bool => Category::Boolean,
            PrimitiveKind::I8
            | PrimitiveKind::I16
            | PrimitiveKind::I32
            | PrimitiveKind::I64
            | PrimitiveKind::U8
            | PrimitiveKind::U16
            | PrimitiveKind::U32
            | PrimitiveKind::U64 => Category::Integer,
            PrimitiveKind::F32 | PrimitiveKind::F64 => Category::Float,
            PrimitiveKind::String => Category::String,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lazy reference to another type's descriptor.
#[derive(Clone, Copy)]
pub struct TypeRef {
    type_id: TypeId,
    type_name: &'static str,
    resolve: fn() -> Result<&'static TypeDescriptor>,
}

impl TypeRef {
    pub fn of<T: Describe>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            resolve: registry::describe::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fetches the referenced descriptor, building it on first use.
    pub fn resolve(&self) -> Result<&'static TypeDescriptor> {
        (self.resolve)()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeRef {}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

#[derive(Clone, Copy)]
pub struct OptionalDescriptor {
    inner: TypeRef,
    wrap: fn(Option<Erased>) -> Result<Erased>,
}

impl OptionalDescriptor {
    pub fn new(inner: TypeRef, wrap: fn(Option<Erased>) -> Result<Erased>) -> Self {
        Self { inner, wrap }
    }

    pub fn inner(&self) -> &TypeRef {
        &self.inner
    }

    pub(crate) fn wrap(&self, value: Option<Erased>) -> Result<Erased> {
        (self.wrap)(value)
    }
}

#[derive(Clone, Copy)]
pub struct SequenceDescriptor {
    element: TypeRef,
    collect: fn(Vec<Erased>) -> Result<Erased>,
}

impl SequenceDescriptor {
    pub fn new(element: TypeRef, collect: fn(Vec<Erased>) -> Result<Erased>) -> Self {
        Self { element, collect }
    }

    pub fn element(&self) -> &TypeRef {
        &self.element
    }

    pub(crate) fn collect(&self, items: Vec<Erased>) -> Result<Erased> {
        (self.collect)(items)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    ty: TypeRef,
    required: bool,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, ty: TypeRef, required: bool) -> Self {
        Self { name, ty, required }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// False only for fields whose type accepts `null`.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

#[derive(Clone)]
pub struct RecordDescriptor {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    params: usize,
    construct: Construct,
}

impl RecordDescriptor {
    /// Checks that `fields` map one-to-one onto the `params` positional
    /// constructor parameters.
    pub fn new(
        type_name: &'static str,
        fields: Vec<FieldDescriptor>,
        params: usize,
        construct: impl Fn(Args) -> Result<Erased> + Send + Sync + 'static,
    ) -> Result<Self> {
        if fields.len() != params {
            return Err(Error::arity_mismatch(type_name, fields.len(), params));
        }
        let mut seen = HashSet::with_capacity(fields.len());
        if let Some(dup) = fields.iter().find(|field| !seen.insert(field.name)) {
            tracing::debug!(type_name, field = dup.name, "duplicate field name");
            return Err(Error::arity_mismatch(type_name, fields.len(), seen.len()));
        }
        Ok(Self {
            type_name,
            fields,
            params,
            construct: Arc::new(construct),
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in declaration order, which is also constructor order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn params(&self) -> usize {
        self.params
    }

    /// Invokes the constructor with `parts` in declaration order.
    pub(crate) fn construct(&self, parts: Vec<Erased>) -> Result<Erased> {
        (self.construct)(Args::new(self.type_name, parts))
    }
}

/// Structural description of a type.
#[derive(Clone)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Optional(OptionalDescriptor),
    Sequence(SequenceDescriptor),
    Record(RecordDescriptor),
}

impl TypeDescriptor {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Primitive(kind) => kind.name(),
            TypeDescriptor::Optional(_) => "optional",
            TypeDescriptor::Sequence(_) => "sequence",
            TypeDescriptor::Record(_) => "record",
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeDescriptor::Optional(_))
    }

    pub fn as_record(&self) -> Option<&RecordDescriptor> {
        match self {
            TypeDescriptor::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Direct child references, in declaration order.
    pub fn children(&self) -> Vec<TypeRef> {
        match self {
            TypeDescriptor::Primitive(_) => Vec::new(),
            TypeDescriptor::Optional(opt) => vec![opt.inner],
            TypeDescriptor::Sequence(seq) => vec![seq.element],
            TypeDescriptor::Record(record) => record.fields.iter().map(|f| f.ty).collect(),
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeDescriptor::Primitive(a), TypeDescriptor::Primitive(b)) => a == b,
            (TypeDescriptor::Optional(a), TypeDescriptor::Optional(b)) => a.inner == b.inner,
            (TypeDescriptor::Sequence(a), TypeDescriptor::Sequence(b)) => a.element == b.element,
            (TypeDescriptor::Record(a), TypeDescriptor::Record(b)) => {
                a.type_name == b.type_name && a.params == b.params && a.fields == b.fields
            }
            _ => false,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(kind) => write!(f, "Primitive({kind})"),
            TypeDescriptor::Optional(opt) => write!(f, "Optional({:?})", opt.inner),
            TypeDescriptor::Sequence(seq) => write!(f, "Sequence({:?})", seq.element),
            TypeDescriptor::Record(record) => f
                .debug_struct("Record")
                .field("type_name", &record.type_name)
                .field("fields", &record.fields)
                .finish_non_exhaustive(),
        }
    }
}

/// Builder used by [`Describe`] impls of structs.
///
/// ```
/// use reflect_json::descriptor::RecordBuilder;
/// use reflect_json::{Describe, Peek, Reflect, Result, TypeDescriptor};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Reflect for Point {
///     fn peek(&self) -> Peek<'_> {
///         Peek::Record(vec![&self.x as &dyn Reflect, &self.y])
///     }
/// }
///
/// impl Describe for Point {
///     fn describe() -> Result<TypeDescriptor> {
///         RecordBuilder::new("Point")
///             .field::<i32>("x")
///             .field::<i32>("y")
///             .build(2, |args| Ok(Point { x: args.take()?, y: args.take()? }))
///     }
/// }
///
/// let text = reflect_json::to_string(&Point { x: 1, y: -2 })?;
/// assert_eq!(text, r#"{"x":1,"y":-2}"#);
/// # Ok::<(), reflect_json::Error>(())
/// ```
pub struct RecordBuilder {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl RecordBuilder {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    pub fn field<F: Describe>(mut self, name: &'static str) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, TypeRef::of::<F>(), !F::NULLABLE));
        self
    }

    /// Finishes the descriptor. `construct` receives the decoded fields in
    /// declaration order and must consume exactly `params` of them.
    pub fn build<T, C>(self, params: usize, construct: C) -> Result<TypeDescriptor>
    where
        T: Describe,
        C: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
    {
        let record = RecordDescriptor::new(self.type_name, self.fields, params, move |mut args| {
            let value = construct(&mut args)?;
            args.finish()?;
            Ok(Box::new(value) as Erased)
        })?;
        Ok(TypeDescriptor::Record(record))
    }
}

/// Positional constructor arguments, handed out in declaration order.
pub struct Args {
    type_name: &'static str,
    total: usize,
    taken: usize,
    parts: std::vec::IntoIter<Erased>,
}

impl Args {
    fn new(type_name: &'static str, parts: Vec<Erased>) -> Self {
        Self {
            type_name,
            total: parts.len(),
            taken: 0,
            parts: parts.into_iter(),
        }
    }

    pub fn take<F: Describe>(&mut self) -> Result<F> {
        let part = self
            .parts
            .next()
            .ok_or_else(|| Error::arity_mismatch(self.type_name, self.total, self.taken + 1))?;
        self.taken += 1;
        F::from_erased(part)
    }

    fn finish(self) -> Result<()> {
        if self.taken != self.total {
            return Err(Error::arity_mismatch(self.type_name, self.total, self.taken));
        }
        Ok(())
    }
}
