use std::any::type_name;

use super::{
    Describe, Erased, OptionalDescriptor, Peek, PrimitiveKind, Reflect,
    SequenceDescriptor, TypeDescriptor, TypeRef,
};
use crate::{Error, Result};

macro_rules! impl_primitive {
    ($($ty:ty => $kind:ident, $peek:ident as $wide:ty;)*) => {
        $(
            impl Reflect for $ty {
                fn peek(&self) -> Peek<'_> {
                    Peek::$peek(*self as $wide)
                }
            }

            impl Describe for $ty {
                fn describe() -> Result<TypeDescriptor> {
                    Ok(TypeDescriptor::Primitive(PrimitiveKind::$kind))
                }
            }
        )*
    };
}

impl_primitive! {
    i8 => I8, Int as i64;
    i16 => I16, Int as i64;
    i32 => I32, Int as i64;
    i64 => I64, Int as i64;
    u8 => U8, UInt as u64;
    u16 => U16, UInt as u64;
    u32 => U32, UInt as u64;
    u64 => U64, UInt as u64;
    f32 => F32, F32 as f32;
    f64 => F64, F64 as f64;
}

impl Reflect for bool {
    fn peek(&self) -> Peek<'_> {
        Peek::Bool(*self)
    }
}

impl Describe for bool {
    fn describe() -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Primitive(PrimitiveKind::Bool))
    }
}

impl Reflect for String {
    fn peek(&self) -> Peek<'_> {
        Peek::Str(self)
    }
}

impl Describe for String {
    fn describe() -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Primitive(PrimitiveKind::String))
    }
}

impl<T: Describe> Reflect for Option<T> {
    fn peek(&self) -> Peek<'_> {
        match self {
            Some(value) => value.peek(),
            None => Peek::Null,
        }
    }
}

impl<T: Describe> Describe for Option<T> {
    const NULLABLE: bool = true;

    fn describe() -> Result<TypeDescriptor> {
        if T::NULLABLE {
            return Err(Error::unsupported_type(
                type_name::<Self>(),
                "nested optionals cannot be told apart in JSON",
            ));
        }
        Ok(TypeDescriptor::Optional(OptionalDescriptor::new(
            TypeRef::of::<T>(),
            wrap_option::<T>,
        )))
    }
}

fn wrap_option<T: Describe>(value: Option<Erased>) -> Result<Erased> {
    let wrapped: Option<T> = value.map(T::from_erased).transpose()?;
    Ok(Box::new(wrapped))
}

impl<T: Describe> Reflect for Vec<T> {
    fn peek(&self) -> Peek<'_> {
        Peek::Sequence(self.iter().map(|item| item as &dyn Reflect).collect())
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Sequence(SequenceDescriptor::new(
            TypeRef::of::<T>(),
            collect_vec::<T>,
        )))
    }
}

fn collect_vec<T: Describe>(items: Vec<Erased>) -> Result<Erased> {
    let collected = items
        .into_iter()
        .map(T::from_erased)
        .collect::<Result<Vec<T>>>()?;
    Ok(Box::new(collected))
}

/// Boxes are transparent: they share the pointee's shape and JSON form.
impl<T: Describe> Reflect for Box<T> {
    fn peek(&self) -> Peek<'_> {
        (**self).peek()
    }
}

impl<T: Describe> Describe for Box<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn describe() -> Result<TypeDescriptor> {
        T::describe()
    }

    fn from_erased(value: Erased) -> Result<Self> {
        // the pointee's descriptor produced the erased value, unboxed
        T::from_erased(value).map(Box::new)
    }
}
