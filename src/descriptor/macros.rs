/// Implements [`Reflect`](crate::Reflect) and [`Describe`](crate::Describe)
/// for a struct with named fields.
///
/// Fields are listed in declaration order; that order is the JSON field
/// order and the constructor parameter order.
///
/// ```
/// use reflect_json::reflect_record;
///
/// #[derive(Debug, PartialEq)]
/// struct Node {
///     id: u32,
///     label: Option<String>,
///     children: Vec<Node>,
/// }
///
/// reflect_record!(Node { id: u32, label: Option<String>, children: Vec<Node> });
///
/// let node: Node = reflect_json::from_str(r#"{"id":1,"children":[{"id":2,"children":[]}]}"#)?;
/// assert_eq!(node.children[0].id, 2);
/// assert_eq!(
///     reflect_json::to_string(&node)?,
///     r#"{"id":1,"label":null,"children":[{"id":2,"label":null,"children":[]}]}"#
/// );
/// # Ok::<(), reflect_json::Error>(())
/// ```
#[macro_export]
macro_rules! reflect_record {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        impl $crate::Reflect for $name {
            fn peek(&self) -> $crate::Peek<'_> {
                $crate::Peek::Record(::std::vec![$(&self.$field as &dyn $crate::Reflect),*])
            }
        }

        impl $crate::Describe for $name {
            fn describe() -> $crate::Result<$crate::TypeDescriptor> {
                $crate::descriptor::RecordBuilder::new(::std::stringify!($name))
                    $(.field::<$ty>(::std::stringify!($field)))*
                    .build::<Self, _>(
                        $crate::reflect_record!(@count $($field)*),
                        |_args: &mut $crate::descriptor::Args| {
                            ::std::result::Result::Ok($name {
                                $($field: _args.take::<$ty>()?,)*
                            })
                        },
                    )
            }
        }
    };
    (@count) => { 0usize };
    (@count $head:ident $($tail:ident)*) => {
        1usize + $crate::reflect_record!(@count $($tail)*)
    };
}
