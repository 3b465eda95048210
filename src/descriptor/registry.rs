use std::any::{type_name, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use parking_lot::RwLock;

use super::{Describe, TypeDescriptor};
use crate::Result;

/// Append-only, process-wide descriptor cache. Entries are leaked on insert
/// and live for the rest of the process.
static REGISTRY: OnceLock<RwLock<HashMap<TypeId, &'static TypeDescriptor>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<TypeId, &'static TypeDescriptor>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the cached descriptor for `T`, building it on first use.
///
/// Two threads missing at the same time both build; the first insert is kept
/// and the other copy is dropped. Build failures are not cached.
pub fn describe<T: Describe>() -> Result<&'static TypeDescriptor> {
    let key = TypeId::of::<T>();
    if let Some(found) = registry().read().get(&key) {
        return Ok(found);
    }

    let built = T::describe()?;

    let mut map = registry().write();
    let entry = map.entry(key).or_insert_with(|| {
        tracing::trace!(type_name = type_name::<T>(), "descriptor registered");
        Box::leak(Box::new(built))
    });
    Ok(*entry)
}

/// Resolves every descriptor reachable from `T`, so a type whose nested
/// fields cannot be described fails here instead of mid-call.
pub fn validate<T: Describe>() -> Result<&'static TypeDescriptor> {
    let root = describe::<T>()?;
    let mut seen = HashSet::from([TypeId::of::<T>()]);
    let mut pending = root.children();
    while let Some(child) = pending.pop() {
        if !seen.insert(child.type_id()) {
            continue;
        }
        let descriptor = child.resolve()?;
        pending.extend(descriptor.children());
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PrimitiveKind;

    #[rstest::rstest]
    fn test_describe_is_memoized() {
        let first = describe::<Vec<u16>>().unwrap();
        let second = describe::<Vec<u16>>().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[rstest::rstest]
    fn test_concurrent_first_use_agrees() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| describe::<Vec<Option<i16>>>().unwrap()))
            .collect();
        let results: Vec<&'static TypeDescriptor> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results {
            assert!(std::ptr::eq(*result, results[0]));
        }
    }

    #[rstest::rstest]
    fn test_primitive_descriptors() {
        assert_eq!(
            *describe::<String>().unwrap(),
            TypeDescriptor::Primitive(PrimitiveKind::String)
        );
        assert_eq!(
            *describe::<f32>().unwrap(),
            TypeDescriptor::Primitive(PrimitiveKind::F32)
        );
    }
}
