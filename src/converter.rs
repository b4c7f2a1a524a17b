//! User-supplied conversions between field types.
//!
//! Converters are stored type-erased, keyed by the pair of types they convert
//! between. A registration for a pair that already has a converter replaces
//! it.

use alloc::vec::Vec;
use core::{
    any::{Any, type_name},
    convert::Infallible,
    fmt,
    marker::PhantomData,
    panic::Location,
};

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use triomphe::Arc;
use unsize::CoerceUnsize;

use crate::{
    error::BoxError,
    field::Field,
    lock::RegistryLock,
    record::TypePair,
};

/// A converter with its input and output types erased.
pub(crate) trait UntypedConverter: 'static + Send + Sync + fmt::Display {
    /// Converts `from` and writes the result into `to`.
    ///
    /// Returns `Ok(false)` without touching `to` if either value is not of
    /// the type the converter was registered for. On error `to` is left
    /// untouched as well.
    fn convert(&self, from: &dyn Field, to: &mut dyn Field) -> Result<bool, BoxError>;
}

struct Converter<A, B, E, F> {
    convert: F,
    name: &'static str,
    added_at: &'static Location<'static>,
    _types: PhantomData<fn(A) -> Result<B, E>>,
}

impl<A, B, E, F> UntypedConverter for Converter<A, B, E, F>
where
    A: Field + Clone,
    B: Field,
    E: Into<BoxError> + 'static,
    F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
{
    fn convert(&self, from: &dyn Field, to: &mut dyn Field) -> Result<bool, BoxError> {
        let from: &dyn Any = from;
        let to: &mut dyn Any = to;
        let (Some(input), Some(output)) = (from.downcast_ref::<A>(), to.downcast_mut::<B>())
        else {
            return Ok(false);
        };
        match (self.convert)(input.clone()) {
            Ok(value) => {
                *output = value;
                Ok(true)
            }
            Err(error) => Err(error.into()),
        }
    }
}

impl<A, B, E, F> fmt::Display for Converter<A, B, E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {}) registered at {}:{}",
            self.name,
            type_name::<A>(),
            type_name::<B>(),
            self.added_at.file(),
            self.added_at.line()
        )
    }
}

/// Erases an infallible conversion function.
#[track_caller]
pub(crate) fn infallible<A, B, F>(convert: F) -> (TypePair, Arc<dyn UntypedConverter>)
where
    A: Field + Clone,
    B: Field,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    erase(
        move |input: A| Ok::<B, Infallible>(convert(input)),
        type_name::<F>(),
    )
}

/// Erases a fallible conversion function.
#[track_caller]
pub(crate) fn fallible<A, B, E, F>(convert: F) -> (TypePair, Arc<dyn UntypedConverter>)
where
    A: Field + Clone,
    B: Field,
    E: Into<BoxError> + 'static,
    F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
{
    erase(convert, type_name::<F>())
}

#[track_caller]
fn erase<A, B, E, F>(convert: F, name: &'static str) -> (TypePair, Arc<dyn UntypedConverter>)
where
    A: Field + Clone,
    B: Field,
    E: Into<BoxError> + 'static,
    F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
{
    let converter = Arc::new(Converter {
        convert,
        name,
        added_at: Location::caller(),
        _types: PhantomData,
    });
    (
        TypePair::of::<A, B>(),
        converter.unsize(unsize::Coercion!(to dyn UntypedConverter)),
    )
}

#[derive(Default)]
pub(crate) struct ConverterMap {
    map: HashMap<TypePair, Arc<dyn UntypedConverter>, FxBuildHasher>,
}

impl ConverterMap {
    /// Returns the converter previously registered for `key`.
    pub(crate) fn insert(
        &mut self,
        key: TypePair,
        converter: Arc<dyn UntypedConverter>,
    ) -> Option<Arc<dyn UntypedConverter>> {
        self.map.insert(key, converter)
    }

    fn get(&self, key: TypePair) -> Option<Arc<dyn UntypedConverter>> {
        self.map.get(&key).cloned()
    }
}

/// The converter registry of a mapper.
pub(crate) struct ConverterRegistry(RegistryLock<ConverterMap>);

impl ConverterRegistry {
    pub(crate) const fn new() -> Self {
        Self(RegistryLock::new())
    }

    pub(crate) fn with(converters: ConverterMap) -> Self {
        Self(RegistryLock::with(converters))
    }

    /// The converter registered for `key`. The lock is released before
    /// returning so the converter can run without it.
    pub(crate) fn get(&self, key: TypePair) -> Option<Arc<dyn UntypedConverter>> {
        self.0.read().get()?.get(key)
    }

    /// Returns the replaced converter, so that it is dropped after the lock
    /// is released.
    pub(crate) fn insert(
        &self,
        key: TypePair,
        converter: Arc<dyn UntypedConverter>,
    ) -> Option<Arc<dyn UntypedConverter>> {
        self.0
            .write()
            .get()
            .get_or_insert_default()
            .insert(key, converter)
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn UntypedConverter>> {
        match self.0.read().get() {
            Some(converters) => converters.map.values().cloned().collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use super::*;

    #[test]
    fn test_infallible_converter() {
        let (key, converter) = infallible(|n: i32| n.to_string());
        assert_eq!(key, TypePair::of::<i32, String>());

        let mut output = String::new();
        assert!(matches!(converter.convert(&12_i32, &mut output), Ok(true)));
        assert_eq!(output, "12");
    }

    #[test]
    fn test_mismatched_types_are_not_converted() {
        let (_, converter) = infallible(|n: i32| n.to_string());

        let mut output = String::from("kept");
        assert!(matches!(converter.convert(&12_u8, &mut output), Ok(false)));
        let mut wrong = 0_u64;
        assert!(matches!(converter.convert(&12_i32, &mut wrong), Ok(false)));
        assert_eq!(output, "kept");
    }

    #[test]
    fn test_failed_conversion_leaves_destination() {
        let (_, converter) = fallible(|s: String| s.parse::<i32>());

        let mut output = 3_i32;
        let error = converter
            .convert(&String::from("x"), &mut output)
            .unwrap_err();
        assert_eq!(error.to_string(), "invalid digit found in string");
        assert_eq!(output, 3);
    }

    #[test]
    fn test_display_names_types_and_location() {
        let (_, converter) = fallible(|_: u8| Err::<u16, _>("never"));
        let description = converter.to_string();
        assert!(description.contains("(u8 -> u16)"), "{description}");
        assert!(description.contains(file!()), "{description}");
    }

    #[test]
    fn test_registry_overwrites() {
        let registry = ConverterRegistry::new();
        let key = TypePair::of::<i32, String>();
        assert!(registry.get(key).is_none());

        let (_, first) = infallible(|_: i32| String::from("first"));
        let (_, second) = infallible(|_: i32| String::from("second"));
        registry.insert(key, first);
        registry.insert(key, second);
        assert_eq!(registry.snapshot().len(), 1);

        let mut output = String::new();
        let converter = registry.get(key).unwrap();
        assert!(converter.convert(&1_i32, &mut output).unwrap());
        assert_eq!(output, "second");
    }
}
