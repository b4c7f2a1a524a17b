//! Type-erased access to the values stored in record fields.
//!
//! Every type that can appear as a field of a [`Record`] implements [`Field`].
//! The trait answers the handful of questions the mapping engine asks about a
//! value without knowing its concrete type:
//!
//! - what structural [`Kind`] the type has,
//! - whether the current value is the zero value (or an absent optional),
//! - how to copy it from another value of the same type,
//! - how to reach the record or sequence behind it.
//!
//! Records implement [`Field`] through `#[derive(Record)]`. Elementary types
//! (numbers, strings, timestamps, ...) come with implementations, and user
//! types can be declared elementary with the [`elementary!`] macro.
//!
//! [`elementary!`]: crate::elementary

use alloc::{
    boxed::Box,
    collections::{BTreeMap, BTreeSet},
    string::String,
    vec::Vec,
};
use core::{any::Any, time::Duration};

use crate::record::Record;

/// Structural category of a field type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A value with no fields of interest, copied as a whole or converted.
    Elementary,
    /// A record, or an optional or boxed reference to one.
    Record,
    /// A homogeneous sequence.
    Sequence {
        /// Number of elements of a fixed-length sequence, `None` for a
        /// variable-length one.
        len: Option<usize>,
        /// Whether the elements are record-like.
        records: bool,
    },
}

impl Kind {
    /// Returns `true` for records and optional or boxed records.
    pub const fn is_record(self) -> bool {
        matches!(self, Kind::Record)
    }

    /// Returns `true` for sequences whose elements are record-like.
    pub const fn is_record_sequence(self) -> bool {
        matches!(self, Kind::Sequence { records: true, .. })
    }

    /// Length of a fixed-length sequence.
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            Kind::Sequence { len, .. } => len,
            _ => None,
        }
    }
}

/// A value that can be stored in a record field.
pub trait Field: Any {
    /// Structural category of this type.
    fn kind() -> Kind
    where
        Self: Sized;

    /// A freshly allocated value used when the engine has to create a
    /// destination record or sequence element.
    ///
    /// Records return their default value and optional references return
    /// `None` (an absent reference). Types that cannot be allocated return
    /// `None`, which is the default.
    fn fresh() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    /// Returns `true` if the value is the zero value of its type or an absent
    /// optional. Such values are never copied.
    fn is_zero(&self) -> bool;

    /// Overwrites `self` with a copy of `source`.
    ///
    /// Returns `false`, leaving `self` untouched, if `source` is of another
    /// type.
    fn assign_from(&mut self, source: &dyn Field) -> bool;

    /// The record behind this value, if it is a present record-like value.
    fn as_record(&self) -> Option<&dyn Record> {
        None
    }

    /// Prepares this value to receive a mapped record and returns it.
    ///
    /// Inline records are returned as they are. Optional references are
    /// replaced by a fresh record first.
    fn install_record(&mut self) -> Option<&mut dyn Record> {
        None
    }

    /// The sequence behind this value, if it is one.
    fn as_sequence(&self) -> Option<&dyn Sequence> {
        None
    }

    /// Mutable access to the sequence behind this value, if it is one.
    fn as_sequence_mut(&mut self) -> Option<&mut dyn Sequence> {
        None
    }
}

/// Type-erased view of a homogeneous sequence.
pub trait Sequence {
    /// Number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if the sequence holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index`.
    fn item(&self, index: usize) -> Option<&dyn Field>;

    /// Mutable access to the element at `index`.
    fn item_mut(&mut self, index: usize) -> Option<&mut dyn Field>;

    /// Replaces the contents with `len` fresh elements.
    ///
    /// Returns `false`, leaving the sequence untouched, if it cannot hold
    /// exactly `len` elements.
    fn reset(&mut self, len: usize) -> bool;
}

/// Declares types as elementary [`Field`] values.
///
/// The plain form requires `Clone + Default + PartialEq`; the default value
/// is the zero value:
///
/// ```
/// #[derive(Clone, Default, PartialEq)]
/// struct Money(i64);
///
/// structmap::elementary!(Money);
/// ```
///
/// The `where` form takes a zero predicate instead and only requires
/// `Clone`:
///
/// ```
/// #[derive(Clone)]
/// struct Timestamp(u64);
///
/// structmap::elementary!(Timestamp where |ts| ts.0 == 0);
/// ```
///
/// Only types of the calling crate can be declared. A field of a foreign type
/// is either wrapped in a local newtype that is declared here, or left out of
/// its record with `#[mapper(skip)]`.
#[macro_export]
macro_rules! elementary {
    ($ty:ty where |$value:ident| $zero:expr) => {
        impl $crate::Field for $ty {
            fn kind() -> $crate::Kind {
                $crate::Kind::Elementary
            }

            fn is_zero(&self) -> bool {
                let $value = self;
                $zero
            }

            fn assign_from(&mut self, source: &dyn $crate::Field) -> bool {
                $crate::__private::assign_clone(self, source)
            }
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Field for $ty {
                fn kind() -> $crate::Kind {
                    $crate::Kind::Elementary
                }

                fn fresh() -> ::core::option::Option<Self> {
                    ::core::option::Option::Some(<$ty as ::core::default::Default>::default())
                }

                fn is_zero(&self) -> bool {
                    *self == <$ty as ::core::default::Default>::default()
                }

                fn assign_from(&mut self, source: &dyn $crate::Field) -> bool {
                    $crate::__private::assign_clone(self, source)
                }
            }
        )+
    };
}

/// Clones `source` into `target` if both have the same concrete type.
#[doc(hidden)]
pub fn assign_clone<T: Clone + 'static>(target: &mut T, source: &dyn Field) -> bool {
    let source: &dyn Any = source;
    match source.downcast_ref::<T>() {
        Some(value) => {
            target.clone_from(value);
            true
        }
        None => false,
    }
}

elementary!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    (),
    String,
    &'static str,
    Duration,
);

#[cfg(feature = "std")]
elementary!(std::time::SystemTime where |time| *time == std::time::SystemTime::UNIX_EPOCH);

impl<T: Field + Clone> Field for Option<T> {
    fn kind() -> Kind {
        if T::kind().is_record() {
            Kind::Record
        } else {
            Kind::Elementary
        }
    }

    fn fresh() -> Option<Self> {
        Some(None)
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn assign_from(&mut self, source: &dyn Field) -> bool {
        assign_clone(self, source)
    }

    fn as_record(&self) -> Option<&dyn Record> {
        self.as_ref()?.as_record()
    }

    fn install_record(&mut self) -> Option<&mut dyn Record> {
        let fresh = T::fresh()?;
        self.insert(fresh).install_record()
    }
}

impl<T: Field + Clone> Field for Box<T> {
    fn kind() -> Kind {
        T::kind()
    }

    fn fresh() -> Option<Self> {
        T::fresh().map(Box::new)
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }

    fn assign_from(&mut self, source: &dyn Field) -> bool {
        assign_clone(self, source)
    }

    fn as_record(&self) -> Option<&dyn Record> {
        (**self).as_record()
    }

    fn install_record(&mut self) -> Option<&mut dyn Record> {
        (**self).install_record()
    }

    fn as_sequence(&self) -> Option<&dyn Sequence> {
        (**self).as_sequence()
    }

    fn as_sequence_mut(&mut self) -> Option<&mut dyn Sequence> {
        (**self).as_sequence_mut()
    }
}

impl<T: Field + Clone> Field for Vec<T> {
    fn kind() -> Kind {
        Kind::Sequence {
            len: None,
            records: T::kind().is_record(),
        }
    }

    fn fresh() -> Option<Self> {
        Some(Vec::new())
    }

    fn is_zero(&self) -> bool {
        self.as_slice().is_empty()
    }

    fn assign_from(&mut self, source: &dyn Field) -> bool {
        assign_clone(self, source)
    }

    fn as_sequence(&self) -> Option<&dyn Sequence> {
        Some(self)
    }

    fn as_sequence_mut(&mut self) -> Option<&mut dyn Sequence> {
        Some(self)
    }
}

impl<T: Field + Clone> Sequence for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn item(&self, index: usize) -> Option<&dyn Field> {
        self.as_slice().get(index).map(|item| item as &dyn Field)
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut dyn Field> {
        self.as_mut_slice()
            .get_mut(index)
            .map(|item| item as &mut dyn Field)
    }

    fn reset(&mut self, len: usize) -> bool {
        match (0..len).map(|_| T::fresh()).collect::<Option<Vec<T>>>() {
            Some(items) => {
                *self = items;
                true
            }
            None => false,
        }
    }
}

impl<T: Field + Clone, const N: usize> Field for [T; N] {
    fn kind() -> Kind {
        Kind::Sequence {
            len: Some(N),
            records: T::kind().is_record(),
        }
    }

    fn fresh() -> Option<Self> {
        (0..N)
            .map(|_| T::fresh())
            .collect::<Option<Vec<T>>>()?
            .try_into()
            .ok()
    }

    fn is_zero(&self) -> bool {
        self.iter().all(|item| item.is_zero())
    }

    fn assign_from(&mut self, source: &dyn Field) -> bool {
        assign_clone(self, source)
    }

    fn as_sequence(&self) -> Option<&dyn Sequence> {
        Some(self)
    }

    fn as_sequence_mut(&mut self) -> Option<&mut dyn Sequence> {
        Some(self)
    }
}

impl<T: Field + Clone, const N: usize> Sequence for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn item(&self, index: usize) -> Option<&dyn Field> {
        self.as_slice().get(index).map(|item| item as &dyn Field)
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut dyn Field> {
        self.as_mut_slice()
            .get_mut(index)
            .map(|item| item as &mut dyn Field)
    }

    fn reset(&mut self, len: usize) -> bool {
        if len != N {
            return false;
        }
        let Some(items) = Self::fresh() else {
            return false;
        };
        *self = items;
        true
    }
}

impl<K, V> Field for BTreeMap<K, V>
where
    K: Clone + 'static,
    V: Clone + 'static,
{
    fn kind() -> Kind {
        Kind::Elementary
    }

    fn fresh() -> Option<Self> {
        Some(BTreeMap::new())
    }

    fn is_zero(&self) -> bool {
        BTreeMap::is_empty(self)
    }

    fn assign_from(&mut self, source: &dyn Field) -> bool {
        assign_clone(self, source)
    }
}

impl<T> Field for BTreeSet<T>
where
    T: Clone + 'static,
{
    fn kind() -> Kind {
        Kind::Elementary
    }

    fn fresh() -> Option<Self> {
        Some(BTreeSet::new())
    }

    fn is_zero(&self) -> bool {
        BTreeSet::is_empty(self)
    }

    fn assign_from(&mut self, source: &dyn Field) -> bool {
        assign_clone(self, source)
    }
}

#[cfg(feature = "std")]
impl<K, V, S> Field for std::collections::HashMap<K, V, S>
where
    K: Clone + 'static,
    V: Clone + 'static,
    S: Clone + Default + 'static,
{
    fn kind() -> Kind {
        Kind::Elementary
    }

    fn fresh() -> Option<Self> {
        Some(Self::default())
    }

    fn is_zero(&self) -> bool {
        std::collections::HashMap::is_empty(self)
    }

    fn assign_from(&mut self, source: &dyn Field) -> bool {
        assign_clone(self, source)
    }
}

#[cfg(feature = "std")]
impl<T, S> Field for std::collections::HashSet<T, S>
where
    T: Clone + 'static,
    S: Clone + Default + 'static,
{
    fn kind() -> Kind {
        Kind::Elementary
    }

    fn fresh() -> Option<Self> {
        Some(Self::default())
    }

    fn is_zero(&self) -> bool {
        std::collections::HashSet::is_empty(self)
    }

    fn assign_from(&mut self, source: &dyn Field) -> bool {
        assign_clone(self, source)
    }
}
