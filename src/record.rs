//! Static descriptions of record types.

use core::{any::TypeId, fmt};

use crate::field::{Field, Kind};

/// A struct whose fields can be enumerated and accessed by position.
///
/// This trait is normally implemented with `#[derive(Record)]`, which also
/// implements [`Field`] for the type. Field positions are the indices of the
/// descriptors in [`Shape::fields`].
pub trait Record: Field {
    /// The static description of this record type.
    fn shape(&self) -> &'static Shape;

    /// The field at position `index`.
    fn field(&self, index: usize) -> Option<&dyn Field>;

    /// Mutable access to the field at position `index`.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Field>;
}

/// Name, identity and ordered field list of a record type.
#[derive(Debug)]
pub struct Shape {
    name: &'static str,
    id: fn() -> TypeId,
    fields: &'static [FieldDescriptor],
}

impl Shape {
    /// Describes the record type `T`.
    pub const fn of<T: Record>(name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self {
            name,
            id: TypeId::of::<T>,
            fields,
        }
    }

    /// Name of the record type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Identity of the record type.
    pub fn type_id(&self) -> TypeId {
        (self.id)()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        self.fields
    }
}

/// Description of a single record field.
#[derive(Clone, Copy, Debug)]
pub struct FieldDescriptor {
    name: &'static str,
    alias: Option<&'static str>,
    settable: bool,
    ty: FieldType,
}

impl FieldDescriptor {
    /// A settable field without alias.
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            alias: None,
            settable: true,
            ty,
        }
    }

    /// Matches this field under `alias` instead of its declared name.
    pub const fn with_alias(self, alias: &'static str) -> Self {
        Self {
            alias: Some(alias),
            ..self
        }
    }

    /// Marks the field as not writable by the mapper. It can still be read
    /// when its record is a source.
    pub const fn readonly(self) -> Self {
        Self {
            settable: false,
            ..self
        }
    }

    /// Declared name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Alias given with `#[mapper(alias = "...")]`.
    pub fn alias(&self) -> Option<&'static str> {
        self.alias
    }

    /// The name the field is matched under: its alias if it has one, its
    /// declared name otherwise.
    pub fn key(&self) -> &'static str {
        self.alias.unwrap_or(self.name)
    }

    /// Whether the mapper may write this field.
    pub fn is_settable(&self) -> bool {
        self.settable
    }

    /// Type of the field.
    pub fn field_type(&self) -> FieldType {
        self.ty
    }
}

/// Type information of a field, usable in `static` items.
#[derive(Clone, Copy)]
pub struct FieldType {
    id: fn() -> TypeId,
    name: fn() -> &'static str,
    kind: fn() -> Kind,
}

impl FieldType {
    /// Type information of `T`.
    pub const fn of<T: Field>() -> Self {
        Self {
            id: TypeId::of::<T>,
            name: core::any::type_name::<T>,
            kind: <T as Field>::kind,
        }
    }

    /// Identity of the type.
    pub fn type_id(&self) -> TypeId {
        (self.id)()
    }

    /// Name of the type, as given by [`core::any::type_name`].
    pub fn name(&self) -> &'static str {
        (self.name)()
    }

    /// Structural category of the type.
    pub fn kind(&self) -> Kind {
        (self.kind)()
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for FieldType {}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldType").field(&self.name()).finish()
    }
}

/// Ordered pair of types, the key of the converter registry and the plan
/// cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TypePair {
    pub(crate) from: TypeId,
    pub(crate) to: TypeId,
}

impl TypePair {
    pub(crate) fn new(from: TypeId, to: TypeId) -> Self {
        Self { from, to }
    }

    pub(crate) fn of<A: 'static, B: 'static>() -> Self {
        Self::new(TypeId::of::<A>(), TypeId::of::<B>())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    #[derive(Clone, Default)]
    struct Point {
        x: i32,
        label: String,
    }

    impl Field for Point {
        fn kind() -> Kind {
            Kind::Record
        }

        fn fresh() -> Option<Self> {
            Some(Self::default())
        }

        fn is_zero(&self) -> bool {
            self.x.is_zero() && self.label.is_zero()
        }

        fn assign_from(&mut self, source: &dyn Field) -> bool {
            crate::field::assign_clone(self, source)
        }

        fn as_record(&self) -> Option<&dyn Record> {
            Some(self)
        }

        fn install_record(&mut self) -> Option<&mut dyn Record> {
            Some(self)
        }
    }

    impl Record for Point {
        fn shape(&self) -> &'static Shape {
            static SHAPE: Shape = Shape::of::<Point>(
                "Point",
                &[
                    FieldDescriptor::new("x", FieldType::of::<i32>()),
                    FieldDescriptor::new("label", FieldType::of::<String>())
                        .with_alias("name")
                        .readonly(),
                ],
            );
            &SHAPE
        }

        fn field(&self, index: usize) -> Option<&dyn Field> {
            match index {
                0 => Some(&self.x),
                1 => Some(&self.label),
                _ => None,
            }
        }

        fn field_mut(&mut self, index: usize) -> Option<&mut dyn Field> {
            match index {
                0 => Some(&mut self.x),
                1 => Some(&mut self.label),
                _ => None,
            }
        }
    }

    #[test]
    fn test_shape_describes_fields() {
        let point = Point::default();
        let shape = point.shape();
        assert_eq!(shape.name(), "Point");
        assert_eq!(shape.type_id(), TypeId::of::<Point>());

        let [x, label] = shape.fields() else {
            panic!("unexpected field count");
        };
        assert_eq!(x.key(), "x");
        assert!(x.is_settable());
        assert_eq!(x.field_type(), FieldType::of::<i32>());
        assert_eq!(label.name(), "label");
        assert_eq!(label.alias(), Some("name"));
        assert_eq!(label.key(), "name");
        assert!(!label.is_settable());
        assert_eq!(label.field_type().kind(), Kind::Elementary);
    }

    #[test]
    fn test_field_access_by_position() {
        let mut point = Point::default();
        assert!(point.field(2).is_none());

        let x = point.field_mut(0).unwrap();
        assert!(x.assign_from(&5_i32));
        assert_eq!(point.x, 5);
        assert!(!point.is_zero());
    }

    #[test]
    fn test_shape_is_static() {
        static_assertions::assert_impl_all!(Shape: Send, Sync);
        static_assertions::assert_impl_all!(FieldDescriptor: Send, Sync, Copy);
    }
}
