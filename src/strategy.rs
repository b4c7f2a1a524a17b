//! The ways a matched field can be copied, and how each one runs.

use core::fmt;

use triomphe::Arc;

use crate::{
    converter::UntypedConverter,
    error::MapError,
    field::{Field, Sequence},
    mapper::Mapper,
    matcher::FieldPair,
};

/// How a matched field pair is copied.
pub(crate) enum Strategy {
    /// Both fields have the same type; the value is cloned.
    Identical,
    /// Both fields are record-like; the source record is mapped into a
    /// destination record.
    NestedRecord,
    /// Both fields are sequences of record-like elements; the elements are
    /// mapped one by one.
    Sequence,
    /// A registered converter produces the destination value.
    Converter(Arc<dyn UntypedConverter>),
    /// No strategy applies. Fails if the source value is not zero.
    Unmappable,
}

impl Strategy {
    /// Copies the non-zero value `from` of the matched source field into
    /// `to`.
    pub(crate) fn apply(
        &self,
        mapper: &Mapper,
        pair: &FieldPair,
        from: &dyn Field,
        to: &mut dyn Field,
    ) -> Result<(), MapError> {
        let field = pair.destination.name();
        let site = Site::Field(pair);
        match self {
            Strategy::Identical => {
                if to.assign_from(from) {
                    Ok(())
                } else {
                    Err(missing_converter(pair))
                }
            }
            Strategy::NestedRecord => map_nested(mapper, site, from, to),
            Strategy::Sequence => match (from.as_sequence(), to.as_sequence_mut()) {
                (Some(from), Some(to)) => map_sequence(mapper, site, from, to),
                _ => Err(site.unsupported()),
            },
            Strategy::Converter(converter) => match converter.convert(from, to) {
                Ok(true) => Ok(()),
                Ok(false) => Err(missing_converter(pair)),
                Err(error) => Err(MapError::Converter { field, error }),
            },
            Strategy::Unmappable => Err(missing_converter(pair)),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Identical => f.write_str("Identical"),
            Strategy::NestedRecord => f.write_str("NestedRecord"),
            Strategy::Sequence => f.write_str("Sequence"),
            Strategy::Converter(converter) => write!(f, "Converter({})", &**converter),
            Strategy::Unmappable => f.write_str("Unmappable"),
        }
    }
}

fn missing_converter(pair: &FieldPair) -> MapError {
    MapError::MissingConverter {
        field: pair.destination.name(),
        from: pair.source.field_type().name(),
        to: pair.destination.field_type().name(),
    }
}

/// Where a nested mapping was started, used to describe its failures.
#[derive(Clone, Copy)]
pub(crate) enum Site<'a> {
    /// A matched field pair of an enclosing record.
    Field(&'a FieldPair),
    /// A top-level [`Mapper::map`] call.
    Call { from: &'static str, to: &'static str },
}

impl Site<'_> {
    fn field(self) -> Option<&'static str> {
        match self {
            Site::Field(pair) => Some(pair.destination.name()),
            Site::Call { .. } => None,
        }
    }

    /// The error for a value whose kind promised a record or sequence view
    /// it does not provide.
    pub(crate) fn unsupported(self) -> MapError {
        match self {
            Site::Field(pair) => missing_converter(pair),
            Site::Call { from, to } => MapError::NotAReference { from, to },
        }
    }
}

/// Maps the record behind `from` into a fresh record installed in `to`.
///
/// An absent source leaves the destination untouched.
pub(crate) fn map_nested(
    mapper: &Mapper,
    site: Site<'_>,
    from: &dyn Field,
    to: &mut dyn Field,
) -> Result<(), MapError> {
    let Some(source) = from.as_record() else {
        return Ok(());
    };
    let destination = to.install_record().ok_or_else(|| site.unsupported())?;
    mapper.map_records(source, destination)
}

/// Rebuilds `to` with as many fresh elements as `from` holds, then maps every
/// source element into the element at the same index.
///
/// Every destination element ends up holding a record: an absent source
/// element yields a fresh default one.
pub(crate) fn map_sequence(
    mapper: &Mapper,
    site: Site<'_>,
    from: &dyn Sequence,
    to: &mut dyn Sequence,
) -> Result<(), MapError> {
    if !to.reset(from.len()) {
        return Err(MapError::LengthMismatch {
            field: site.field(),
            from: from.len(),
            to: to.len(),
        });
    }
    for index in 0..from.len() {
        let (Some(item), Some(slot)) = (from.item(index), to.item_mut(index)) else {
            return Err(site.unsupported());
        };
        let destination = slot.install_record().ok_or_else(|| site.unsupported())?;
        if let Some(source) = item.as_record() {
            mapper.map_records(source, destination)?;
        }
    }
    Ok(())
}
