//! Errors reported by a mapping call.

use alloc::boxed::Box;
use core::fmt;

/// Error type produced by fallible converters once they have been erased.
///
/// Any `E: core::error::Error + Send + Sync` converts into it, as do `&str`
/// and [`String`](alloc::string::String).
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Reason a call to [`Mapper::map`](crate::Mapper::map) failed.
///
/// Every failure aborts the mapping call. Fields copied before the failure
/// stay copied on the destination.
#[derive(Debug)]
#[non_exhaustive]
pub enum MapError {
    /// One of the arguments is not a reference to a record (or optional
    /// record), nor to a sequence of them.
    NotAReference {
        /// Type of the source argument.
        from: &'static str,
        /// Type of the destination argument.
        to: &'static str,
    },
    /// Two fields were matched by name but no strategy can copy between
    /// their types. Registering a converter for `from -> to` resolves it.
    MissingConverter {
        /// Destination field name.
        field: &'static str,
        /// Source field type.
        from: &'static str,
        /// Destination field type.
        to: &'static str,
    },
    /// A registered converter reported a failure.
    Converter {
        /// Destination field name.
        field: &'static str,
        /// The error returned by the converter.
        error: BoxError,
    },
    /// A fixed-length sequence cannot hold the source sequence.
    LengthMismatch {
        /// Destination field name, or `None` for a top-level sequence.
        field: Option<&'static str>,
        /// Length of the source sequence.
        from: usize,
        /// Length of the destination sequence.
        to: usize,
    },
}

impl MapError {
    /// Destination field the error was raised for, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            MapError::NotAReference { .. } => None,
            MapError::MissingConverter { field, .. } | MapError::Converter { field, .. } => {
                Some(*field)
            }
            MapError::LengthMismatch { field, .. } => *field,
        }
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::NotAReference { from, to } => write!(
                f,
                "cannot map '{from}' into '{to}': both arguments must reference records or sequences of records"
            ),
            MapError::MissingConverter { field, from, to } => {
                write!(f, "converter is missing for types '{from} -> {to}' (field `{field}`)")
            }
            MapError::Converter { field, error } => {
                write!(f, "converter error for field `{field}`: {error}")
            }
            MapError::LengthMismatch {
                field: Some(field),
                from,
                to,
            } => write!(
                f,
                "cannot map a sequence of {from} elements into field `{field}` holding exactly {to}"
            ),
            MapError::LengthMismatch {
                field: None,
                from,
                to,
            } => write!(
                f,
                "cannot map a sequence of {from} elements into a sequence holding exactly {to}"
            ),
        }
    }
}

impl core::error::Error for MapError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            MapError::Converter { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}
