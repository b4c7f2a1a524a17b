#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    unused_doc_comments
)]
#![forbid(unsafe_code)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Copy field-level data between structurally similar record types.
//!
//! ## Overview
//!
//! Application layers often hold the same data in different shapes: a
//! storage row, a domain entity, a response view. This crate copies the
//! values of one record into another by matching fields by name, so that the
//! boilerplate conversion code does not have to be written by hand.
//!
//! ```
//! use structmap::Record;
//!
//! #[derive(Clone, Default, Record)]
//! struct Row {
//!     id: u64,
//!     #[mapper(alias = "title")]
//!     name: String,
//!     tags: Vec<Tag>,
//! }
//!
//! #[derive(Clone, Default, Record)]
//! struct Tag {
//!     label: String,
//! }
//!
//! #[derive(Clone, Default, Record)]
//! struct View {
//!     id: u64,
//!     title: String,
//!     tags: Vec<Option<TagView>>,
//! }
//!
//! #[derive(Clone, Default, Record)]
//! struct TagView {
//!     label: String,
//! }
//!
//! let row = Row {
//!     id: 7,
//!     name: "hello".into(),
//!     tags: vec![Tag { label: "a".into() }],
//! };
//! let mut view = View::default();
//! structmap::map(&row, &mut view)?;
//!
//! assert_eq!(view.id, 7);
//! assert_eq!(view.title, "hello");
//! assert_eq!(view.tags[0].as_ref().map(|tag| tag.label.as_str()), Some("a"));
//! # Ok::<(), structmap::MapError>(())
//! ```
//!
//! ## How fields are copied
//!
//! Every settable destination field is paired with the source field that has
//! the same name, or the same alias given with `#[mapper(alias = "...")]`.
//! Fields marked `#[mapper(readonly)]` are never written. For each pair, the
//! first applicable rule wins:
//!
//! 1. A converter registered for the two field types produces the value.
//! 2. Fields of the same type are cloned.
//! 3. Records (inline, optional or boxed) are mapped recursively into a
//!    freshly created destination record.
//! 4. Sequences of records ([`Vec`](alloc::vec::Vec) or arrays) are rebuilt
//!    element by element.
//!
//! Source values that are zero (the default value, an empty collection or
//! `None`) are skipped, so the destination keeps what it had. A non-zero
//! value with no applicable rule fails with [`MapError::MissingConverter`].
//!
//! ## Converters
//!
//! Converters are closures registered on a [`Mapper`] for one pair of types:
//!
//! ```
//! use structmap::{Mapper, Record};
//!
//! #[derive(Clone, Default, Record)]
//! struct Form {
//!     age: String,
//! }
//!
//! #[derive(Clone, Default, Record)]
//! struct Person {
//!     age: u8,
//! }
//!
//! let mapper = Mapper::new();
//! mapper.register_fallible_converter(|age: String| age.parse::<u8>());
//!
//! let mut person = Person::default();
//! mapper.map(&Form { age: "42".into() }, &mut person)?;
//! assert_eq!(person.age, 42);
//!
//! let error = mapper.map(&Form { age: "old".into() }, &mut person).unwrap_err();
//! assert_eq!(error.field(), Some("age"));
//! # Ok::<(), structmap::MapError>(())
//! ```
//!
//! ## Plans
//!
//! The first mapping between two record types builds a plan: the list of
//! field pairs with the rule chosen for each. A plan is cached per type pair
//! once a mapping through it succeeds, and replayed on later calls. Use
//! [`Mapper::builder`] to disable the cache.
//!
//! ## Logging
//!
//! Registrations and cached plans are reported through [`tracing`] at the
//! `debug` level, plan replays at the `trace` level.
//!
//! ## Features
//!
//! - `std` (default): uses `std` locks instead of spin locks and implements
//!   [`Field`] for `SystemTime`, `HashMap` and `HashSet`.
//! - `derive` (default): provides `#[derive(Record)]`.
//!
//! [`tracing`]: https://docs.rs/tracing

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

// Lets derived code refer to `::structmap` from inside this crate.
extern crate self as structmap;

mod classify;
mod converter;
mod error;
mod field;
mod lock;
mod mapper;
mod matcher;
mod plan;
mod record;
mod strategy;

pub use self::{
    error::{BoxError, MapError},
    field::{Field, Kind, Sequence},
    mapper::{Mapper, MapperBuilder},
    record::{FieldDescriptor, FieldType, Record, Shape},
};

/// Derives [`Record`] and [`Field`] for a struct.
///
/// The struct must implement `Clone` and `Default` and have no generic
/// parameters. Field attributes:
///
/// - `#[mapper(alias = "name")]` matches the field under `name`.
/// - `#[mapper(readonly)]` never writes the field.
/// - `#[mapper(skip)]` leaves the field out of the record, so its type need
///   not implement [`Field`].
#[cfg(feature = "derive")]
#[cfg_attr(docsrs, doc(cfg(feature = "derive")))]
pub use structmap_derive::Record;

static GLOBAL: Mapper = Mapper::new();

/// The process-wide mapper used by the free functions of this crate.
pub fn global() -> &'static Mapper {
    &GLOBAL
}

/// Maps `source` into `destination` with the [global](global) mapper.
///
/// See [`Mapper::map`].
pub fn map<S, D>(source: &S, destination: &mut D) -> Result<(), MapError>
where
    S: Field,
    D: Field,
{
    GLOBAL.map(source, destination)
}

/// Registers a converter on the [global](global) mapper.
///
/// See [`Mapper::register_converter`].
#[track_caller]
pub fn register_converter<A, B, F>(convert: F)
where
    A: Field + Clone,
    B: Field,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    GLOBAL.register_converter(convert);
}

/// Registers a fallible converter on the [global](global) mapper.
///
/// See [`Mapper::register_fallible_converter`].
#[track_caller]
pub fn register_fallible_converter<A, B, E, F>(convert: F)
where
    A: Field + Clone,
    B: Field,
    E: Into<BoxError> + 'static,
    F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
{
    GLOBAL.register_fallible_converter(convert);
}

// Not public API. Referenced by macro-generated code.
#[doc(hidden)]
pub mod __private {
    pub use crate::field::assign_clone;
}
