//! Pairing of source and destination fields by name.

use alloc::vec::Vec;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::record::{FieldDescriptor, Shape};

/// A source field and the destination field it is copied into.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FieldPair {
    pub(crate) from: usize,
    pub(crate) to: usize,
    pub(crate) source: &'static FieldDescriptor,
    pub(crate) destination: &'static FieldDescriptor,
}

type KeyMap = IndexMap<&'static str, (usize, &'static FieldDescriptor), FxBuildHasher>;

/// Indexes `fields` by matching key. A key declared twice resolves to the
/// later field.
fn keys(fields: &'static [FieldDescriptor], keep: impl Fn(&FieldDescriptor) -> bool) -> KeyMap {
    let mut keys = KeyMap::default();
    for (index, field) in fields.iter().enumerate() {
        if keep(field) {
            keys.insert(field.key(), (index, field));
        }
    }
    keys
}

/// Pairs every settable destination field with the source field of the same
/// key, in destination declaration order.
pub(crate) fn match_fields(source: &'static Shape, destination: &'static Shape) -> Vec<FieldPair> {
    let sources = keys(source.fields(), |_| true);
    let destinations = keys(destination.fields(), FieldDescriptor::is_settable);

    destinations
        .values()
        .filter_map(|&(to, destination)| {
            let &(from, source) = sources.get(destination.key())?;
            Some(FieldPair {
                from,
                to,
                source,
                destination,
            })
        })
        .collect()
}

#[cfg(all(test, feature = "derive"))]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::Record;

    #[derive(Clone, Default, Record)]
    struct Source {
        id: u64,
        name: String,
        extra: bool,
        #[mapper(alias = "label")]
        title: String,
    }

    #[derive(Clone, Default, Record)]
    struct Destination {
        label: String,
        #[mapper(readonly)]
        id: u64,
        name: String,
        missing: i32,
    }

    #[derive(Clone, Default, Record)]
    struct Shadowed {
        first: i32,
        #[mapper(alias = "first")]
        second: i32,
    }

    fn pairs<A: Record + Default, B: Record + Default>() -> Vec<(&'static str, &'static str)> {
        match_fields(A::default().shape(), B::default().shape())
            .into_iter()
            .map(|pair| (pair.source.name(), pair.destination.name()))
            .collect()
    }

    #[test]
    fn test_match_in_destination_order() {
        assert_eq!(
            pairs::<Source, Destination>(),
            [("title", "label"), ("name", "name")]
        );
    }

    #[test]
    fn test_positions_follow_declarations() {
        let pairs = match_fields(Source::default().shape(), Destination::default().shape());
        assert_eq!((pairs[0].from, pairs[0].to), (3, 0));
        assert_eq!((pairs[1].from, pairs[1].to), (1, 2));
    }

    #[test]
    fn test_later_key_wins() {
        assert_eq!(pairs::<Shadowed, Shadowed>(), [("second", "second")]);
    }
}
