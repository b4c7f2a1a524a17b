//! Strategy selection for a matched field pair.

use crate::{
    converter::ConverterRegistry, error::MapError, matcher::FieldPair, record::TypePair,
    strategy::Strategy,
};

/// Picks the strategy for `pair`, looking at the declared field types only.
///
/// A registered converter takes priority over every structural strategy.
/// Fixed-length sequences of different lengths can never be mapped and are
/// rejected here.
pub(crate) fn classify(converters: &ConverterRegistry, pair: &FieldPair) -> Result<Strategy, MapError> {
    let from = pair.source.field_type();
    let to = pair.destination.field_type();

    if let Some(converter) = converters.get(TypePair::new(from.type_id(), to.type_id())) {
        return Ok(Strategy::Converter(converter));
    }
    if from == to {
        return Ok(Strategy::Identical);
    }

    let (from_kind, to_kind) = (from.kind(), to.kind());
    if from_kind.is_record() && to_kind.is_record() {
        return Ok(Strategy::NestedRecord);
    }
    if from_kind.is_record_sequence() && to_kind.is_record_sequence() {
        if let (Some(from_len), Some(to_len)) = (from_kind.fixed_len(), to_kind.fixed_len())
            && from_len != to_len
        {
            return Err(MapError::LengthMismatch {
                field: Some(pair.destination.name()),
                from: from_len,
                to: to_len,
            });
        }
        return Ok(Strategy::Sequence);
    }
    Ok(Strategy::Unmappable)
}

#[cfg(all(test, feature = "derive"))]
mod tests {
    use alloc::{boxed::Box, string::String, vec::Vec};

    use super::*;
    use crate::{Record, converter, matcher::match_fields};

    #[derive(Clone, Default, Record)]
    struct Inner {
        value: i32,
    }

    #[derive(Clone, Default, Record)]
    struct OtherInner {
        value: i64,
    }

    #[derive(Clone, Default, Record)]
    struct Source {
        same: String,
        nested: Inner,
        boxed: Option<Box<Inner>>,
        list: Vec<Inner>,
        pair: [Inner; 2],
        number: i32,
        names: Vec<String>,
    }

    #[derive(Clone, Default, Record)]
    struct Destination {
        same: String,
        nested: Option<OtherInner>,
        boxed: OtherInner,
        list: [Option<OtherInner>; 2],
        pair: [OtherInner; 3],
        number: String,
        names: Vec<&'static str>,
    }

    fn strategies(converters: &ConverterRegistry) -> Vec<(&'static str, Result<Strategy, MapError>)> {
        match_fields(Source::default().shape(), Destination::default().shape())
            .iter()
            .map(|pair| (pair.destination.name(), classify(converters, pair)))
            .collect()
    }

    #[test]
    fn test_structural_strategies() {
        let converters = ConverterRegistry::new();
        let strategies = strategies(&converters);
        let names: Vec<_> = strategies.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["same", "nested", "boxed", "list", "pair", "number", "names"]);

        assert!(matches!(strategies[0].1, Ok(Strategy::Identical)));
        assert!(matches!(strategies[1].1, Ok(Strategy::NestedRecord)));
        assert!(matches!(strategies[2].1, Ok(Strategy::NestedRecord)));
        assert!(matches!(strategies[3].1, Ok(Strategy::Sequence)));
        assert!(matches!(
            strategies[4].1,
            Err(MapError::LengthMismatch {
                field: Some("pair"),
                from: 2,
                to: 3
            })
        ));
        assert!(matches!(strategies[5].1, Ok(Strategy::Unmappable)));
        assert!(matches!(strategies[6].1, Ok(Strategy::Unmappable)));
    }

    #[test]
    fn test_converter_takes_priority() {
        let converters = ConverterRegistry::new();
        let (key, number) = converter::infallible(|n: i32| alloc::format!("{n}"));
        converters.insert(key, number);
        let (key, same) = converter::infallible(|s: String| s);
        converters.insert(key, same);

        let strategies = strategies(&converters);
        assert!(matches!(strategies[0].1, Ok(Strategy::Converter(_))));
        assert!(matches!(strategies[5].1, Ok(Strategy::Converter(_))));
    }
}
