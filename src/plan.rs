//! Mapping plans and the cache that holds them.
//!
//! A plan is the ordered list of steps that maps one record type into
//! another. It only depends on the two record shapes and on the converters
//! registered when it was built, so it is built once per type pair and
//! replayed for every later call. Zero checks happen at replay time.

use alloc::vec::Vec;

use hashbrown::{HashMap, hash_map::Entry};
use rustc_hash::FxBuildHasher;
use triomphe::Arc;

use crate::{
    classify::classify,
    converter::ConverterRegistry,
    error::MapError,
    lock::RegistryLock,
    mapper::Mapper,
    matcher::{FieldPair, match_fields},
    record::{Record, Shape, TypePair},
    strategy::Strategy,
};

#[derive(Debug)]
pub(crate) struct Step {
    pair: FieldPair,
    strategy: Strategy,
}

#[derive(Debug)]
pub(crate) struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    /// Matches the fields of `from` and `to` and classifies every pair.
    pub(crate) fn build(
        converters: &ConverterRegistry,
        from: &'static Shape,
        to: &'static Shape,
    ) -> Result<Self, MapError> {
        let steps = match_fields(from, to)
            .into_iter()
            .map(|pair| {
                Ok(Step {
                    strategy: classify(converters, &pair)?,
                    pair,
                })
            })
            .collect::<Result<Vec<_>, MapError>>()?;
        Ok(Self { steps })
    }

    pub(crate) fn len(&self) -> usize {
        self.steps.len()
    }

    /// Runs every step whose source value is not zero, in order. The first
    /// failure aborts the remaining steps.
    pub(crate) fn execute(
        &self,
        mapper: &Mapper,
        source: &dyn Record,
        destination: &mut dyn Record,
    ) -> Result<(), MapError> {
        for step in &self.steps {
            let (Some(from), Some(to)) = (source.field(step.pair.from), destination.field_mut(step.pair.to))
            else {
                continue;
            };
            if from.is_zero() {
                continue;
            }
            step.strategy.apply(mapper, &step.pair, from, to)?;
        }
        Ok(())
    }
}

type PlanMap = HashMap<TypePair, Arc<Plan>, FxBuildHasher>;

/// Plans keyed by source and destination record type.
pub(crate) struct PlanCache(RegistryLock<PlanMap>);

impl PlanCache {
    pub(crate) const fn new() -> Self {
        Self(RegistryLock::new())
    }

    /// The cached plan for `key`. The lock is released before returning.
    pub(crate) fn get(&self, key: TypePair) -> Option<Arc<Plan>> {
        self.0.read().get()?.get(&key).cloned()
    }

    /// Stores `plan` unless another call already cached one for `key`, in
    /// which case the existing plan is kept and `plan` is handed back so it
    /// is dropped after the lock is released.
    pub(crate) fn install(&self, key: TypePair, plan: Plan) -> Option<Plan> {
        match self.0.write().get().get_or_insert_default().entry(key) {
            Entry::Occupied(_) => Some(plan),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(plan));
                None
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.0.read().get().map_or(0, HashMap::len)
    }
}
