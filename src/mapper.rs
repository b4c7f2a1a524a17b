use core::{any::type_name, fmt};

use triomphe::Arc;

use crate::{
    converter::{self, ConverterMap, ConverterRegistry, UntypedConverter},
    error::{BoxError, MapError},
    field::Field,
    plan::{Plan, PlanCache},
    record::{Record, TypePair},
    strategy::{self, Site},
};

/// Copies fields between structurally similar records.
///
/// A mapper owns a converter registry and a cache of mapping plans. It is
/// `Send + Sync` and is meant to be shared: concurrent calls to
/// [`map`](Self::map) and concurrent converter registrations are safe.
///
/// ```
/// use structmap::{Mapper, Record};
///
/// #[derive(Clone, Default, Record)]
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// #[derive(Clone, Default, Record)]
/// struct UserView {
///     name: String,
///     age: String,
/// }
///
/// let mapper = Mapper::new();
/// mapper.register_converter(|age: u32| age.to_string());
///
/// let mut view = UserView::default();
/// mapper.map(&User { name: "ana".into(), age: 31 }, &mut view)?;
/// assert_eq!(view.age, "31");
/// # Ok::<(), structmap::MapError>(())
/// ```
pub struct Mapper {
    converters: ConverterRegistry,
    plans: PlanCache,
    cache_plans: bool,
}

impl Mapper {
    /// Creates a mapper with no converters and plan caching enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            converters: ConverterRegistry::new(),
            plans: PlanCache::new(),
            cache_plans: true,
        }
    }

    /// Returns a builder to configure a mapper before first use.
    #[must_use]
    pub fn builder() -> MapperBuilder {
        MapperBuilder::new()
    }

    /// Registers a conversion from `A` to `B`, replacing any converter
    /// previously registered for that pair.
    ///
    /// The converter is used for every matched field pair whose source has
    /// type `A` and whose destination has type `B`, ahead of any structural
    /// strategy. Plans already cached keep the strategy they were built
    /// with.
    #[track_caller]
    pub fn register_converter<A, B, F>(&self, convert: F)
    where
        A: Field + Clone,
        B: Field,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let (key, converter) = converter::infallible(convert);
        self.install_converter(key, converter);
    }

    /// Registers a conversion from `A` to `B` that can fail.
    ///
    /// A failure aborts the mapping call with [`MapError::Converter`], which
    /// carries the returned error as its source.
    #[track_caller]
    pub fn register_fallible_converter<A, B, E, F>(&self, convert: F)
    where
        A: Field + Clone,
        B: Field,
        E: Into<BoxError> + 'static,
        F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
    {
        let (key, converter) = converter::fallible(convert);
        self.install_converter(key, converter);
    }

    fn install_converter(&self, key: TypePair, converter: Arc<dyn UntypedConverter>) {
        tracing::debug!(converter = %&*converter, "registering converter");
        if let Some(previous) = self.converters.insert(key, converter) {
            tracing::debug!(previous = %&*previous, "replaced converter");
        }
    }

    /// Copies the matching fields of `source` into `destination`.
    ///
    /// Both arguments must be records (or optional records), or sequences of
    /// them. Fields are matched by name or alias. Zero source values are
    /// skipped and destination fields without a match keep their value.
    ///
    /// # Errors
    ///
    /// - [`MapError::NotAReference`] if either argument is not record-like.
    /// - [`MapError::MissingConverter`] if a non-zero source field cannot be
    ///   copied into the matched destination field.
    /// - [`MapError::Converter`] if a converter fails.
    /// - [`MapError::LengthMismatch`] if a fixed-length destination sequence
    ///   cannot hold the source sequence.
    ///
    /// Fields copied before a failure stay copied.
    pub fn map<S, D>(&self, source: &S, destination: &mut D) -> Result<(), MapError>
    where
        S: Field,
        D: Field,
    {
        let site = Site::Call {
            from: type_name::<S>(),
            to: type_name::<D>(),
        };
        let (from, to) = (S::kind(), D::kind());
        if from.is_record() && to.is_record() {
            return strategy::map_nested(self, site, source, destination);
        }
        if from.is_record_sequence() && to.is_record_sequence() {
            return match (source.as_sequence(), destination.as_sequence_mut()) {
                (Some(from), Some(to)) => strategy::map_sequence(self, site, from, to),
                _ => Err(site.unsupported()),
            };
        }
        Err(site.unsupported())
    }

    /// Maps `source` into `destination` through the plan for their types,
    /// building and caching it on first use.
    pub(crate) fn map_records(
        &self,
        source: &dyn Record,
        destination: &mut dyn Record,
    ) -> Result<(), MapError> {
        let (from, to) = (source.shape(), destination.shape());
        let key = TypePair::new(from.type_id(), to.type_id());

        if let Some(plan) = self.plans.get(key) {
            tracing::trace!(from = from.name(), to = to.name(), "replaying cached plan");
            return plan.execute(self, source, destination);
        }

        let plan = Plan::build(&self.converters, from, to)?;
        plan.execute(self, source, destination)?;

        if self.cache_plans {
            tracing::debug!(
                from = from.name(),
                to = to.name(),
                steps = plan.len(),
                "caching plan"
            );
            let rejected = self.plans.install(key, plan);
            if rejected.is_some() {
                tracing::trace!(from = from.name(), to = to.name(), "plan already cached");
            }
        }
        Ok(())
    }

    /// Number of plans currently cached.
    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }

    /// Calls `f` with a description of every registered converter: its
    /// name, the types it converts between, and where it was registered.
    ///
    /// The registry is not locked while `f` runs.
    pub fn debug_converters(&self, mut f: impl FnMut(&dyn fmt::Display)) {
        for converter in self.converters.snapshot() {
            f(&*converter);
        }
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("converters", &self.converters.snapshot().len())
            .field("cached_plans", &self.cached_plans())
            .field("cache_plans", &self.cache_plans)
            .finish()
    }
}

/// Builder for a [`Mapper`] with converters registered up front.
///
/// ```
/// use structmap::Mapper;
///
/// let mapper = Mapper::builder()
///     .converter(|n: i32| n.to_string())
///     .fallible_converter(|s: String| s.parse::<i32>())
///     .cache_plans(false)
///     .build();
/// # drop(mapper);
/// ```
pub struct MapperBuilder {
    converters: ConverterMap,
    cache_plans: bool,
}

impl MapperBuilder {
    /// Creates a builder with no converters and plan caching enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            converters: ConverterMap::default(),
            cache_plans: true,
        }
    }

    /// Adds an infallible converter. See [`Mapper::register_converter`].
    #[must_use]
    #[track_caller]
    pub fn converter<A, B, F>(mut self, convert: F) -> Self
    where
        A: Field + Clone,
        B: Field,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let (key, converter) = converter::infallible(convert);
        self.converters.insert(key, converter);
        self
    }

    /// Adds a fallible converter. See
    /// [`Mapper::register_fallible_converter`].
    #[must_use]
    #[track_caller]
    pub fn fallible_converter<A, B, E, F>(mut self, convert: F) -> Self
    where
        A: Field + Clone,
        B: Field,
        E: Into<BoxError> + 'static,
        F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
    {
        let (key, converter) = converter::fallible(convert);
        self.converters.insert(key, converter);
        self
    }

    /// Enables or disables the plan cache. When disabled, a plan is built for
    /// every record mapped.
    #[must_use]
    pub fn cache_plans(mut self, cache_plans: bool) -> Self {
        self.cache_plans = cache_plans;
        self
    }

    /// Creates the configured mapper.
    #[must_use]
    pub fn build(self) -> Mapper {
        Mapper {
            converters: ConverterRegistry::with(self.converters),
            plans: PlanCache::new(),
            cache_plans: self.cache_plans,
        }
    }
}

impl Default for MapperBuilder {
    fn default() -> Self {
        Self::new()
    }
}
