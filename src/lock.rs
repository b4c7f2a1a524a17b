#[cfg(feature = "std")]
use std::sync::{self as impl_, PoisonError};

#[cfg(not(feature = "std"))]
use spin as impl_;

/// Reader/writer lock guarding one of the registries owned by a
/// [`Mapper`](crate::Mapper).
///
/// The registry itself is created lazily on first write so that the lock can
/// be built in a `const` context.
#[repr(transparent)]
pub(crate) struct RegistryLock<T>(impl_::RwLock<Option<T>>);

#[repr(transparent)]
pub(crate) struct RegistryReadGuard<'a, T>(impl_::RwLockReadGuard<'a, Option<T>>);

#[repr(transparent)]
pub(crate) struct RegistryWriteGuard<'a, T>(impl_::RwLockWriteGuard<'a, Option<T>>);

impl<T> RegistryLock<T> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self(impl_::RwLock::new(None))
    }

    #[must_use]
    pub(crate) const fn with(value: T) -> Self {
        Self(impl_::RwLock::new(Some(value)))
    }

    #[inline]
    pub(crate) fn read(&self) -> RegistryReadGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.read();

        // No user code ever runs while the lock is held, so a poisoned lock
        // still holds a consistent registry.
        #[cfg(feature = "std")]
        let guard = self.0.read().unwrap_or_else(PoisonError::into_inner);

        RegistryReadGuard(guard)
    }

    #[inline]
    pub(crate) fn write(&self) -> RegistryWriteGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.write();

        #[cfg(feature = "std")]
        let guard = self.0.write().unwrap_or_else(PoisonError::into_inner);

        RegistryWriteGuard(guard)
    }
}

impl<T> RegistryReadGuard<'_, T> {
    #[inline]
    pub(crate) fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<T> RegistryWriteGuard<'_, T> {
    #[inline]
    pub(crate) fn get(&mut self) -> &mut Option<T> {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_registry() {
        let lock: RegistryLock<u32> = RegistryLock::new();
        assert!(lock.read().get().is_none());

        *lock.write().get().get_or_insert_default() += 2;
        assert_eq!(lock.read().get(), Some(&2));
    }

    #[test]
    fn test_prefilled_registry() {
        let lock = RegistryLock::with(7_u32);
        assert_eq!(lock.read().get(), Some(&7));
    }

    #[test]
    fn test_lock_send_sync() {
        static_assertions::assert_impl_all!(RegistryLock<u32>: Send, Sync);
    }
}
