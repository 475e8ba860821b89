#[cfg(feature = "std")]
use std::sync as impl_;

#[cfg(not(feature = "std"))]
use spin as impl_;

/// A read-write lock that never reports poisoning.
///
/// A lock poisoned by a panicking thread is entered anyway.
#[repr(transparent)]
pub(crate) struct Lock<T>(impl_::RwLock<T>);

#[repr(transparent)]
pub(crate) struct LockReadGuard<'a, T>(impl_::RwLockReadGuard<'a, T>);

#[repr(transparent)]
pub(crate) struct LockWriteGuard<'a, T>(impl_::RwLockWriteGuard<'a, T>);

impl<T> Lock<T> {
    #[must_use]
    pub(crate) const fn new(value: T) -> Self {
        Self(impl_::RwLock::new(value))
    }

    #[inline]
    pub(crate) fn read(&self) -> LockReadGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.read();

        #[cfg(feature = "std")]
        let guard = self.0.read().unwrap_or_else(std::sync::PoisonError::into_inner);

        LockReadGuard(guard)
    }

    #[inline]
    pub(crate) fn write(&self) -> LockWriteGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.write();

        #[cfg(feature = "std")]
        let guard = self.0.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        LockWriteGuard(guard)
    }
}

impl<T> core::ops::Deref for LockReadGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> core::ops::Deref for LockWriteGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> core::ops::DerefMut for LockWriteGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

/// A cell written at most once. Threads racing on an empty cell wait for the
/// first writer; under `std` they park instead of spinning.
///
/// Initializing a cell from inside its own initializer deadlocks or panics.
#[repr(transparent)]
pub(crate) struct OnceSlot<T>(
    #[cfg(feature = "std")] std::sync::OnceLock<T>,
    #[cfg(not(feature = "std"))] spin::Once<T>,
);

impl<T> OnceSlot<T> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        #[cfg(feature = "std")]
        let cell = std::sync::OnceLock::new();

        #[cfg(not(feature = "std"))]
        let cell = spin::Once::new();

        Self(cell)
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<&T> {
        self.0.get()
    }

    #[inline]
    pub(crate) fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
        #[cfg(feature = "std")]
        let value = self.0.get_or_init(f);

        #[cfg(not(feature = "std"))]
        let value = self.0.call_once(f);

        value
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_poisoned_lock_is_still_usable() {
        let lock = alloc::sync::Arc::new(Lock::new(1));
        let poisoner = alloc::sync::Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write();
            panic!("poison the lock");
        })
        .join();

        *lock.write() += 1;
        assert_eq!(*lock.read(), 2);
    }

    #[test]
    fn test_once_slot_waiters_see_first_value() {
        let slot = OnceSlot::new();
        let barrier = std::sync::Barrier::new(8);
        let values: alloc::vec::Vec<usize> = std::thread::scope(|scope| {
            let handles: alloc::vec::Vec<_> = (0..8)
                .map(|index| {
                    let slot = &slot;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        *slot.get_or_init(|| index)
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });
        assert!(values.iter().all(|value| *value == values[0]));
        assert_eq!(slot.get(), Some(&values[0]));
    }
}
