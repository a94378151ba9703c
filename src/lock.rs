use core::{
    cell::UnsafeCell,
    sync::atomic::AtomicBool,
    sync::atomic::Ordering::*,
    future::poll_fn,
    task::Poll,
    ops::{Deref, DerefMut},
    };

/**
    serializes operations on one bus

    the bus allows a single operation in flight, concurrent callers queue here instead of
    interleaving their pulse trains.
*/
pub struct BusLock<T> {
    value: UnsafeCell<T>,
    taken: AtomicBool,
}
// SAFETY: the guard hands out the only reference to the value, the acquire/release pair
// on `taken` orders the handovers between tasks
unsafe impl<T: Send> Sync for BusLock<T> {}

impl<T> BusLock<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
            taken: AtomicBool::new(false),
        }
    }
    pub fn try_lock(&self) -> Option<BusLockGuard<'_, T>> {
        if self.taken.swap(true, Acquire)
            {None}
        else
            {Some(BusLockGuard {lock: self})}
    }
    /// wait for the previous operation to release the bus
    pub async fn lock(&self) -> BusLockGuard<'_, T> {
        poll_fn(|context| match self.try_lock() {
            Some(guard) => Poll::Ready(guard),
            None => {
                // stay scheduled, the holder has no handle to wake us
                context.waker().wake_by_ref();
                Poll::Pending
            }
            }).await
    }
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

pub struct BusLockGuard<'m, T> {
    lock: &'m BusLock<T>,
}
impl<T> Deref for BusLockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe {& *self.lock.value.get()}
    }
}
impl<T> DerefMut for BusLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe {&mut *self.lock.value.get()}
    }
}
impl<T> Drop for BusLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.taken.store(false, Release);
    }
}
