// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A small reuse pool.  Objects are checked out, reset by the caller,
//! used, and given back; when the pool is empty a fresh one is built
//! by the factory.  Checkout and return work from any thread.

use crossbeam::queue::SegQueue;

/// Pool of reusable `T`s.
pub struct Pool<T> {
    idle: SegQueue<T>,
    factory: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T> Pool<T> {
    /// An empty pool that builds new objects with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Pool {
            idle: SegQueue::new(),
            factory: Box::new(factory),
        }
    }

    /// Takes an idle object, or builds one.  The object still carries
    /// whatever state its last user left in it.
    pub fn checkout(&self) -> T {
        match self.idle.pop() {
            Some(obj) => obj,
            None => (self.factory)(),
        }
    }

    /// Returns an object for later reuse.
    pub fn give_back(&self, obj: T) {
        self.idle.push(obj);
    }

    /// Number of objects waiting to be reused.
    pub fn idle(&self) -> usize {
        self.idle.len()
    }
}

impl<T> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool").field("idle", &self.idle.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn reuses_returned_objects_before_building() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let pool = Pool::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Vec::<u8>::with_capacity(16)
        });

        let mut a = pool.checkout();
        a.push(1);
        pool.give_back(a);
        assert_eq!(pool.idle(), 1);

        let b = pool.checkout();
        assert_eq!(b, vec![1], "returned object comes back unreset");
        assert_eq!(built.load(Ordering::SeqCst), 1);

        let _c = pool.checkout();
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_checkout_and_return() {
        let pool = Pool::new(|| 0usize);
        crossbeam::scope(|s| {
            for _ in 0..8 {
                s.spawn(|_| {
                    for _ in 0..100 {
                        let n = pool.checkout();
                        pool.give_back(n + 1);
                    }
                });
            }
        })
        .unwrap();
        let mut total = 0;
        while pool.idle() > 0 {
            total += pool.checkout();
        }
        assert_eq!(total, 800);
    }
}
