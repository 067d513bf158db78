use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::marker::PhantomData;

use super::handle::{HandleIndex, HandleLike};

#[derive(PartialEq, Eq)]
struct FreeIndex(HandleIndex);

impl PartialOrd for FreeIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FreeIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// `HandlePool` hands out typed handles with a continuous `index` field and
/// keeps track of which of them are still alive. Freed indices are recycled
/// lowest first.
pub struct HandlePool<H: HandleLike> {
    versions: Vec<HandleIndex>,
    frees: BinaryHeap<Reverse<FreeIndex>>,
    _phantom: PhantomData<H>,
}

impl<H: HandleLike> Default for HandlePool<H> {
    fn default() -> Self {
        HandlePool::new()
    }
}

impl<H: HandleLike> HandlePool<H> {
    pub fn new() -> Self {
        HandlePool {
            versions: Vec::new(),
            frees: BinaryHeap::new(),
            _phantom: PhantomData,
        }
    }

    /// Creates an unused handle. Alive handles always carry an odd version.
    pub fn create(&mut self) -> H {
        if let Some(Reverse(FreeIndex(index))) = self.frees.pop() {
            let index = index as usize;
            self.versions[index] += 1;
            H::new(index as HandleIndex, self.versions[index])
        } else {
            self.versions.push(1);
            H::new(self.versions.len() as HandleIndex - 1, 1)
        }
    }

    /// Returns true if `handle` was created by this pool and has not been freed yet.
    pub fn is_alive(&self, handle: H) -> bool {
        let index = handle.index() as usize;
        index < self.versions.len()
            && (self.versions[index] & 0x1) == 1
            && self.versions[index] == handle.version()
    }

    /// Recycles the index of `handle` and marks its version as dead.
    pub fn free(&mut self, handle: H) -> bool {
        if !self.is_alive(handle) {
            return false;
        }

        self.versions[handle.index() as usize] += 1;
        self.frees.push(Reverse(FreeIndex(handle.index())));
        true
    }

    /// Returns the number of alive handles.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len() - self.frees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::handle::Handle;

    #[test]
    fn recycle() {
        let mut pool: HandlePool<Handle> = HandlePool::new();
        let h1 = pool.create();
        let h2 = pool.create();
        assert_eq!(pool.len(), 2);

        assert!(pool.free(h1));
        assert!(!pool.free(h1));
        assert!(!pool.is_alive(h1));
        assert!(pool.is_alive(h2));

        let h3 = pool.create();
        assert_eq!(h3.index(), h1.index());
        assert!(h3.version() > h1.version());
        assert!(!pool.is_alive(h1));
        assert!(pool.is_alive(h3));
    }
}
