use super::handle::HandleLike;
use super::handle_pool::HandlePool;

/// A named object collections. Every time u create or free a handle, a
/// attached instance `T` will be created/ freed.
pub struct ObjectPool<H: HandleLike, T: Sized> {
    handles: HandlePool<H>,
    entries: Vec<Option<T>>,
}

impl<H: HandleLike, T: Sized> Default for ObjectPool<H, T> {
    fn default() -> Self {
        ObjectPool::new()
    }
}

impl<H: HandleLike, T: Sized> ObjectPool<H, T> {
    pub fn new() -> Self {
        ObjectPool {
            handles: HandlePool::new(),
            entries: Vec::new(),
        }
    }

    /// Creates a `T` and named it with `Handle`.
    pub fn create(&mut self, value: T) -> H {
        let handle = self.handles.create();

        if handle.index() >= self.entries.len() as u32 {
            self.entries.push(Some(value));
        } else {
            self.entries[handle.index() as usize] = Some(value);
        }

        handle
    }

    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        if self.handles.is_alive(handle) {
            self.entries[handle.index() as usize].as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        self.handles.is_alive(handle)
    }

    /// Recycles the value with name `Handle`.
    pub fn free(&mut self, handle: H) -> Option<T> {
        if self.handles.free(handle) {
            self.entries[handle.index() as usize].take()
        } else {
            None
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::handle::Handle;

    #[test]
    fn create_and_free() {
        let mut pool: ObjectPool<Handle, &'static str> = ObjectPool::new();
        let a = pool.create("ping");
        let b = pool.create("pong");
        assert_eq!(pool.get(a), Some(&"ping"));
        assert_eq!(pool.free(a), Some("ping"));
        assert_eq!(pool.get(a), None);
        assert_eq!(pool.len(), 1);

        let c = pool.create("accum");
        assert_eq!(pool.get(c), Some(&"accum"));
        assert_eq!(pool.get(b), Some(&"pong"));
        assert_eq!(pool.free(a), None);
    }
}
