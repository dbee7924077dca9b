//! Slot table owning resources of one type
//!
//! Maps a [`Handle`] to storage, 1-based (index 0 is reserved for the empty
//! handle). `add` never reuses a live index; removed slots park in a
//! graveyard and only become reusable after an explicit [`recycle`] step,
//! which the renderer runs once per frame at present. `get` on a removed or
//! never-allocated handle is a programming error and panics.
//!
//! Single-threaded only: containers are owned and mutated exclusively by
//! the thread driving the frame loop.
//!
//! [`recycle`]: ResourceContainer::recycle

use std::marker::PhantomData;

use crate::renderer::handle::Handle;

/// Indexed mapping from `Handle<T>` to `R`
pub struct ResourceContainer<T, R> {
    /// slots[0] is always `None`; live handles index 1..
    slots: Vec<Option<R>>,
    /// Indices available for reuse
    free: Vec<u32>,
    /// Indices removed since the last recycle, not yet reusable
    graveyard: Vec<u32>,
    live: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T, R> ResourceContainer<T, R> {
    /// Create a new empty container
    pub fn new() -> Self {
        Self {
            slots: vec![None],
            free: Vec::new(),
            graveyard: Vec::new(),
            live: 0,
            _marker: PhantomData,
        }
    }

    /// Insert a resource, returning its handle.
    ///
    /// Never returns an index that is still referenced: freed indices only
    /// re-enter circulation through [`recycle`](Self::recycle).
    pub fn add(&mut self, resource: R) -> Handle<T> {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            debug_assert!(self.slots[index as usize].is_none());
            self.slots[index as usize] = Some(resource);
            Handle::from_raw(index)
        } else {
            self.slots.push(Some(resource));
            Handle::from_raw((self.slots.len() - 1) as u32)
        }
    }

    /// Borrow the resource behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is empty, out of range, or the slot was removed.
    pub fn get(&self, handle: Handle<T>) -> &R {
        assert!(handle.is_valid(), "empty handle");
        let index = handle.raw() as usize;
        assert!(index < self.slots.len(), "handle {} out of range", index);
        self.slots[index]
            .as_ref()
            .unwrap_or_else(|| panic!("use of removed resource slot {}", index))
    }

    /// Mutably borrow the resource behind a handle.
    ///
    /// # Panics
    ///
    /// Same conditions as [`get`](Self::get).
    pub fn get_mut(&mut self, handle: Handle<T>) -> &mut R {
        assert!(handle.is_valid(), "empty handle");
        let index = handle.raw() as usize;
        assert!(index < self.slots.len(), "handle {} out of range", index);
        self.slots[index]
            .as_mut()
            .unwrap_or_else(|| panic!("use of removed resource slot {}", index))
    }

    /// Whether the handle currently references a live resource
    pub fn contains(&self, handle: Handle<T>) -> bool {
        let index = handle.raw() as usize;
        handle.is_valid() && index < self.slots.len() && self.slots[index].is_some()
    }

    /// Remove a resource, invalidating its handle.
    ///
    /// The slot index becomes eligible for reuse only after the next
    /// [`recycle`](Self::recycle).
    ///
    /// # Panics
    ///
    /// Panics if the slot is already empty (double delete).
    pub fn remove(&mut self, handle: Handle<T>) -> R {
        assert!(handle.is_valid(), "empty handle");
        let index = handle.raw() as usize;
        assert!(index < self.slots.len(), "handle {} out of range", index);
        let resource = self.slots[index]
            .take()
            .unwrap_or_else(|| panic!("double remove of resource slot {}", index));
        self.live -= 1;
        self.graveyard.push(index as u32);
        resource
    }

    /// Move graveyarded indices to the free list.
    ///
    /// Called once per frame, after the frame's fence has signaled, so an
    /// index freed mid-frame can never be re-issued while the GPU may still
    /// reference it.
    pub fn recycle(&mut self) {
        self.free.append(&mut self.graveyard);
    }

    /// Run a teardown visitor on every live element, then empty the container
    pub fn clear_with<F: FnMut(R)>(&mut self, mut visitor: F) {
        for slot in self.slots.iter_mut().skip(1) {
            if let Some(resource) = slot.take() {
                visitor(resource);
            }
        }
        self.slots.truncate(1);
        self.free.clear();
        self.graveyard.clear();
        self.live = 0;
    }

    /// Number of live resources
    pub fn len(&self) -> u32 {
        self.live
    }

    /// Whether no resources are live
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate over live (handle, resource) pairs
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &R)> {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, slot)| slot.as_ref().map(|r| (Handle::from_raw(i as u32), r)))
    }
}

impl<T, R> Default for ResourceContainer<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
