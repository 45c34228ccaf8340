//! Arena of boundary-owned objects addressed by opaque tokens.
//!
//! A [`Handle`] packs three fields into a `u64`:
//!
//! ```text
//! 63      56 55              32 31                 0
//! ┌─────────┬──────────────────┬────────────────────┐
//! │  kind   │    generation    │      slot + 1      │
//! └─────────┴──────────────────┴────────────────────┘
//! ```
//!
//! The slot generation is bumped on every release, so a released token is
//! rejected instead of reaching freed memory, and the kind tag rejects a
//! handle passed to a function for a different resource kind. Handle `0` is
//! never issued.
//!
//! Values are stored as `Arc<T>` so readers take a snapshot and drop the
//! lock before doing any work. Writers replace the whole value.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

const SLOT_MASK: u64 = 0xFFFF_FFFF;
const GENERATION_SHIFT: u32 = 32;
const GENERATION_MASK: u32 = 0x00FF_FFFF;
const KIND_SHIFT: u32 = 56;

/// Opaque token referencing a registry slot.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Handle(pub u64);

impl Handle {
    /// The null handle, never issued by a registry.
    pub const NULL: Handle = Handle(0);

    fn compose(kind: u8, generation: u32, slot: u32) -> Self {
        Handle(
            ((kind as u64) << KIND_SHIFT)
                | (((generation & GENERATION_MASK) as u64) << GENERATION_SHIFT)
                | (slot as u64 + 1),
        )
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Kind tag of the registry that issued this handle.
    pub fn kind(self) -> u8 {
        (self.0 >> KIND_SHIFT) as u8
    }

    fn generation(self) -> u32 {
        (self.0 >> GENERATION_SHIFT) as u32 & GENERATION_MASK
    }

    fn slot(self) -> Option<usize> {
        match self.0 & SLOT_MASK {
            0 => None,
            n => Some(n as usize - 1),
        }
    }
}

/// Errors raised when resolving a handle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("null {kind} handle")]
    Null { kind: &'static str },

    #[error("handle {handle:#x} is not a {kind} handle")]
    WrongKind { kind: &'static str, handle: u64 },

    #[error("{kind} handle {handle:#x} was released or never issued")]
    Stale { kind: &'static str, handle: u64 },

    #[error("{kind} registry is full")]
    Exhausted { kind: &'static str },
}

struct Slot<T> {
    generation: u32,
    value: Option<Arc<T>>,
}

struct Slots<T> {
    entries: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

/// Thread-safe arena for one resource kind.
pub struct HandleRegistry<T> {
    kind: u8,
    name: &'static str,
    slots: RwLock<Slots<T>>,
}

impl<T> HandleRegistry<T> {
    /// Create an empty registry. `kind` must be non-zero and distinct per
    /// registry; `name` is used in error messages.
    pub fn new(kind: u8, name: &'static str) -> Self {
        debug_assert!(kind != 0, "kind tag 0 is reserved");
        Self {
            kind,
            name,
            slots: RwLock::new(Slots {
                entries: Vec::new(),
                free: Vec::new(),
                live: 0,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.slots.read().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `value` and issue a new handle for it.
    pub fn insert(&self, value: T) -> Result<Handle, RegistryError> {
        let value = Arc::new(value);
        let mut slots = self.slots.write();

        let handle = if let Some(slot) = slots.free.pop() {
            let entry = &mut slots.entries[slot as usize];
            entry.value = Some(value);
            Handle::compose(self.kind, entry.generation, slot)
        } else {
            let slot = u32::try_from(slots.entries.len())
                .ok()
                .filter(|slot| *slot < u32::MAX)
                .ok_or(RegistryError::Exhausted { kind: self.name })?;
            slots.entries.push(Slot {
                generation: 0,
                value: Some(value),
            });
            Handle::compose(self.kind, 0, slot)
        };
        slots.live += 1;

        tracing::trace!(kind = self.name, handle = handle.0, "handle issued");
        Ok(handle)
    }

    /// Snapshot of the value behind `handle`.
    pub fn get(&self, handle: Handle) -> Result<Arc<T>, RegistryError> {
        let slot = self.check(handle)?;
        let slots = self.slots.read();
        slots
            .entries
            .get(slot)
            .filter(|entry| entry.generation == handle.generation())
            .and_then(|entry| entry.value.clone())
            .ok_or(self.stale(handle))
    }

    /// Returns true if `handle` currently resolves in this registry.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_ok()
    }

    /// Replace the value behind `handle`. Snapshots taken before the call
    /// keep the old value alive until they are dropped.
    pub fn replace(&self, handle: Handle, value: T) -> Result<(), RegistryError> {
        let slot = self.check(handle)?;
        let previous = {
            let mut slots = self.slots.write();
            let entry = slots
                .entries
                .get_mut(slot)
                .filter(|entry| entry.generation == handle.generation() && entry.value.is_some())
                .ok_or(self.stale(handle))?;
            entry.value.replace(Arc::new(value))
        };
        drop(previous);
        Ok(())
    }

    /// Mutate the value behind `handle` in place.
    ///
    /// If a snapshot of the value is still held elsewhere the value is
    /// cloned first, so held snapshots never observe the change.
    pub fn update<R>(&self, handle: Handle, f: impl FnOnce(&mut T) -> R) -> Result<R, RegistryError>
    where
        T: Clone,
    {
        let slot = self.check(handle)?;
        let mut slots = self.slots.write();
        let entry = slots
            .entries
            .get_mut(slot)
            .filter(|entry| entry.generation == handle.generation())
            .and_then(|entry| entry.value.as_mut())
            .ok_or(self.stale(handle))?;
        Ok(f(Arc::make_mut(entry)))
    }

    /// Release `handle`. The token is stale afterwards; releasing it again
    /// returns [`RegistryError::Stale`].
    pub fn remove(&self, handle: Handle) -> Result<Arc<T>, RegistryError> {
        let slot = self.check(handle)?;
        let removed = {
            let mut guard = self.slots.write();
            let slots = &mut *guard;
            let entry = slots
                .entries
                .get_mut(slot)
                .filter(|entry| entry.generation == handle.generation())
                .ok_or(self.stale(handle))?;
            let value = entry.value.take().ok_or(self.stale(handle))?;
            entry.generation = entry.generation.wrapping_add(1) & GENERATION_MASK;
            slots.free.push(slot as u32);
            slots.live -= 1;
            value
        };

        tracing::trace!(kind = self.name, handle = handle.0, "handle released");
        Ok(removed)
    }

    fn check(&self, handle: Handle) -> Result<usize, RegistryError> {
        if handle.is_null() {
            return Err(RegistryError::Null { kind: self.name });
        }
        if handle.kind() != self.kind {
            return Err(RegistryError::WrongKind {
                kind: self.name,
                handle: handle.0,
            });
        }
        handle.slot().ok_or(self.stale(handle))
    }

    fn stale(&self, handle: Handle) -> RegistryError {
        RegistryError::Stale {
            kind: self.name,
            handle: handle.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_and_get() {
        let registry = HandleRegistry::new(1, "buffer");
        let handle = registry.insert(vec![1u8, 2, 3]).unwrap();
        assert!(!handle.is_null());
        assert_eq!(handle.kind(), 1);
        assert_eq!(*registry.get(handle).unwrap(), vec![1, 2, 3]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_null_handle_is_rejected() {
        let registry: HandleRegistry<u32> = HandleRegistry::new(1, "buffer");
        assert_eq!(
            registry.get(Handle::NULL).unwrap_err(),
            RegistryError::Null { kind: "buffer" }
        );
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let buffers = HandleRegistry::new(1, "buffer");
        let mats: HandleRegistry<u32> = HandleRegistry::new(2, "matrix");
        let handle = buffers.insert(7u32).unwrap();
        assert!(matches!(
            mats.get(handle),
            Err(RegistryError::WrongKind { kind: "matrix", .. })
        ));
    }

    #[test]
    fn test_released_handle_is_stale() {
        let registry = HandleRegistry::new(1, "buffer");
        let handle = registry.insert(5u32).unwrap();
        assert_eq!(*registry.remove(handle).unwrap(), 5);
        assert!(matches!(registry.get(handle), Err(RegistryError::Stale { .. })));
        assert!(matches!(registry.remove(handle), Err(RegistryError::Stale { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_slot_reuse_keeps_old_token_stale() {
        let registry = HandleRegistry::new(1, "buffer");
        let first = registry.insert(1u32).unwrap();
        registry.remove(first).unwrap();
        let second = registry.insert(2u32).unwrap();

        assert_ne!(first, second);
        assert_eq!(first.slot(), second.slot());
        assert!(registry.get(first).is_err());
        assert_eq!(*registry.get(second).unwrap(), 2);
    }

    #[test]
    fn test_replace_keeps_snapshot() {
        let registry = HandleRegistry::new(1, "buffer");
        let handle = registry.insert(String::from("old")).unwrap();
        let snapshot = registry.get(handle).unwrap();
        registry.replace(handle, String::from("new")).unwrap();
        assert_eq!(snapshot.as_str(), "old");
        assert_eq!(registry.get(handle).unwrap().as_str(), "new");
    }

    #[test]
    fn test_update_in_place() {
        let registry = HandleRegistry::new(1, "buffer");
        let handle = registry.insert(vec![1u8]).unwrap();
        let len = registry
            .update(handle, |v| {
                v.push(2);
                v.len()
            })
            .unwrap();
        assert_eq!(len, 2);
        assert_eq!(*registry.get(handle).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_unissued_slot_is_stale() {
        let registry: HandleRegistry<u32> = HandleRegistry::new(3, "contour");
        let forged = Handle::compose(3, 0, 41);
        assert!(matches!(registry.get(forged), Err(RegistryError::Stale { .. })));
    }
}
