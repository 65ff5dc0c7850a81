//! Maps shim-minted swap-chain handles to their records.
//!
//! The registry lives inside a session rather than in a process global;
//! access is serialized by whoever owns the session.

use std::collections::HashMap;

use crate::{ShimError, ShimResult};

/// Identity of a swap chain as the core knows it.
///
/// Handles are minted by the owning [`Registry`] and are never reused while
/// the registry lives, so a stale handle can only miss.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwapChainHandle(pub usize);

#[derive(Debug)]
pub struct Registry<T> {
    entries: HashMap<SwapChainHandle, T>,
    next_handle: usize,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Mint a handle no live or past entry has used.
    pub fn allocate_handle(&mut self) -> SwapChainHandle {
        let handle = SwapChainHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Insert `record`, replacing (and returning) any record already stored
    /// under `handle`.
    pub fn register(&mut self, handle: SwapChainHandle, record: T) -> Option<T> {
        self.entries.insert(handle, record)
    }

    pub fn lookup(&self, handle: SwapChainHandle) -> ShimResult<&T> {
        self.entries.get(&handle).ok_or(ShimError::InvalidHandle)
    }

    pub fn lookup_mut(&mut self, handle: SwapChainHandle) -> ShimResult<&mut T> {
        self.entries.get_mut(&handle).ok_or(ShimError::InvalidHandle)
    }

    /// Remove `handle`; absent handles are a no-op.
    pub fn remove(&mut self, handle: SwapChainHandle) -> Option<T> {
        self.entries.remove(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_lookup_remove() {
        let mut registry = Registry::new();
        let handle = registry.allocate_handle();
        assert!(registry.register(handle, "chain").is_none());
        assert_eq!(*registry.lookup(handle).unwrap(), "chain");
        assert_eq!(registry.remove(handle), Some("chain"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup_missing_is_invalid_handle() {
        let registry: Registry<u32> = Registry::new();
        assert!(matches!(
            registry.lookup(SwapChainHandle(7)),
            Err(ShimError::InvalidHandle)
        ));
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = Registry::new();
        let handle = registry.allocate_handle();
        registry.register(handle, 1);
        assert_eq!(registry.register(handle, 2), Some(1));
        assert_eq!(*registry.lookup(handle).unwrap(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut registry: Registry<u32> = Registry::new();
        assert!(registry.remove(SwapChainHandle(3)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handles_are_not_reused() {
        let mut registry = Registry::new();
        let first = registry.allocate_handle();
        registry.register(first, ());
        registry.remove(first);
        let second = registry.allocate_handle();
        assert_ne!(first, second);
        assert_ne!(first.0, 0);
    }

    #[test]
    fn test_lookup_mut() {
        let mut registry = Registry::new();
        let handle = registry.allocate_handle();
        registry.register(handle, 10);
        *registry.lookup_mut(handle).unwrap() += 1;
        assert_eq!(*registry.lookup(handle).unwrap(), 11);
    }
}
