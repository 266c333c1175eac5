//! Key/value persistence backends
//!
//! The game stores two things: the best score and the player's settings.
//! On the web both live in LocalStorage; natively (and in tests) they live in
//! a shared in-memory map.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Minimal string key/value store
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    /// Returns false if the backend rejected the write
    fn set(&mut self, key: &str, value: &str) -> bool;
    fn remove(&mut self, key: &str);
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&mut self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    inner: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn new() -> Self {
        let inner = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if inner.is_none() {
            log::warn!("LocalStorage unavailable - nothing will be persisted");
        }
        Self { inner }
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        match &self.inner {
            Some(storage) => storage.set_item(key, value).is_ok(),
            None => false,
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = &self.inner {
            let _ = storage.remove_item(key);
        }
    }
}

/// Storage backend for the current platform
#[cfg(target_arch = "wasm32")]
pub fn platform_storage() -> Box<dyn Storage> {
    Box::new(LocalStorage::new())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn platform_storage() -> Box<dyn Storage> {
    Box::new(MemoryStorage::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_clones_share_items() {
        let mut storage = MemoryStorage::new();
        let view = storage.clone();
        assert!(storage.set("k", "v"));
        assert_eq!(view.get("k").as_deref(), Some("v"));
        storage.remove("k");
        assert!(view.get("k").is_none());
    }
}
