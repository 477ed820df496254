use std::collections::hash_map::Entry;
use std::hash::Hash;

use ahash::AHashMap;

/// Digest -> normalized text map where the first registration wins.
///
/// Has no lock of its own; the reporter keeps both registries behind its
/// state mutex.
#[derive(Debug)]
pub struct TextRegistry<K> {
    entries: AHashMap<K, String>,
}

impl<K> Default for TextRegistry<K> {
    fn default() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }
}

impl<K: Eq + Hash> TextRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `text` was stored, `false` if the key was already present.
    pub fn register(&mut self, key: K, text: &str) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(text.to_string());
                true
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Registered text, or the empty string when unregistered.
    pub fn resolve(&self, key: &K) -> String {
        self.get(key).map(str::to_string).unwrap_or_default()
    }

    pub fn is_resolved(&self, key: &K) -> bool {
        self.get(key).is_some_and(|text| !text.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_registration_wins() {
        let mut registry = TextRegistry::new();
        assert!(registry.register("d1", "select ?"));
        assert!(!registry.register("d1", "update t set a = ?"));
        assert_eq!(registry.get(&"d1"), Some("select ?"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_resolves_to_empty() {
        let registry: TextRegistry<&str> = TextRegistry::new();
        assert_eq!(registry.resolve(&"nope"), "");
        assert!(!registry.is_resolved(&"nope"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_text_is_registered_but_unresolved() {
        let mut registry = TextRegistry::new();
        assert!(registry.register("p1", ""));
        assert!(!registry.register("p1", "TableReader"));
        assert!(!registry.is_resolved(&"p1"));
    }
}
