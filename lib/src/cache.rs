use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::error::Result;
use crate::molecule::Molecule;

/// Thread-safe intern cache of parsed molecules keyed by their whitespace-free complete formula
/// Reads don't block each other; the map is written only on a miss
#[derive(Debug, Default)]
pub struct MoleculeCache {
    data: RwLock<HashMap<String, Arc<Molecule>>>,
}
impl MoleculeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Molecule>> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(key).cloned()
    }

    /// Returns the cached molecule for `key`, parsing and inserting it with `parse` on a miss
    /// If two threads miss at the same time, the first inserted molecule wins and both get it
    pub fn get_or_try_insert<F>(&self, key: &str, parse: F) -> Result<Arc<Molecule>>
    where
        F: FnOnce() -> Result<Molecule>,
    {
        if let Some(molecule) = self.get(key) {
            trace!(key, "molecule cache hit");
            return Ok(molecule);
        }

        let molecule = Arc::new(parse()?);
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(data.entry(key.to_string()).or_insert(molecule)))
    }

    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.data.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn second_lookup_shares_the_molecule() {
        let cache = MoleculeCache::new();
        let a = cache
            .get_or_try_insert("H2O", || Molecule::complete_formula("H2O"))
            .unwrap();
        let b = cache
            .get_or_try_insert("H2O", || panic!("should not parse again"))
            .unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_parse_is_not_cached() {
        let cache = MoleculeCache::new();
        assert!(cache
            .get_or_try_insert("H2)", || Molecule::complete_formula("H2)"))
            .is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_access() {
        let cache = Arc::new(MoleculeCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache
                        .get_or_try_insert("Ca(NO3)2", || Molecule::complete_formula("Ca(NO3)2"))
                        .unwrap()
                })
            })
            .collect();

        let molecules: Vec<Arc<Molecule>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(cache.len(), 1);
        let cached = cache.get("Ca(NO3)2").unwrap();
        assert!(molecules.iter().all(|m| Arc::ptr_eq(m, &cached)));

        cache.clear();
        assert!(cache.is_empty());
    }
}
