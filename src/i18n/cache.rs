//! In-memory cache of loaded translation files.

use std::collections::HashMap;
use std::sync::Arc;

use crate::php::Translations;

/// Identifies one translation file of one locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub file: String,
    pub locale: String,
}

impl CacheKey {
    pub fn new(file: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            locale: locale.into(),
        }
    }
}

/// Loaded mappings keyed by `(file, locale)`.
///
/// Entries are never refreshed on their own: writes made outside the owning
/// registry stay invisible until the entry is invalidated.
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: HashMap<CacheKey, Arc<Translations>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file: &str, locale: &str) -> Option<Arc<Translations>> {
        self.entries.get(&CacheKey::new(file, locale)).cloned()
    }

    pub fn contains(&self, file: &str, locale: &str) -> bool {
        self.entries.contains_key(&CacheKey::new(file, locale))
    }

    pub fn insert(
        &mut self,
        file: &str,
        locale: &str,
        translations: Translations,
    ) -> Arc<Translations> {
        let translations = Arc::new(translations);
        self.entries
            .insert(CacheKey::new(file, locale), Arc::clone(&translations));
        translations
    }

    /// Drop one `(file, locale)` entry. Returns whether it was cached.
    pub fn invalidate(&mut self, file: &str, locale: &str) -> bool {
        self.entries.remove(&CacheKey::new(file, locale)).is_some()
    }

    /// Drop every entry belonging to `locale`.
    pub fn invalidate_locale(&mut self, locale: &str) {
        self.entries.retain(|key, _| key.locale != locale);
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
