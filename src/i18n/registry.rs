//! Locale/Module registry: discovers locales and translation files under a
//! project's lang directory, caches loaded files and writes updates back.
//!
//! A `Registry` is an explicit instance. It owns its project root, its cache,
//! its store and (optionally) one long-lived remote translator, so several
//! registries can coexist without sharing state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::file_store::{PhpFileStore, TranslationStore};
use crate::i18n::cache::TranslationCache;
use crate::i18n::language::{LanguageFile, Locale, Lookup, LANGUAGE_FILE_EXTENSION};
use crate::php::Translations;
use crate::translation::GoogleTranslator;

/// Build tooling summary of the module and the locales it manages.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub languages: BTreeMap<String, Locale>,
}

pub struct Registry<S = PhpFileStore> {
    store: S,
    translator: Option<GoogleTranslator>,
    cache: TranslationCache,
    project_root: Option<PathBuf>,
    /// Lang directory used while no project root is set
    default_lang_path: PathBuf,
}

impl Registry<PhpFileStore> {
    pub fn new(default_lang_path: impl Into<PathBuf>) -> Self {
        Self::with_store(PhpFileStore::new(), default_lang_path)
    }

    /// Build a registry from loaded configuration.
    ///
    /// The remote translator is only constructed when both a project id and
    /// a credentials path are configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new(&config.default_lang_path);
        registry.set_project_root_path(config.project_root.clone());

        match config.translator_config() {
            Some(translator_config) => {
                registry.translator = Some(GoogleTranslator::new(&translator_config)?);
            }
            None => debug!("Google Translate is not configured, remote translation disabled"),
        }

        Ok(registry)
    }
}

impl<S: TranslationStore> Registry<S> {
    pub fn with_store(store: S, default_lang_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            translator: None,
            cache: TranslationCache::new(),
            project_root: None,
            default_lang_path: default_lang_path.into(),
        }
    }

    pub fn with_translator(mut self, translator: GoogleTranslator) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Set the project root. `None` falls back to the default lang path.
    ///
    /// Cached files belong to the previous root, so changing it clears the cache.
    pub fn set_project_root_path(&mut self, root: Option<PathBuf>) {
        if self.project_root != root {
            self.cache.invalidate_all();
        }
        self.project_root = root;
    }

    pub fn project_root_path(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Base directory holding one subdirectory per locale.
    pub fn lang_path(&self) -> PathBuf {
        match &self.project_root {
            Some(root) => root.join("resources").join("lang"),
            None => self.default_lang_path.clone(),
        }
    }

    /// Every locale directory under the lang path, keyed by code.
    ///
    /// # Returns
    /// One `Locale` per subdirectory, carrying its language files.
    ///
    /// # Errors
    /// * `Error::NotFound` if the lang path does not exist
    /// * `Error::Io` if a directory cannot be read
    pub fn languages(&self) -> Result<BTreeMap<String, Locale>> {
        let base = self.lang_path();
        let entries = read_dir(&base, "locale root")?;

        let mut languages = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&base, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(code) = entry.file_name().to_str().map(str::to_string) else {
                warn!("Skipping non UTF-8 locale directory {}", path.display());
                continue;
            };

            let language_files = scan_language_files(&path)?;
            languages.insert(
                code.clone(),
                Locale {
                    code,
                    path,
                    language_files,
                },
            );
        }

        Ok(languages)
    }

    /// Translation files of one locale, keyed by name without extension.
    ///
    /// # Returns
    /// Every non-directory entry of the locale directory ending in `.php`.
    ///
    /// # Errors
    /// * `Error::UnsafePath` if `locale` is not a single directory name
    /// * `Error::NotFound` if the locale directory does not exist
    pub fn language_files(&self, locale: &str) -> Result<BTreeMap<String, LanguageFile>> {
        scan_language_files(&self.locale_path(locale)?)
    }

    /// Union of the keys of `file` across all locales.
    ///
    /// Locales are visited in code order and later locales overwrite values
    /// of earlier ones, so the values are only indicative: use it to discover
    /// keys, not to read a locale.
    pub fn language_file_keys(&self, file: &str) -> Result<Translations> {
        let mut keys = Translations::new();
        for locale in self.languages()?.values() {
            if let Some(language_file) = locale.language_files.get(file) {
                keys.extend(self.store.load(&language_file.path)?);
            }
        }
        Ok(keys)
    }

    /// Look up `key` in `file` for `locale`, loading and caching the file on first use.
    ///
    /// A missing locale or file is reported as [`Lookup::FileNotFound`] and is
    /// not cached, so it is picked up once it appears on disk.
    ///
    /// # Returns
    /// * `Lookup::Value` with the text if the key exists
    /// * `Lookup::KeyNotFound` if the file was loaded but lacks the key
    /// * `Lookup::FileNotFound` if the locale or file does not exist
    ///
    /// # Errors
    /// Returns `Error::Parse` or `Error::Io` if the file exists but cannot be loaded.
    pub fn get(&mut self, key: &str, file: &str, locale: &str) -> Result<Lookup> {
        let translations = match self.cache.get(file, locale) {
            Some(translations) => translations,
            None => {
                let Some(path) = self.resolve_language_file(file, locale)? else {
                    return Ok(Lookup::FileNotFound);
                };
                let loaded = self.store.load(&path)?;
                debug!(
                    "Cached {} keys from {} ({})",
                    loaded.len(),
                    path.display(),
                    locale
                );
                self.cache.insert(file, locale, loaded)
            }
        };

        Ok(match translations.get(key) {
            Some(value) => Lookup::Value(value.clone()),
            None => Lookup::KeyNotFound,
        })
    }

    /// Drop the cached copy of one file so the next lookup re-reads it.
    pub fn invalidate(&mut self, file: &str, locale: &str) -> bool {
        self.cache.invalidate(file, locale)
    }

    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
    }

    /// Create the locale directory (and a missing lang root). No-op if it exists.
    pub fn add_locale(&self, locale: &str) -> Result<()> {
        let dir = self.locale_path(locale)?;
        if dir.exists() {
            debug!("Locale {} already exists at {}", locale, dir.display());
            return Ok(());
        }

        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        info!("Added locale {} at {}", locale, dir.display());
        Ok(())
    }

    /// Recursively delete a locale directory. No-op if it does not exist.
    ///
    /// The directory must resolve (after following symlinks) to a strict
    /// descendant of the lang root, otherwise nothing is deleted. A locale
    /// that is itself a symlink only has the link removed, never its target.
    ///
    /// # Errors
    /// * `Error::UnsafePath` if `locale` is not a single directory name or
    ///   resolves outside the lang root
    /// * `Error::Io` if the deletion fails
    pub fn remove_locale(&mut self, locale: &str) -> Result<()> {
        let dir = self.locale_path(locale)?;
        if !dir.exists() {
            debug!("Locale {} does not exist, nothing to remove", locale);
            return Ok(());
        }

        let base = self.lang_path();
        let canonical_base = base.canonicalize().map_err(|e| Error::io(&base, e))?;
        let canonical_dir = dir.canonicalize().map_err(|e| Error::io(&dir, e))?;
        if canonical_dir == canonical_base || !canonical_dir.starts_with(&canonical_base) {
            warn!(
                "Refusing to remove {}: resolves to {} outside {}",
                dir.display(),
                canonical_dir.display(),
                canonical_base.display()
            );
            return Err(Error::UnsafePath {
                path: dir,
                reason: "locale directory is not inside the locale root",
            });
        }

        let metadata = fs::symlink_metadata(&dir).map_err(|e| Error::io(&dir, e))?;
        if metadata.file_type().is_symlink() {
            remove_symlink(&dir).map_err(|e| Error::io(&dir, e))?;
            info!(
                "Removed locale link {} (target {} kept)",
                dir.display(),
                canonical_dir.display()
            );
        } else {
            fs::remove_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
            info!("Removed locale {} ({})", locale, dir.display());
        }
        self.cache.invalidate_locale(locale);
        Ok(())
    }

    /// Machine translate `text` into `target_locale`, returning only the text.
    pub async fn translate(&self, text: &str, target_locale: &str) -> Result<String> {
        let translation = self.translator()?.translate(text, target_locale).await?;
        Ok(translation.text)
    }

    /// Merge `updates` into `<locale>/<file>.php`. No-op when `updates` is empty.
    ///
    /// The locale directory must already exist. The cached copy of the file is
    /// dropped after a successful write.
    ///
    /// # Errors
    /// * `Error::UnsafePath` if `file` or `locale` is not a single name
    /// * `Error::Parse` if the existing file cannot be read back
    /// * `Error::Io` if the locale directory is missing or the write fails
    pub fn save_translation_file(
        &mut self,
        file: &str,
        locale: &str,
        updates: &Translations,
    ) -> Result<()> {
        if updates.is_empty() {
            debug!("No updates for {} ({}), skipping write", file, locale);
            return Ok(());
        }

        let path = self.language_file_path(file, locale)?;
        self.store.save(&path, updates)?;
        self.cache.invalidate(file, locale);

        info!(
            "Saved {} translation(s) to {} ({})",
            updates.len(),
            file,
            locale
        );
        Ok(())
    }

    /// Fill the keys of `file` that `target_locale` lacks (or has empty) by
    /// machine translating the `source_locale` values.
    ///
    /// Creates the target locale when needed.
    ///
    /// # Returns
    /// How many keys were filled; `0` leaves the disk untouched.
    ///
    /// # Errors
    /// * `Error::TranslatorNotConfigured` if no remote translator is set
    /// * `Error::NotFound` if the source file does not exist
    /// * any remote failure, in which case nothing is written
    pub async fn translate_missing(
        &mut self,
        file: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<usize> {
        let translator = self.translator()?;

        let source = self.store.load(&self.language_file_path(file, source_locale)?)?;
        let target_path = self.language_file_path(file, target_locale)?;
        let existing = if target_path.is_file() {
            self.store.load(&target_path)?
        } else {
            Translations::new()
        };

        let mut updates = Translations::new();
        for (key, text) in &source {
            let already_translated = existing.get(key).is_some_and(|v| !v.is_empty());
            if already_translated || text.is_empty() {
                continue;
            }
            let translation = translator.translate(text, target_locale).await?;
            updates.insert(key.clone(), translation.text);
        }

        if updates.is_empty() {
            info!(
                "{} ({}) has no missing keys relative to {}",
                file, target_locale, source_locale
            );
            return Ok(0);
        }

        self.add_locale(target_locale)?;
        let filled = updates.len();
        self.save_translation_file(file, target_locale, &updates)?;
        info!(
            "Filled {} missing key(s) in {} ({}) from {}",
            filled, file, target_locale, source_locale
        );
        Ok(filled)
    }

    pub fn module_info(&self) -> Result<ModuleInfo> {
        Ok(ModuleInfo {
            name: "Translation",
            description: "Translation management module",
            languages: self.languages()?,
        })
    }

    fn translator(&self) -> Result<&GoogleTranslator> {
        self.translator.as_ref().ok_or(Error::TranslatorNotConfigured)
    }

    fn locale_path(&self, locale: &str) -> Result<PathBuf> {
        ensure_path_component(locale, "locale must be a single directory name")?;
        Ok(self.lang_path().join(locale))
    }

    fn language_file_path(&self, file: &str, locale: &str) -> Result<PathBuf> {
        ensure_path_component(file, "language file must be a single file name")?;
        Ok(self
            .locale_path(locale)?
            .join(format!("{}{}", file, LANGUAGE_FILE_EXTENSION)))
    }

    fn resolve_language_file(&self, file: &str, locale: &str) -> Result<Option<PathBuf>> {
        ensure_path_component(file, "language file must be a single file name")?;
        match self.language_files(locale) {
            Ok(files) => Ok(files.get(file).map(|f| f.path.clone())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// List the translation files of a locale directory.
fn scan_language_files(dir: &Path) -> Result<BTreeMap<String, LanguageFile>> {
    let entries = read_dir(dir, "locale directory")?;

    let mut files = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file) = file_name
            .to_str()
            .and_then(|name| LanguageFile::from_file_name(name, path.clone()))
        else {
            continue;
        };
        files.insert(file.name.clone(), file);
    }

    Ok(files)
}

#[cfg(windows)]
fn remove_symlink(path: &Path) -> std::io::Result<()> {
    // Directory symlinks are directories to the Windows filesystem API
    fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}

#[cfg(not(windows))]
fn remove_symlink(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path)
}

fn read_dir(path: &Path, what: &'static str) -> Result<fs::ReadDir> {
    fs::read_dir(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::not_found(what, path)
        } else {
            Error::io(path, e)
        }
    })
}

/// Reject names that are blank or would not stay one level below their parent.
fn ensure_path_component(name: &str, reason: &'static str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if name.trim().is_empty() || !single_normal || name.contains(['/', '\\']) {
        return Err(Error::UnsafePath {
            path: PathBuf::from(name),
            reason,
        });
    }
    Ok(())
}
