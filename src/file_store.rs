//! Translation File Store: load, merge and persist one translation file.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::php::{self, PhpValue, Translations};

/// Persistence seam used by the registry.
///
/// The registry only ever goes through this trait, so tests can count or fake
/// disk access without touching the filesystem layout.
pub trait TranslationStore {
    /// Read the persisted key -> text mapping at `path`.
    fn load(&self, path: &Path) -> Result<Translations>;

    /// Merge `updates` over the mapping persisted at `path` (if any) and write
    /// the sorted result back, replacing the whole file.
    fn save(&self, path: &Path, updates: &Translations) -> Result<()>;
}

/// Store for `<locale>/<file>.php` translation files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhpFileStore;

impl PhpFileStore {
    pub fn new() -> Self {
        Self
    }
}

impl TranslationStore for PhpFileStore {
    fn load(&self, path: &Path) -> Result<Translations> {
        let source = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found("translation file", path)
            } else {
                Error::io(path, e)
            }
        })?;

        let value = php::parse(&source).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        match value {
            PhpValue::Array(_) => Ok(value.flatten()),
            _ => Err(Error::Parse {
                path: path.to_path_buf(),
                source: php::ParseError {
                    line: 1,
                    column: 1,
                    message: "file does not return an array".to_string(),
                },
            }),
        }
    }

    fn save(&self, path: &Path, updates: &Translations) -> Result<()> {
        let mut merged = if path.is_file() {
            self.load(path)?
        } else {
            Translations::new()
        };
        let previous = merged.len();

        merged.extend(updates.iter().map(|(k, v)| (k.clone(), v.clone())));

        fs::write(path, php::render_translations(&merged)).map_err(|e| Error::io(path, e))?;

        debug!(
            "Saved {} keys to {} ({} updated, {} new)",
            merged.len(),
            path.display(),
            updates.len() - (merged.len() - previous),
            merged.len() - previous
        );
        Ok(())
    }
}
