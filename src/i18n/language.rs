//! Locale and language file descriptors discovered on disk.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// Extension of persisted translation files, including the dot.
pub const LANGUAGE_FILE_EXTENSION: &str = ".php";

/// A locale directory under the lang root (e.g. `resources/lang/fr`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locale {
    /// Directory name, used as the locale code
    pub code: String,
    pub path: PathBuf,
    /// Translation namespaces in this locale, keyed by display name
    pub language_files: BTreeMap<String, LanguageFile>,
}

/// One translation namespace file inside a locale (e.g. `messages.php`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageFile {
    /// File name without the extension
    pub name: String,
    pub path: PathBuf,
}

impl LanguageFile {
    /// Build a descriptor from a directory entry name, if it carries the translation extension.
    pub fn from_file_name(file_name: &str, path: PathBuf) -> Option<Self> {
        let name = file_name.strip_suffix(LANGUAGE_FILE_EXTENSION)?;
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            path,
        })
    }
}

/// Outcome of a single translation lookup.
///
/// Keeps "the file could not be loaded" apart from "the file has no such key".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The locale or the language file does not exist
    FileNotFound,
    /// The file was loaded but does not contain the key
    KeyNotFound,
    Value(String),
}

impl Lookup {
    pub fn value(&self) -> Option<&str> {
        match self {
            Lookup::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            Lookup::Value(v) => Some(v),
            _ => None,
        }
    }
}
