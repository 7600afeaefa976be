//! Locale and translation file management.
//!
//! # Architecture
//!
//! - `registry`: Entry point; discovers locales and files under a project's lang directory
//! - `language`: Descriptors for locales, language files and lookup results
//! - `cache`: In-memory `(file, locale)` cache with explicit invalidation
//!
//! # Example
//!
//! ```rust,ignore
//! use translation_module::i18n::{Lookup, Registry};
//!
//! let mut registry = Registry::new("resources/lang");
//! registry.set_project_root_path(Some("/srv/app".into()));
//!
//! registry.add_locale("fr")?;
//! match registry.get("welcome", "messages", "fr")? {
//!     Lookup::Value(text) => println!("{text}"),
//!     Lookup::KeyNotFound => println!("untranslated"),
//!     Lookup::FileNotFound => println!("no messages.php for fr"),
//! }
//! ```

mod cache;
mod language;
mod registry;

pub use cache::{CacheKey, TranslationCache};
pub use language::{LanguageFile, Locale, Lookup, LANGUAGE_FILE_EXTENSION};
pub use registry::{ModuleInfo, Registry};
