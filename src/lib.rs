//! Per-locale translation file management for PHP web projects.
//!
//! Translation namespaces live at `<root>/resources/lang/<locale>/<file>.php`
//! as PHP array literals. The [`i18n::Registry`] discovers locales and files,
//! caches loaded files, writes merged updates through a
//! [`file_store::TranslationStore`] and can fill missing values with
//! [`translation::GoogleTranslator`].

pub mod config;
pub mod error;
pub mod file_store;
pub mod i18n;
pub mod php;
pub mod translation;

pub use error::{Error, Result};
pub use php::Translations;
