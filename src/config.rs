use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::php::{self, PhpValue};
use crate::translation::{TranslatorConfig, DEFAULT_API_URL};

/// Location of the published config file, relative to the project root
pub const PUBLISHED_CONFIG_PATH: &str = "config/translation.php";

/// Packaged default written by [`publish_default_config`]
pub const DEFAULT_CONFIG: &str = r#"<?php

return [

    /*
    |--------------------------------------------------------------------------
    | Google Cloud Translation
    |--------------------------------------------------------------------------
    |
    | Only needed where missing translations are generated (build tooling).
    | `credentials` points to a file holding an API key, or a JSON object
    | with an `api_key` or `access_token` field.
    |
    */

    'google_translate' => [
        'project_id' => '',
        'credentials' => '',
    ],

];
"#;

#[derive(Debug, Clone)]
pub struct Config {
    // Project layout
    pub project_root: Option<PathBuf>,
    pub default_lang_path: PathBuf,

    // Google Translate
    pub google_project_id: Option<String>,
    pub google_credentials: Option<PathBuf>,
    pub google_api_url: String,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let google_api_url = non_empty_var("GOOGLE_TRANSLATE_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        reqwest::Url::parse(&google_api_url).with_context(|| {
            format!("GOOGLE_TRANSLATE_API_URL is not a valid URL: {}", google_api_url)
        })?;

        Ok(Self {
            // Project layout
            project_root: non_empty_var("TRANSLATION_PROJECT_ROOT").map(PathBuf::from),
            default_lang_path: non_empty_var("TRANSLATION_LANG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("resources/lang")),

            // Google Translate
            google_project_id: non_empty_var("GOOGLE_TRANSLATE_PROJECT_ID"),
            google_credentials: non_empty_var("GOOGLE_TRANSLATE_CREDENTIALS")
                .or_else(|| non_empty_var("GOOGLE_APPLICATION_CREDENTIALS"))
                .map(PathBuf::from),
            google_api_url,
        })
    }

    /// Where the published config file lives for this project.
    pub fn published_config_path(&self) -> PathBuf {
        self.project_root
            .as_deref()
            .unwrap_or(Path::new(""))
            .join(PUBLISHED_CONFIG_PATH)
    }

    /// Fill settings the environment left unset from a published config file.
    ///
    /// A missing file is not an error. Relative credential paths are resolved
    /// against the project root when one is set.
    pub fn with_published_config(mut self, path: &Path) -> Result<Self> {
        if !path.is_file() {
            debug!("No published config at {}", path.display());
            return Ok(self);
        }

        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let value = php::parse(&source)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let google = value.get("google_translate");
        let setting = |key: &str| {
            google
                .and_then(|g| g.get(key))
                .and_then(PhpValue::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if self.google_project_id.is_none() {
            self.google_project_id = setting("project_id");
        }
        if self.google_credentials.is_none() {
            self.google_credentials = setting("credentials").map(|raw| {
                let credentials = PathBuf::from(raw);
                match &self.project_root {
                    Some(root) if credentials.is_relative() => root.join(credentials),
                    _ => credentials,
                }
            });
        }

        debug!("Loaded published config from {}", path.display());
        Ok(self)
    }

    /// Translator settings, when both a project id and credentials are known.
    pub fn translator_config(&self) -> Option<TranslatorConfig> {
        Some(TranslatorConfig {
            project_id: self.google_project_id.clone()?,
            credentials_path: self.google_credentials.clone()?,
            api_url: self.google_api_url.clone(),
        })
    }
}

/// Write the packaged default config to `path`.
///
/// Returns `false` without touching an existing file unless `force` is set.
pub fn publish_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        info!("Config already published at {}, leaving it untouched", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;

    info!("Published default config to {}", path.display());
    Ok(true)
}
