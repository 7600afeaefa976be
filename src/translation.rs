//! Remote Translator backed by the Google Cloud Translation v2 REST API.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Settings needed to build a [`GoogleTranslator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorConfig {
    pub project_id: String,
    /// File holding an API key or access token (see [`Credentials::from_file`])
    pub credentials_path: PathBuf,
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Sent as the `key` query parameter
    ApiKey(String),
    /// Sent as a bearer token
    AccessToken(String),
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(rename = "type")]
    kind: Option<String>,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl Credentials {
    /// Read credentials from a file.
    ///
    /// A JSON object may carry `api_key` or `access_token`; any other content
    /// is taken as a raw API key. Service account key files are rejected since
    /// they need an OAuth token exchange.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let trimmed = raw.trim();

        if !trimmed.starts_with('{') {
            if trimmed.is_empty() {
                return Err(Error::Credentials {
                    path: path.to_path_buf(),
                    reason: "file is empty".to_string(),
                });
            }
            return Ok(Credentials::ApiKey(trimmed.to_string()));
        }

        let parsed: CredentialsFile =
            serde_json::from_str(trimmed).map_err(|e| Error::Credentials {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        match parsed {
            CredentialsFile {
                api_key: Some(key), ..
            } => Ok(Credentials::ApiKey(key)),
            CredentialsFile {
                access_token: Some(token),
                ..
            } => Ok(Credentials::AccessToken(token)),
            CredentialsFile {
                kind: Some(kind), ..
            } if kind == "service_account" => Err(Error::Credentials {
                path: path.to_path_buf(),
                reason: "service account keys are not supported, provide an api_key or access_token"
                    .to_string(),
            }),
            _ => Err(Error::Credentials {
                path: path.to_path_buf(),
                reason: "expected an `api_key` or `access_token` field".to_string(),
            }),
        }
    }
}

/// Google Translate request body
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: [&'a str; 1],
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedText {
    translated_text: String,
    detected_source_language: Option<String>,
}

/// Result of one remote translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// Source language detected by the API, if reported
    pub source: Option<String>,
    pub input: String,
}

/// Long-lived translation client bound to one project.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    project_id: String,
    api_url: String,
    credentials: Credentials,
}

impl GoogleTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        let credentials = Credentials::from_file(&config.credentials_path)?;
        Ok(Self::with_credentials(
            reqwest::Client::new(),
            config.project_id.clone(),
            config.api_url.clone(),
            credentials,
        ))
    }

    pub fn with_credentials(
        client: reqwest::Client,
        project_id: impl Into<String>,
        api_url: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            api_url: api_url.into(),
            credentials,
        }
    }

    /// Translate `text` into `target` (a locale code such as `fr`).
    ///
    /// Failures are returned as-is: no retries, and timeouts are whatever
    /// the HTTP client defaults to.
    ///
    /// # Returns
    /// The first translation in the response, with the detected source language.
    ///
    /// # Errors
    /// * `Error::Http` if the request fails or the body is not valid JSON
    /// * `Error::Remote` with status and body for a non-success response
    /// * `Error::EmptyResponse` if the API returns no translations
    pub async fn translate(&self, text: &str, target: &str) -> Result<Translation> {
        debug!("Translating {} chars to {}", text.len(), target);

        let request = TranslateRequest {
            q: [text],
            target,
            format: "text",
        };

        let mut builder = self
            .client
            .post(&self.api_url)
            .header("x-goog-user-project", &self.project_id)
            .json(&request);
        builder = match &self.credentials {
            Credentials::ApiKey(key) => builder.query(&[("key", key.as_str())]),
            Credentials::AccessToken(token) => builder.bearer_auth(token),
        };

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(Error::Remote { status, body });
        }

        let parsed: TranslateResponse = response.json().await?;
        let first = parsed
            .data
            .translations
            .into_iter()
            .next()
            .ok_or(Error::EmptyResponse)?;

        Ok(Translation {
            text: first.translated_text,
            source: first.detected_source_language,
            input: text.to_string(),
        })
    }
}
