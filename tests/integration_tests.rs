//! Integration tests for the translation module
//!
//! These tests drive the public API end to end against a temporary project
//! tree, with the Google Translate API mocked by wiremock.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use wiremock::{
    matchers::{body_partial_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use translation_module::config::Config;
use translation_module::file_store::{PhpFileStore, TranslationStore};
use translation_module::i18n::{Lookup, Registry};
use translation_module::translation::{Credentials, GoogleTranslator, TranslatorConfig};
use translation_module::{Error, Translations};

// ==================== Test Helpers ====================

/// Store handle whose load counter stays readable after the store moves into a registry
#[derive(Clone, Default)]
struct CountingStore {
    inner: PhpFileStore,
    loads: Arc<AtomicUsize>,
}

impl TranslationStore for CountingStore {
    fn load(&self, path: &Path) -> translation_module::Result<Translations> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(path)
    }

    fn save(&self, path: &Path, updates: &Translations) -> translation_module::Result<()> {
        self.inner.save(path, updates)
    }
}

fn translations(pairs: &[(&str, &str)]) -> Translations {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn project_registry<S: TranslationStore>(store: S, root: &Path) -> Registry<S> {
    fs::create_dir_all(root.join("resources/lang")).expect("Failed to create lang root");
    let mut registry = Registry::with_store(store, "unused");
    registry.set_project_root_path(Some(root.to_path_buf()));
    registry
}

fn mock_translator(server: &MockServer) -> GoogleTranslator {
    GoogleTranslator::with_credentials(
        reqwest::Client::new(),
        "test-project",
        format!("{}/language/translate/v2", server.uri()),
        Credentials::ApiKey("test-key".to_string()),
    )
}

async fn mount_translation(server: &MockServer, source: &str, target: &str, translated: &str) {
    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "q": [source],
            "target": target
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "translations": [
                    {"translatedText": translated, "detectedSourceLanguage": "en"}
                ]
            }
        })))
        .mount(server)
        .await;
}

// ==================== End-to-End Scenario ====================

#[test]
fn test_save_then_get_scenario() {
    let dir = TempDir::new().unwrap();
    let mut registry = project_registry(PhpFileStore::new(), dir.path());
    registry.add_locale("en").unwrap();

    registry
        .save_translation_file("messages", "en", &translations(&[("hello", "Hello")]))
        .unwrap();

    let file = dir.path().join("resources/lang/en/messages.php");
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "<?php\n\n return [\n\n     'hello' => 'Hello',\n\n ];\n"
    );
    assert_eq!(
        registry.get("hello", "messages", "en").unwrap(),
        Lookup::Value("Hello".to_string())
    );
    assert_eq!(
        registry.get("missing", "messages", "en").unwrap(),
        Lookup::KeyNotFound
    );
}

#[test]
fn test_merge_keeps_untouched_keys_in_sorted_order() {
    let dir = TempDir::new().unwrap();
    let mut registry = project_registry(PhpFileStore::new(), dir.path());
    registry.add_locale("en").unwrap();

    registry
        .save_translation_file("messages", "en", &translations(&[("b", "2"), ("a", "1")]))
        .unwrap();
    registry
        .save_translation_file("messages", "en", &translations(&[("c", "4"), ("b", "3")]))
        .unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("resources/lang/en/messages.php")).unwrap(),
        "<?php\n\n return [\n\n     'a' => '1',\n     'b' => '3',\n     'c' => '4',\n\n ];\n"
    );
}

#[test]
fn test_escaped_value_reads_back_through_registry() {
    let dir = TempDir::new().unwrap();
    let mut registry = project_registry(PhpFileStore::new(), dir.path());
    registry.add_locale("en").unwrap();

    registry
        .save_translation_file("messages", "en", &translations(&[("tricky", "it's a \\test")]))
        .unwrap();

    assert_eq!(
        registry.get("tricky", "messages", "en").unwrap().value(),
        Some("it's a \\test")
    );
}

// ==================== Cache Behavior ====================

#[test]
fn test_repeated_get_hits_disk_once() {
    let dir = TempDir::new().unwrap();
    let store = CountingStore::default();
    let loads = Arc::clone(&store.loads);
    let mut registry = project_registry(store, dir.path());
    registry.add_locale("en").unwrap();
    fs::write(
        dir.path().join("resources/lang/en/messages.php"),
        "<?php return ['hello' => 'Hello'];",
    )
    .unwrap();

    registry.get("hello", "messages", "en").unwrap();
    registry.get("hello", "messages", "en").unwrap();

    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_registries_are_isolated() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let mut first = project_registry(PhpFileStore::new(), first_dir.path());
    let mut second = project_registry(PhpFileStore::new(), second_dir.path());
    first.add_locale("en").unwrap();
    second.add_locale("en").unwrap();

    first
        .save_translation_file("messages", "en", &translations(&[("k", "first")]))
        .unwrap();
    second
        .save_translation_file("messages", "en", &translations(&[("k", "second")]))
        .unwrap();

    assert_eq!(first.get("k", "messages", "en").unwrap().value(), Some("first"));
    assert_eq!(second.get("k", "messages", "en").unwrap().value(), Some("second"));
}

// ==================== Locale Lifecycle ====================

#[test]
fn test_locale_lifecycle() {
    let dir = TempDir::new().unwrap();
    let mut registry = project_registry(PhpFileStore::new(), dir.path());

    registry.add_locale("fr").unwrap();
    assert!(registry.languages().unwrap().contains_key("fr"));

    registry
        .save_translation_file("messages", "fr", &translations(&[("hello", "Bonjour")]))
        .unwrap();
    registry.remove_locale("fr").unwrap();

    assert!(!registry.languages().unwrap().contains_key("fr"));
    assert!(!dir.path().join("resources/lang/fr").exists());
}

#[test]
fn test_empty_update_does_not_create_file() {
    let dir = TempDir::new().unwrap();
    let mut registry = project_registry(PhpFileStore::new(), dir.path());
    registry.add_locale("en").unwrap();

    registry
        .save_translation_file("messages", "en", &Translations::new())
        .unwrap();

    assert!(!dir.path().join("resources/lang/en/messages.php").exists());
}

#[test]
fn test_hand_written_nested_file_is_discoverable() {
    let dir = TempDir::new().unwrap();
    let mut registry = project_registry(PhpFileStore::new(), dir.path());
    registry.add_locale("en").unwrap();
    fs::write(
        dir.path().join("resources/lang/en/validation.php"),
        r#"<?php

return [
    'required' => 'The :attribute field is required.',
    'custom' => [
        'email' => ['required' => "We need your email."],
    ],
];
"#,
    )
    .unwrap();

    let keys = registry.language_file_keys("validation").unwrap();
    assert_eq!(
        keys.keys().collect::<Vec<_>>(),
        vec!["custom.email.required", "required"]
    );
    assert_eq!(
        registry
            .get("custom.email.required", "validation", "en")
            .unwrap()
            .value(),
        Some("We need your email.")
    );
}

// ==================== Remote Translation ====================

#[tokio::test]
async fn test_translate_returns_text_only() {
    let server = MockServer::start().await;
    mount_translation(&server, "Hello", "fr", "Bonjour").await;

    let dir = TempDir::new().unwrap();
    let registry =
        project_registry(PhpFileStore::new(), dir.path()).with_translator(mock_translator(&server));

    assert_eq!(registry.translate("Hello", "fr").await.unwrap(), "Bonjour");
}

#[tokio::test]
async fn test_translate_missing_fills_only_absent_keys() {
    let server = MockServer::start().await;
    mount_translation(&server, "Goodbye", "fr", "Au revoir").await;
    mount_translation(&server, "Thanks", "fr", "Merci").await;

    let dir = TempDir::new().unwrap();
    let mut registry =
        project_registry(PhpFileStore::new(), dir.path()).with_translator(mock_translator(&server));
    registry.add_locale("en").unwrap();
    registry.add_locale("fr").unwrap();
    registry
        .save_translation_file(
            "messages",
            "en",
            &translations(&[
                ("hello", "Hello"),
                ("bye", "Goodbye"),
                ("thanks", "Thanks"),
                ("blank", ""),
            ]),
        )
        .unwrap();
    registry
        .save_translation_file("messages", "fr", &translations(&[("hello", "Salut")]))
        .unwrap();
    fs::write(
        dir.path().join("resources/lang/fr/messages.php"),
        "<?php return ['hello' => 'Salut', 'thanks' => ''];",
    )
    .unwrap();

    let filled = registry.translate_missing("messages", "en", "fr").await.unwrap();

    assert_eq!(filled, 2);
    assert_eq!(registry.get("hello", "messages", "fr").unwrap().value(), Some("Salut"));
    assert_eq!(registry.get("bye", "messages", "fr").unwrap().value(), Some("Au revoir"));
    assert_eq!(registry.get("thanks", "messages", "fr").unwrap().value(), Some("Merci"));
    assert_eq!(registry.get("blank", "messages", "fr").unwrap(), Lookup::KeyNotFound);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_translate_missing_creates_target_locale() {
    let server = MockServer::start().await;
    mount_translation(&server, "Hello", "de", "Hallo").await;

    let dir = TempDir::new().unwrap();
    let mut registry =
        project_registry(PhpFileStore::new(), dir.path()).with_translator(mock_translator(&server));
    registry.add_locale("en").unwrap();
    registry
        .save_translation_file("messages", "en", &translations(&[("hello", "Hello")]))
        .unwrap();

    assert_eq!(registry.translate_missing("messages", "en", "de").await.unwrap(), 1);
    assert!(dir.path().join("resources/lang/de/messages.php").is_file());
}

#[tokio::test]
async fn test_remote_failure_leaves_files_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut registry =
        project_registry(PhpFileStore::new(), dir.path()).with_translator(mock_translator(&server));
    registry.add_locale("en").unwrap();
    registry
        .save_translation_file("messages", "en", &translations(&[("hello", "Hello")]))
        .unwrap();

    let err = registry.translate_missing("messages", "en", "fr").await.unwrap_err();

    assert!(matches!(err, Error::Remote { .. }));
    assert!(!dir.path().join("resources/lang/fr").exists());
}

// ==================== Configuration ====================

#[tokio::test]
async fn test_registry_from_config_with_published_settings() {
    let server = MockServer::start().await;
    mount_translation(&server, "Hello", "it", "Ciao").await;

    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("resources/lang")).unwrap();
    fs::create_dir_all(dir.path().join("config")).unwrap();
    fs::write(dir.path().join("key.txt"), "test-key").unwrap();
    fs::write(
        dir.path().join("config/translation.php"),
        concat!(
            "<?php return ['google_translate' => ",
            "['project_id' => 'test-project', 'credentials' => 'key.txt']];"
        ),
    )
    .unwrap();

    let config = Config {
        project_root: Some(dir.path().to_path_buf()),
        default_lang_path: "unused".into(),
        google_project_id: None,
        google_credentials: None,
        google_api_url: format!("{}/language/translate/v2", server.uri()),
    };
    let published = config.published_config_path();
    let config = config.with_published_config(&published).unwrap();
    assert_eq!(
        config.translator_config(),
        Some(TranslatorConfig {
            project_id: "test-project".to_string(),
            credentials_path: dir.path().join("key.txt"),
            api_url: format!("{}/language/translate/v2", server.uri()),
        })
    );

    let registry = Registry::from_config(&config).unwrap();
    assert_eq!(registry.project_root_path(), Some(dir.path()));
    assert_eq!(registry.translate("Hello", "it").await.unwrap(), "Ciao");
}

#[test]
fn test_registry_from_config_with_bad_credentials_fails() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        project_root: Some(dir.path().to_path_buf()),
        default_lang_path: "unused".into(),
        google_project_id: Some("p".to_string()),
        google_credentials: Some(dir.path().join("missing.json")),
        google_api_url: "http://localhost/v2".to_string(),
    };

    let err = Registry::from_config(&config).err().expect("should fail");
    assert!(err.is_not_found());
}
