//! 設定ファイルからコンポーネントを組み立てる結合テスト

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sunshine_localization::catalog::{
    DiskFileProvider,
    EmbeddedFileProvider,
    NamespaceMapping,
    ResourceBundle,
};
use sunshine_localization::config::ConfigManager;
use sunshine_localization::store::{
    DocumentRepository,
    LocaleFileRepository,
};
use sunshine_localization::types::{
    Locale,
    TranslationKey,
};
use sunshine_localization::{
    TranslationStore,
    VirtualFileCatalog,
};
use tempfile::TempDir;

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[tokio::test]
async fn components_are_assembled_from_the_loaded_settings() {
    common::init_tracing();
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        ".sunshine-localization.json",
        r#"{
            "documentIdSeparator": "::",
            "translationFilePattern": "**/i18n/**/*.json",
            "viewSourceOrder": "embeddedFirst",
            "viewExtensions": [".razor"],
            "fixer": {"layoutPath": "~/Views/Shared/_Layout.razor"}
        }"#,
    );
    write_file(temp_dir.path(), "i18n/sv.json", r#"{"greeting": "Hej"}"#);

    let mut manager = ConfigManager::new();
    manager.load_settings(Some(temp_dir.path().to_path_buf())).unwrap();
    let settings = manager.get_settings().clone();

    // ストアは設定のセパレータとファイルパターンを使う
    let store = TranslationStore::builder()
        .register_writable(Arc::new(DocumentRepository::new(
            temp_dir.path().join("admin/translations.json"),
            settings.document_id_separator.clone(),
        )))
        .register(Arc::new(LocaleFileRepository::new(
            temp_dir.path(),
            settings.translation_file_pattern.clone(),
        )))
        .build()
        .unwrap();

    let key = TranslationKey::new("greeting", Locale::parse("sv").unwrap());
    assert_eq!(store.resolve(&key).await, "Hej");

    // カタログはビュー拡張子・fixer・プロバイダ順序を設定から引き継ぐ
    let mut bundle = ResourceBundle::new("app");
    bundle.insert("App.Views.Home.Index.razor", b"<h1>Hi</h1>".to_vec());
    let mut embedded = EmbeddedFileProvider::new();
    embedded.add(NamespaceMapping::new(Arc::new(bundle), "App"));

    let catalog = VirtualFileCatalog::builder()
        .with_settings(&settings)
        .register_sources(
            settings.view_source_order,
            Arc::new(DiskFileProvider::new(temp_dir.path().join("web"))),
            Arc::new(embedded),
        )
        .build()
        .unwrap();

    let record = catalog.get_file("~/Views/Home/Index.razor").await.unwrap();
    let content = String::from_utf8(record.content).unwrap();

    assert!(content.contains("@inherits"));
    assert!(content.contains("Layout = \"~/Views/Shared/_Layout.razor\""));
}

#[tokio::test]
async fn malformed_settings_fail_before_any_component_is_built() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        ".sunshine-localization.json",
        r#"{"translationFilePattern": "**/{locales,messages/*.json"}"#,
    );

    let mut manager = ConfigManager::new();
    let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

    assert!(result.is_err());
}
