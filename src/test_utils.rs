//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]

use crate::types::{
    Locale,
    TranslationEntry,
    TranslationKey,
};

/// テスト用の TranslationKey を作成する
///
/// # Arguments
/// * `text_key` - 文字列キー
/// * `tag` - ロケールタグ（例: "en", "sv"）
///
/// # Panics
/// タグが不正な場合
#[allow(clippy::unwrap_used)]
pub(crate) fn translation_key(text_key: &str, tag: &str) -> TranslationKey {
    TranslationKey::new(text_key, Locale::parse(tag).unwrap())
}

/// テスト用の翻訳済みエントリを作成する
pub(crate) fn translated_entry(text_key: &str, tag: &str, text: &str) -> TranslationEntry {
    TranslationEntry::translated(translation_key(text_key, tag), text)
}
