//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    ConfigError,
    LocalizationSettings,
};

/// ルートディレクトリから設定を読み込む
///
/// `.sunshine-localization.json` ファイルを探して読み込む
///
/// # Arguments
/// * `root` - アプリケーションのルートパス
///
/// # Returns
/// - `Ok(Some(settings))`: 設定ファイルが見つかり、読み込みに成功
/// - `Ok(None)`: 設定ファイルが見つからない
/// - `Err(ConfigError)`: ファイル読み込みまたはパースエラー
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub(super) fn load_from_root(root: &Path) -> Result<Option<LocalizationSettings>, ConfigError> {
    let config_path = root.join(".sunshine-localization.json");

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let settings: LocalizationSettings = serde_json::from_str(&content)?;

    Ok(Some(settings))
}
