//! 結合テスト共通のセットアップ

/// トレーシングを初期化する（`RUST_LOG` で詳細度を制御）
///
/// 二重初期化は無視されるので、各テストの先頭で呼んでよい。
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
