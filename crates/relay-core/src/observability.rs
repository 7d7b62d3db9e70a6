use tracing_subscriber::EnvFilter;

/// グローバルな `tracing` subscriber を設定する。
///
/// デフォルトは `info`。`RUST_LOG` で上書きできる。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
