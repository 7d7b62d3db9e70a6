//! Forwarder port - 下流エージェントへの配送
//!
//! 配送は best-effort / at-most-once。エラーはログに残すだけで、
//! 投入元へは返さない。リトライもしない。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::domain::ForwardRequest;

/// 配送失敗の分類。ログ用で、HTTP 応答には現れない。
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("downstream responded with status {0}")]
    Status(u16),

    #[error("forward abandoned after {0:?}")]
    Timeout(Duration),

    #[error("forward pool is not running")]
    PoolStopped,
}

/// `url` の agent サービスへ 1 件配送する。
///
/// 2xx 以外の応答は `ForwardError::Status`。timeout は呼び出し側（ForwardPool）でも掛ける。
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, url: &Url, request: &ForwardRequest) -> Result<(), ForwardError>;
}
