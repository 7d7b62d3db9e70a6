//! Errors - リクエスト処理のエラー分類
//!
//! - Unauthorized: API キー不一致（最初に判定）
//! - Validation / UnknownAgent: 入力エラー
//! - NotFound: 結果未着（pending と同義、障害ではない）
//!
//! 配送の失敗は呼び出し元に返らないので、ここではなく `ports::forwarder` に置く。

use thiserror::Error;

use super::AgentId;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid API key")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown agent_id: {0}")]
    UnknownAgent(AgentId),

    #[error("No result yet for task_id={0}")]
    NotFound(String),
}
