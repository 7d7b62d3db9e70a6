//! ResultIngestion - agent からの結果コールバックを保存する
//!
//! # 方針
//! - task_id が発行済みかどうかは見ない（未知の task_id も受け付ける）
//! - 同じ task_id は無条件に上書き（last write wins、バージョン管理なし）
//! - 受信ごとに info ログを 1 件出す

use std::sync::Arc;

use crate::domain::{GatewayError, TaskResult};
use crate::ports::ResultStore;

pub struct ResultIngestion {
    store: Arc<dyn ResultStore>,
}

impl ResultIngestion {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    /// 検証して保存する。上書きが起きた場合は debug ログに残す。
    pub async fn ingest(&self, result: TaskResult) -> Result<(), GatewayError> {
        result.validate()?;

        tracing::info!(
            task_id = %result.task_id,
            agent_id = %result.agent_id,
            status = ?result.status,
            metrics = ?result.metrics,
            "result received"
        );

        let task_id = result.task_id.clone();
        if self.store.put(result).await.is_some() {
            tracing::debug!(%task_id, "previous result overwritten");
        }
        Ok(())
    }
}
