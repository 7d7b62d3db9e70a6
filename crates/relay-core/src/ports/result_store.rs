//! ResultStore port - task_id ごとの最新結果
//!
//! # 設計原則
//! - 1 task_id につき 1 エントリ（last-write-wins、バージョン管理なし）
//! - 発行済み task_id との突き合わせはしない
//! - 並行 read/write で更新を失わないこと

use async_trait::async_trait;

use crate::domain::TaskResult;

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// `result` を `task_id` の下に保存し、置き換えた前の値を返す。
    async fn put(&self, result: TaskResult) -> Option<TaskResult>;

    async fn get(&self, task_id: &str) -> Option<TaskResult>;
}
