//! InMemoryResultStore - プロセス内の結果ストア
//!
//! - HashMap<String, TaskResult> を tokio の RwLock で保護
//! - ロックは put / get の中で完結する（await を跨がない）
//! - 再起動で全て消える

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::TaskResult;
use crate::ports::ResultStore;

#[derive(Default)]
pub struct InMemoryResultStore {
    results: RwLock<HashMap<String, TaskResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.results.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn put(&self, result: TaskResult) -> Option<TaskResult> {
        let mut results = self.results.write().await;
        results.insert(result.task_id.clone(), result)
    }

    async fn get(&self, task_id: &str) -> Option<TaskResult> {
        let results = self.results.read().await;
        results.get(task_id).cloned()
    }
}
