//! Status - task_id による結果参照
//!
//! 結果が未着のあいだは NotFound（= pending）を返す。副作用なし。

use std::sync::Arc;

use crate::domain::{GatewayError, TaskResult};
use crate::ports::ResultStore;

pub struct StatusLookup {
    store: Arc<dyn ResultStore>,
}

impl StatusLookup {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    pub async fn get_status(&self, task_id: &str) -> Result<TaskResult, GatewayError> {
        self.store
            .get(task_id)
            .await
            .ok_or_else(|| GatewayError::NotFound(task_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentId, ResultStatus};
    use crate::impls::InMemoryResultStore;

    #[tokio::test]
    async fn missing_result_is_not_found() {
        let lookup = StatusLookup::new(Arc::new(InMemoryResultStore::new()));

        let err = lookup.get_status("nonexistent-id").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(id) if id == "nonexistent-id"));
    }

    #[tokio::test]
    async fn stored_result_is_returned() {
        let store = Arc::new(InMemoryResultStore::new());
        let result = TaskResult::new("task-b", AgentId::Documentariste, ResultStatus::Success);
        store.put(result.clone()).await;

        let lookup = StatusLookup::new(store);
        assert_eq!(lookup.get_status("task-b").await.unwrap(), result);
    }
}
