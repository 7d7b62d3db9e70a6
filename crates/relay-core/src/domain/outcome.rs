//! Outcome - 下流 agent から返ってくる結果

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AgentId, GatewayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Failed,
}

/// `POST /results` の body。そのまま保存し、`GET /status/{task_id}` で返す。
///
/// `task_id` はただの文字列: このプロセスが発行していない id の結果も受け付ける。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub agent_id: AgentId,
    pub status: ResultStatus,
    pub metrics: Option<BTreeMap<String, f64>>,
    pub artifacts: Option<Map<String, Value>>,
    pub notes: Option<String>,
}

impl TaskResult {
    pub fn new(task_id: impl Into<String>, agent_id: AgentId, status: ResultStatus) -> Self {
        Self {
            task_id: task_id.into(),
            agent_id,
            status,
            metrics: None,
            artifacts: None,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.task_id.is_empty() {
            return Err(GatewayError::Validation(
                "task_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
