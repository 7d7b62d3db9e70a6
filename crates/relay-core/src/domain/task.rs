//! Task - 投入されたタスクと、その配送 payload / Ack
//!
//! - `TaskSubmission`: `POST /tasks` の body。task_id は持たない（サーバが発行する）
//! - `ForwardRequest`: 下流へ送る body。task_id と submission をフラットに合成する
//! - `Ack`: 受付直後に返す応答。配送の完了は待たない

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AgentId, GatewayError, TaskId};

/// `POST /tasks` の body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSubmission {
    pub agent_id: AgentId,
    /// 依頼内容（自由記述）
    pub task: String,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl TaskSubmission {
    pub fn new(agent_id: AgentId, task: impl Into<String>) -> Self {
        Self {
            agent_id,
            task: task.into(),
            context: Map::new(),
        }
    }

    /// `task` は空文字列でなければよい（空白だけでも受け付ける）。
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.task.is_empty() {
            return Err(GatewayError::Validation("task must not be empty".to_string()));
        }
        Ok(())
    }
}

/// 下流 agent へ送る body: `{task_id, agent_id, task, context}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardRequest {
    pub task_id: TaskId,
    #[serde(flatten)]
    pub submission: TaskSubmission,
}

/// Ack の状態。Dispatcher は常に `Accepted` を返す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Accepted,
    Queued,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckDetails {
    pub forward_to: String,
}

/// 受付直後の応答
///
/// `details.forward_to` には設定された配送先をそのまま入れる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub status: AckStatus,
    pub task_id: TaskId,
    pub agent_id: AgentId,
    pub received_at: DateTime<Utc>,
    pub details: Option<AckDetails>,
}

impl Ack {
    pub fn accepted(
        task_id: TaskId,
        agent_id: AgentId,
        received_at: DateTime<Utc>,
        forward_to: impl Into<String>,
    ) -> Self {
        Self {
            status: AckStatus::Accepted,
            task_id,
            agent_id,
            received_at,
            details: Some(AckDetails {
                forward_to: forward_to.into(),
            }),
        }
    }
}
