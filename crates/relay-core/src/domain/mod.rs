//! Domain - ゲートウェイのドメインモデル
//!
//! - ids: TaskId（`task-<ULID>`）
//! - agent: AgentId（固定 7 種）
//! - task: TaskSubmission / ForwardRequest / Ack
//! - outcome: TaskResult
//! - errors: GatewayError

pub mod agent;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod task;

pub use agent::{AgentId, UnknownAgentName};
pub use errors::GatewayError;
pub use ids::{ParseTaskIdError, TaskId};
pub use outcome::{ResultStatus, TaskResult};
pub use task::{Ack, AckDetails, AckStatus, ForwardRequest, TaskSubmission};
