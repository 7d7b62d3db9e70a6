//! Dispatcher - タスク受付
//!
//! # フロー
//! 1. 入力検証（task が空文字列でないこと）
//! 2. RouteTable で配送先を解決（なければ UnknownAgent、ID は発行しない）
//! 3. task_id を発行し Ack を組み立てる
//! 4. ForwardQueue に job を積む（配送の完了は待たない）

use std::sync::Arc;

use super::routes::RouteTable;
use super::forward_pool::{ForwardJob, ForwardQueue};
use crate::domain::{Ack, ForwardRequest, GatewayError, TaskSubmission};
use crate::ports::{Clock, IdGenerator};

pub struct Dispatcher {
    routes: Arc<RouteTable>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    queue: ForwardQueue,
}

impl Dispatcher {
    pub fn new(
        routes: Arc<RouteTable>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        queue: ForwardQueue,
    ) -> Self {
        Self {
            routes,
            ids,
            clock,
            queue,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// タスクを受け付け、配送を予約する。
    ///
    /// ネットワークには触れずに返る。`forward_to` は設定された文字列そのもの。
    pub fn submit(&self, submission: TaskSubmission) -> Result<Ack, GatewayError> {
        submission.validate()?;

        let agent_id = submission.agent_id;
        let route = self
            .routes
            .resolve(agent_id)
            .ok_or(GatewayError::UnknownAgent(agent_id))?;

        let task_id = self.ids.generate_task_id();
        let ack = Ack::accepted(task_id, agent_id, self.clock.now(), route.configured());

        let job = ForwardJob {
            url: route.url().clone(),
            request: ForwardRequest {
                task_id,
                submission,
            },
        };
        // ack は既に確定している。積めなかった場合もログのみ（at-most-once）
        if let Err(error) = self.queue.enqueue(job) {
            tracing::warn!(%task_id, %agent_id, %error, "forward not scheduled");
        }

        tracing::info!(%task_id, %agent_id, "task accepted");
        Ok(ack)
    }
}
