//! ForwardPool - 下流エージェントへの配送
//!
//! # 方針
//! - Dispatcher は `ForwardQueue::enqueue` で job を積むだけ（await しない）
//! - intake ループが job を 1 件ずつ取り出し、配送ごとに独立した task を
//!   `JoinSet` に spawn する。ある配送が止まっても他の配送は待たされない
//! - 同時実行数は agent ごとの `Semaphore` で制限する。上限に達するのは
//!   その agent の配送だけで、別 agent の配送には影響しない
//! - 各配送は `tokio::time::timeout` で打ち切る。失敗はログのみ（retry なし、at-most-once）
//!
//! # Shutdown
//! - `request_shutdown()` で intake を止める
//! - permit 待ちの job は捨てる。実行中の配送は完了（または timeout）まで待つ
//! - `shutdown_and_join()` 後の `enqueue` は `ForwardError::PoolStopped`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use url::Url;

use crate::domain::{AgentId, ForwardRequest};
use crate::ports::{ForwardError, Forwarder};

/// 1 件の配送予約
#[derive(Debug, Clone)]
pub struct ForwardJob {
    pub url: Url,
    pub request: ForwardRequest,
}

/// Dispatcher に渡す送信側。unbounded なので決してブロックしない。
#[derive(Clone)]
pub struct ForwardQueue {
    tx: mpsc::UnboundedSender<ForwardJob>,
}

impl ForwardQueue {
    pub fn enqueue(&self, job: ForwardJob) -> Result<(), ForwardError> {
        self.tx.send(job).map_err(|_| ForwardError::PoolStopped)
    }
}

/// 配送プールのハンドル
/// - `request_shutdown()` で intake に停止を通知
/// - `shutdown_and_join()` で実行中の配送が終わるまで待つ
pub struct ForwardPool {
    shutdown_tx: watch::Sender<bool>,
    intake: JoinHandle<()>,
    per_agent_limit: usize,
}

impl ForwardPool {
    /// 現在の tokio runtime 上に intake ループを起動する。
    ///
    /// `per_agent_limit` は 1 agent あたりの同時配送数（0 は 1 に切り上げ）。
    pub fn spawn(
        per_agent_limit: usize,
        forwarder: Arc<dyn Forwarder>,
        timeout: Duration,
    ) -> (ForwardQueue, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let per_agent_limit = per_agent_limit.max(1);

        let intake = tokio::spawn(intake_loop(
            rx,
            forwarder,
            timeout,
            per_agent_limit,
            shutdown_rx,
        ));

        (
            ForwardQueue { tx },
            Self {
                shutdown_tx,
                intake,
                per_agent_limit,
            },
        )
    }

    pub fn per_agent_limit(&self) -> usize {
        self.per_agent_limit
    }

    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.intake.await;
    }
}

async fn intake_loop(
    mut rx: mpsc::UnboundedReceiver<ForwardJob>,
    forwarder: Arc<dyn Forwarder>,
    timeout: Duration,
    per_agent_limit: usize,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut slots: HashMap<AgentId, Arc<Semaphore>> = HashMap::new();
    let mut in_flight = JoinSet::new();

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                // sender が drop された場合も停止扱い
                if changed.is_err() {
                    break;
                }
            }
            // 終わった配送を回収して JoinSet を膨らませない
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            job = rx.recv() => {
                // 全ての ForwardQueue が drop された
                let Some(job) = job else {
                    break;
                };
                let agent_slots = Arc::clone(
                    slots
                        .entry(job.request.submission.agent_id)
                        .or_insert_with(|| Arc::new(Semaphore::new(per_agent_limit))),
                );
                in_flight.spawn(run_forward(
                    job,
                    Arc::clone(&forwarder),
                    agent_slots,
                    timeout,
                    shutdown_rx.clone(),
                ));
            }
        }
    }

    // 以降の enqueue は失敗させる
    rx.close();
    while in_flight.join_next().await.is_some() {}
    tracing::debug!("forward pool stopped");
}

async fn run_forward(
    job: ForwardJob,
    forwarder: Arc<dyn Forwarder>,
    agent_slots: Arc<Semaphore>,
    timeout: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let permit = tokio::select! {
        biased;
        _ = shutdown_rx.changed() => None,
        permit = agent_slots.acquire_owned() => permit.ok(),
    };
    let Some(_permit) = permit else {
        tracing::debug!(
            task_id = %job.request.task_id,
            agent_id = %job.request.submission.agent_id,
            "queued forward dropped at shutdown"
        );
        return;
    };

    forward_one(forwarder.as_ref(), job, timeout).await;
}

/// 1 件配送する。`timeout` で打ち切り、失敗はログに残すだけで返さない。
pub(crate) async fn forward_one(forwarder: &dyn Forwarder, job: ForwardJob, timeout: Duration) {
    let ForwardJob { url, request } = job;
    let outcome = match tokio::time::timeout(timeout, forwarder.forward(&url, &request)).await {
        Ok(result) => result,
        Err(_) => Err(ForwardError::Timeout(timeout)),
    };

    match outcome {
        Ok(()) => tracing::debug!(
            task_id = %request.task_id,
            agent_id = %request.submission.agent_id,
            url = %url,
            "task forwarded"
        ),
        Err(error) => tracing::warn!(
            task_id = %request.task_id,
            agent_id = %request.submission.agent_id,
            url = %url,
            %error,
            "forward failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskId, TaskSubmission};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use ulid::Ulid;

    struct CountingForwarder {
        calls: AtomicUsize,
        delay: Duration,
        done: mpsc::UnboundedSender<TaskId>,
    }

    #[async_trait]
    impl Forwarder for CountingForwarder {
        async fn forward(&self, _url: &Url, request: &ForwardRequest) -> Result<(), ForwardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let _ = self.done.send(request.task_id);
            Ok(())
        }
    }

    /// `stalled` 宛ての配送は返らない。それ以外は開始と同時に完了を通知する。
    struct StallingForwarder {
        stalled: AgentId,
        done: mpsc::UnboundedSender<(AgentId, TaskId)>,
    }

    #[async_trait]
    impl Forwarder for StallingForwarder {
        async fn forward(&self, _url: &Url, request: &ForwardRequest) -> Result<(), ForwardError> {
            let agent = request.submission.agent_id;
            if agent == self.stalled {
                std::future::pending::<()>().await;
            }
            let _ = self.done.send((agent, request.task_id));
            Ok(())
        }
    }

    /// 開始数を数え、`gate` が開くまで待つ。
    struct GatedForwarder {
        started: AtomicUsize,
        finished: AtomicUsize,
        gate: Notify,
    }

    impl GatedForwarder {
        fn new() -> Self {
            Self {
                started: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
                gate: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl Forwarder for GatedForwarder {
        async fn forward(&self, _url: &Url, _request: &ForwardRequest) -> Result<(), ForwardError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn job_for(agent: AgentId) -> ForwardJob {
        ForwardJob {
            url: Url::parse(&format!("https://agents.local/{agent}")).unwrap(),
            request: ForwardRequest {
                task_id: TaskId::from_ulid(Ulid::new()),
                submission: TaskSubmission::new(agent, "find X"),
            },
        }
    }

    fn job() -> ForwardJob {
        job_for(AgentId::Chercheur)
    }

    async fn wait_until(counter: &AtomicUsize, expected: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while counter.load(Ordering::SeqCst) < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("counter never reached the expected value");
    }

    #[tokio::test]
    async fn pool_delivers_every_enqueued_job() {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let forwarder = Arc::new(CountingForwarder {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            done: done_tx,
        });
        let (queue, pool) = ForwardPool::spawn(3, forwarder.clone(), Duration::from_secs(1));
        assert_eq!(pool.per_agent_limit(), 3);

        let mut expected = Vec::new();
        for _ in 0..10 {
            let job = job();
            expected.push(job.request.task_id);
            queue.enqueue(job).unwrap();
        }

        let mut delivered = Vec::new();
        for _ in 0..10 {
            delivered.push(done_rx.recv().await.unwrap());
        }
        delivered.sort();
        expected.sort();
        assert_eq!(delivered, expected);
        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 10);

        pool.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn hung_agent_does_not_delay_other_agents() {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let forwarder = Arc::new(StallingForwarder {
            stalled: AgentId::Analyste,
            done: done_tx,
        });
        let (queue, _pool) = ForwardPool::spawn(8, forwarder, Duration::from_secs(30));

        // analyste の上限を埋め、さらに待ち行列も作る
        for _ in 0..12 {
            queue.enqueue(job_for(AgentId::Analyste)).unwrap();
        }
        let chercheur = job_for(AgentId::Chercheur);
        let chercheur_id = chercheur.request.task_id;
        queue.enqueue(chercheur).unwrap();

        let delivered = tokio::time::timeout(Duration::from_secs(1), done_rx.recv())
            .await
            .expect("chercheur forward waited behind analyste");
        assert_eq!(delivered, Some((AgentId::Chercheur, chercheur_id)));
    }

    #[tokio::test]
    async fn per_agent_limit_caps_in_flight_forwards() {
        let forwarder = Arc::new(GatedForwarder::new());
        let (queue, _pool) = ForwardPool::spawn(2, forwarder.clone(), Duration::from_secs(30));

        for _ in 0..3 {
            queue.enqueue(job_for(AgentId::Analyste)).unwrap();
        }
        wait_until(&forwarder.started, 2).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(forwarder.started.load(Ordering::SeqCst), 2);

        // 1 件終われば残りの 1 件が始まる
        forwarder.gate.notify_one();
        wait_until(&forwarder.started, 3).await;
        assert_eq!(forwarder.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_finishes_in_flight_and_drops_waiting() {
        let forwarder = Arc::new(GatedForwarder::new());
        let (queue, pool) = ForwardPool::spawn(1, forwarder.clone(), Duration::from_secs(30));

        queue.enqueue(job_for(AgentId::Analyste)).unwrap();
        queue.enqueue(job_for(AgentId::Analyste)).unwrap();
        wait_until(&forwarder.started, 1).await;

        pool.request_shutdown();
        forwarder.gate.notify_one();
        pool.shutdown_and_join().await;

        assert_eq!(forwarder.started.load(Ordering::SeqCst), 1);
        assert_eq!(forwarder.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_forward_is_abandoned_at_timeout() {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let forwarder = CountingForwarder {
            calls: AtomicUsize::new(0),
            delay: Duration::from_secs(60),
            done: done_tx,
        };

        let started = tokio::time::Instant::now();
        forward_one(&forwarder, job(), Duration::from_secs(30)).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(30));
        assert!(elapsed < Duration::from_secs(60));
        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 1);
        // 途中で打ち切られたので完了通知は来ない
        assert!(done_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn enqueue_fails_once_pool_is_stopped() {
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let forwarder = Arc::new(CountingForwarder {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            done: done_tx,
        });
        let (queue, pool) = ForwardPool::spawn(1, forwarder, Duration::from_secs(1));

        pool.shutdown_and_join().await;

        assert!(matches!(
            queue.enqueue(job()),
            Err(ForwardError::PoolStopped)
        ));
    }

    #[tokio::test]
    async fn zero_limit_is_bumped_to_one() {
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let forwarder = Arc::new(CountingForwarder {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            done: done_tx,
        });
        let (_queue, pool) = ForwardPool::spawn(0, forwarder, Duration::from_secs(1));
        assert_eq!(pool.per_agent_limit(), 1);
        pool.shutdown_and_join().await;
    }
}
