//! GatewayBuilder - ゲートウェイの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - `expect_agents()` で必須の agent を宣言
//! - `build()` 時に「期待集合 ⊆ RouteTable」をチェックし、不足があれば BuildError
//! - 未指定の port には本番用の実装を使う（SystemClock, UlidGenerator,
//!   InMemoryResultStore, HttpForwarder）

use std::sync::Arc;
use std::time::Duration;

use super::config::{
    ApiKey, ConfigError, DEFAULT_FORWARD_TIMEOUT, DEFAULT_FORWARD_CONCURRENCY, GatewayConfig,
};
use super::dispatcher::Dispatcher;
use super::ingestion::ResultIngestion;
use super::routes::RouteTable;
use super::status::StatusLookup;
use super::forward_pool::ForwardPool;
use crate::domain::AgentId;
use crate::impls::{HttpForwarder, InMemoryResultStore};
use crate::ports::{Clock, Forwarder, IdGenerator, ResultStore, SystemClock, UlidGenerator};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing routes for agents: {0:?}. These agents were expected but have no destination.")]
    MissingRoutes(Vec<AgentId>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// handler が必要とするもの一式。`Arc` で共有する。
pub struct Gateway {
    api_key: ApiKey,
    clock: Arc<dyn Clock>,
    dispatcher: Dispatcher,
    ingestion: ResultIngestion,
    status: StatusLookup,
}

impl Gateway {
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn ingestion(&self) -> &ResultIngestion {
        &self.ingestion
    }

    pub fn status(&self) -> &StatusLookup {
        &self.status
    }
}

/// 構築済みのゲートウェイと、その配送を担う ForwardPool
pub struct App {
    pub gateway: Arc<Gateway>,
    pub forwards: ForwardPool,
}

pub struct GatewayBuilder {
    api_key: ApiKey,
    routes: RouteTable,
    store: Option<Arc<dyn ResultStore>>,
    forwarder: Option<Arc<dyn Forwarder>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    forward_timeout: Duration,
    forward_concurrency: usize,
    expected_agents: Option<Vec<AgentId>>,
}

impl GatewayBuilder {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            routes: RouteTable::new(),
            store: None,
            forwarder: None,
            clock: None,
            ids: None,
            forward_timeout: DEFAULT_FORWARD_TIMEOUT,
            forward_concurrency: DEFAULT_FORWARD_CONCURRENCY,
            expected_agents: None,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, BuildError> {
        Ok(Self::new(config.api_key.clone())
            .routes(RouteTable::from_config(&config.routes)?)
            .forward_timeout(config.forward_timeout)
            .forward_concurrency(config.forward_concurrency))
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn result_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn forwarder(mut self, forwarder: Arc<dyn Forwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn forward_timeout(mut self, timeout: Duration) -> Self {
        self.forward_timeout = timeout;
        self
    }

    /// agent ごとの同時配送数の上限
    pub fn forward_concurrency(mut self, n: usize) -> Self {
        self.forward_concurrency = n;
        self
    }

    pub fn expect_agents(mut self, agents: &[AgentId]) -> Self {
        self.expected_agents = Some(agents.to_vec());
        self
    }

    /// 検証してワイヤリングする。
    ///
    /// ForwardPool を spawn するので tokio runtime の中で呼ぶこと。
    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected) = &self.expected_agents {
            let missing: Vec<AgentId> = expected
                .iter()
                .copied()
                .filter(|agent| !self.routes.contains(*agent))
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingRoutes(missing));
            }
        }

        let forwarder: Arc<dyn Forwarder> = match self.forwarder {
            Some(forwarder) => forwarder,
            None => Arc::new(HttpForwarder::new(
                self.api_key.clone(),
                self.forward_timeout,
            )?),
        };
        let store: Arc<dyn ResultStore> = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryResultStore::new()));
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids: Arc<dyn IdGenerator> = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));

        let (queue, forwards) =
            ForwardPool::spawn(self.forward_concurrency, forwarder, self.forward_timeout);

        let gateway = Gateway {
            api_key: self.api_key,
            clock: Arc::clone(&clock),
            dispatcher: Dispatcher::new(Arc::new(self.routes), ids, clock, queue),
            ingestion: ResultIngestion::new(Arc::clone(&store)),
            status: StatusLookup::new(store),
        };

        Ok(App {
            gateway: Arc::new(gateway),
            forwards,
        })
    }
}
