//! GatewayConfig - 起動時設定
//!
//! バイナリ（clap + env）が組み立てて core に渡す。ここでは値を持つだけで、
//! URL の parse は RouteTable 構築時に行う。
//! プレースホルダのまま起動した場合は warn を出す（起動は止めない）。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::AgentId;

pub const DEFAULT_API_KEY: &str = "dev-key-change-me";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(DEFAULT_FORWARD_TIMEOUT_SECS);
/// agent ごとの同時配送数の上限。別 agent の配送はこの上限を共有しない。
pub const DEFAULT_FORWARD_CONCURRENCY: usize = 8;

const PLACEHOLDER_HOST: &str = "REPLACE-ME";

/// 共有シークレット。Debug では値を出さない。
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// 提示された値と定数時間で比較する。
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }

    pub fn is_placeholder(&self) -> bool {
        &*self.0 == DEFAULT_API_KEY
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid route for agent '{agent}': {url:?} ({source})")]
    InvalidRoute {
        agent: AgentId,
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: String,
    pub api_key: ApiKey,
    /// agent_id -> 配送先 URL（未検証の文字列。RouteTable 構築時に parse する）
    pub routes: BTreeMap<AgentId, String>,
    pub forward_timeout: Duration,
    /// agent ごとの同時配送数の上限
    pub forward_concurrency: usize,
}

impl GatewayConfig {
    /// `agent` のデフォルト配送先。本番では必ず上書きする。
    pub fn placeholder_route(agent: AgentId) -> String {
        format!("https://{PLACEHOLDER_HOST}/{agent}")
    }

    pub fn placeholder_agents(&self) -> Vec<AgentId> {
        self.routes
            .iter()
            .filter(|(_, url)| url.contains(PLACEHOLDER_HOST))
            .map(|(agent, _)| *agent)
            .collect()
    }

    pub fn warn_on_placeholders(&self) {
        if self.api_key.is_placeholder() {
            tracing::warn!("AGENTS_API_KEY is the built-in development key; override it");
        }
        for agent in self.placeholder_agents() {
            tracing::warn!(agent_id = %agent, "route still points at a placeholder URL");
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_key: ApiKey::new(DEFAULT_API_KEY),
            routes: AgentId::ALL
                .into_iter()
                .map(|agent| (agent, Self::placeholder_route(agent)))
                .collect(),
            forward_timeout: DEFAULT_FORWARD_TIMEOUT,
            forward_concurrency: DEFAULT_FORWARD_CONCURRENCY,
        }
    }
}
