//! RouteTable - agent_id から配送先 URL への静的マッピング
//!
//! 起動時に一度だけ構築し、以降は読み取り専用。
//! 設定された文字列はそのまま保持し、Ack の `forward_to` に返す
//! （`Url` の正規化結果ではなく、設定値そのもの）。

use std::collections::{BTreeMap, HashMap};

use url::Url;

use super::config::ConfigError;
use crate::domain::AgentId;

/// 1 agent 分の配送先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    url: Url,
    configured: String,
}

impl Route {
    /// 実際に POST する先（parse 済み）
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// 設定されたままの文字列
    pub fn configured(&self) -> &str {
        &self.configured
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<AgentId, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, agent: AgentId, url: Url) -> Self {
        let configured = url.as_str().to_string();
        self.routes.insert(agent, Route { url, configured });
        self
    }

    /// 設定値をすべて parse する。最初の不正な URL で失敗する。
    pub fn from_config(routes: &BTreeMap<AgentId, String>) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for (&agent, raw) in routes {
            let url = Url::parse(raw).map_err(|source| ConfigError::InvalidRoute {
                agent,
                url: raw.clone(),
                source,
            })?;
            table.routes.insert(
                agent,
                Route {
                    url,
                    configured: raw.clone(),
                },
            );
        }
        Ok(table)
    }

    pub fn resolve(&self, agent: AgentId) -> Option<&Route> {
        self.routes.get(&agent)
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.routes.contains_key(&agent)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
