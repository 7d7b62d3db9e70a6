//! AgentId - 配送先 agent の固定集合
//!
//! wire 上は小文字の名前（`coordinateur`, `chercheur`, ...）。
//! 集合外の名前は deserialize の時点で弾かれる（400）。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Agent identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    Coordinateur,
    Chercheur,
    Experimentateur,
    Analyste,
    Architecte,
    Securite,
    Documentariste,
}

impl AgentId {
    pub const ALL: [AgentId; 7] = [
        AgentId::Coordinateur,
        AgentId::Chercheur,
        AgentId::Experimentateur,
        AgentId::Analyste,
        AgentId::Architecte,
        AgentId::Securite,
        AgentId::Documentariste,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentId::Coordinateur => "coordinateur",
            AgentId::Chercheur => "chercheur",
            AgentId::Experimentateur => "experimentateur",
            AgentId::Analyste => "analyste",
            AgentId::Architecte => "architecte",
            AgentId::Securite => "securite",
            AgentId::Documentariste => "documentariste",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown agent '{0}'")]
pub struct UnknownAgentName(pub String);

impl FromStr for AgentId {
    type Err = UnknownAgentName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentId::ALL
            .into_iter()
            .find(|agent| agent.as_str() == s)
            .ok_or_else(|| UnknownAgentName(s.to_string()))
    }
}
