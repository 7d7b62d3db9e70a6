//! Task identifiers - タスク ID
//!
//! # ULID ベースの ID
//! - 時刻でソート可能（生成順に並ぶ）
//! - 調整なしで生成できる（プロセス内で一意）
//! - 表示形式は `task-<ULID>`
//!
//! 結果コールバックの `task_id` はただの文字列なので、ResultStore は
//! `TaskId` ではなく表示形式の文字列をキーにする。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// タスク ID。ゲートウェイが発行し、クライアントが指定することはない。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(Ulid);

impl TaskId {
    pub const PREFIX: &'static str = "task-";

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for TaskId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseTaskIdError {
    #[error("task id must start with '{}'", TaskId::PREFIX)]
    MissingPrefix,

    #[error("invalid ulid in task id: {0}")]
    Ulid(#[from] ulid::DecodeError),
}

impl FromStr for TaskId {
    type Err = ParseTaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(Self::PREFIX)
            .ok_or(ParseTaskIdError::MissingPrefix)?;
        Ok(Self(Ulid::from_string(raw)?))
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
