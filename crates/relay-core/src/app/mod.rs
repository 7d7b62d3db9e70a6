//! App - アプリケーション層
//!
//! ports を組み合わせてゲートウェイの各操作を実装する。
//!
//! # 主要コンポーネント
//! - **GatewayBuilder**: 構築とワイヤリング（起動時検証）
//! - **RouteTable**: agent_id → 配送先 URL
//! - **Dispatcher**: タスク受付と配送予約
//! - **ForwardPool**: 配送ごとの task（fire-and-forget、agent 単位の同時実行上限）
//! - **ResultIngestion** / **StatusLookup**: 結果の保存と参照

pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod forward_pool;
pub mod ingestion;
pub mod routes;
pub mod status;

pub use self::builder::{App, BuildError, Gateway, GatewayBuilder};
pub use self::config::{ApiKey, ConfigError, GatewayConfig};
pub use self::dispatcher::Dispatcher;
pub use self::ingestion::ResultIngestion;
pub use self::routes::{Route, RouteTable};
pub use self::status::StatusLookup;
pub use self::forward_pool::{ForwardJob, ForwardPool, ForwardQueue};
