//! Ports - 抽象化レイヤー
//!
//! 外部との境界（時刻、ID 生成、結果の保存先、下流への配送）を trait として定義し、
//! 実装の詳細は `impls` に置く。テストでは fake を差し込む。

pub mod clock;
pub mod forwarder;
pub mod id_generator;
pub mod result_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::forwarder::{ForwardError, Forwarder};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::result_store::ResultStore;
