//! Impls - ports の実装
//!
//! - **InMemoryResultStore**: プロセス内の結果ストア
//! - **HttpForwarder**: reqwest による下流エージェントへの配送

pub mod http_forwarder;
pub mod inmem_results;

pub use self::http_forwarder::HttpForwarder;
pub use self::inmem_results::InMemoryResultStore;
