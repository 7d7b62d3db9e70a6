//! relay-core
//!
//! タスク配送ゲートウェイ。HTTP でタスクを受け付け、`agent_id` で選んだ
//! agent サービスへ fire-and-forget で配送し、agent から返ってきた最新の結果を
//! `task_id` ごとに保持する。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, agent, task, outcome, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, ResultStore, Forwarder）
//! - **impls**: 実装（InMemoryResultStore, HttpForwarder）
//! - **app**: アプリケーションロジック（builder, dispatcher, forward_pool, ingestion, status）
//! - **http**: axum による HTTP 表層（認証 middleware, handlers）
//! - **observability**: tracing の初期化

pub mod app;
pub mod domain;
pub mod http;
pub mod impls;
pub mod observability;
pub mod ports;

/// 共有シークレットのヘッダ名（受信時に検証し、配送時に付与する）
pub const API_KEY_HEADER: &str = "x-api-key";

pub const SERVICE_NAME: &str = "relay-gateway";
