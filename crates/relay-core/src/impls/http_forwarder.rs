//! HttpForwarder - reqwest で下流エージェントへ POST する
//!
//! - body: `{task_id, agent_id, task, context}`
//! - header: `X-API-Key`（ゲートウェイと同じ共有シークレット）
//! - レスポンス body は読まない。2xx 以外は失敗扱い。

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::API_KEY_HEADER;
use crate::app::config::ApiKey;
use crate::domain::ForwardRequest;
use crate::ports::{ForwardError, Forwarder};

pub struct HttpForwarder {
    client: reqwest::Client,
    api_key: ApiKey,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(api_key: ApiKey, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            timeout,
        })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, url: &Url, request: &ForwardRequest) -> Result<(), ForwardError> {
        let response = self
            .client
            .post(url.clone())
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ForwardError::Timeout(self.timeout)
                } else {
                    ForwardError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForwardError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentId, TaskId, TaskSubmission};
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use ulid::Ulid;

    type Captured = (Option<String>, Value);

    /// Throwaway agent service that records what it receives.
    async fn spawn_agent(status: StatusCode) -> (Url, mpsc::UnboundedReceiver<Captured>) {
        let (tx, rx) = mpsc::unbounded_channel::<Captured>();
        let app = Router::new()
            .route(
                "/agent",
                post(
                    move |State(tx): State<mpsc::UnboundedSender<Captured>>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| async move {
                        let key = headers
                            .get(API_KEY_HEADER)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let _ = tx.send((key, body));
                        status
                    },
                ),
            )
            .with_state(tx);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (Url::parse(&format!("http://{addr}/agent")).unwrap(), rx)
    }

    fn request() -> ForwardRequest {
        let mut submission = TaskSubmission::new(AgentId::Chercheur, "find X");
        submission.context.insert("depth".to_string(), json!(2));
        ForwardRequest {
            task_id: TaskId::from_ulid(Ulid::new()),
            submission,
        }
    }

    #[tokio::test]
    async fn posts_merged_payload_with_shared_secret() {
        let (url, mut rx) = spawn_agent(StatusCode::OK).await;
        let forwarder =
            HttpForwarder::new(ApiKey::new("s3cret"), Duration::from_secs(5)).unwrap();
        let request = request();

        forwarder.forward(&url, &request).await.unwrap();

        let (key, body) = rx.recv().await.unwrap();
        assert_eq!(key.as_deref(), Some("s3cret"));
        assert_eq!(body["task_id"], request.task_id.to_string());
        assert_eq!(body["agent_id"], "chercheur");
        assert_eq!(body["task"], "find X");
        assert_eq!(body["context"]["depth"], 2);
    }

    #[tokio::test]
    async fn non_success_status_is_a_forward_error() {
        let (url, _rx) = spawn_agent(StatusCode::INTERNAL_SERVER_ERROR).await;
        let forwarder =
            HttpForwarder::new(ApiKey::new("s3cret"), Duration::from_secs(5)).unwrap();

        let err = forwarder.forward(&url, &request()).await.unwrap_err();
        assert!(matches!(err, ForwardError::Status(500)));
    }

    #[tokio::test]
    async fn unreachable_agent_is_a_transport_error() {
        // 一度 bind して閉じたポートには誰も listen していない
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/agent")).unwrap();
        let forwarder =
            HttpForwarder::new(ApiKey::new("s3cret"), Duration::from_secs(5)).unwrap();

        let err = forwarder.forward(&url, &request()).await.unwrap_err();
        assert!(matches!(err, ForwardError::Transport(_)));
    }
}
