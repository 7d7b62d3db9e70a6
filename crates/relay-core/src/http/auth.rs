//! API キー認証 middleware
//!
//! - liveness 以外の全ルートに `route_layer` で掛ける
//! - extractor が body を読む前に走るので、401 は常に 400 より先に判定される
//! - 比較は `ApiKey::matches`（定数時間）

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::API_KEY_HEADER;
use crate::app::Gateway;
use crate::domain::GatewayError;

pub async fn require_api_key(
    State(gateway): State<Arc<Gateway>>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let authorized = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|presented| gateway.api_key().matches(presented));

    if !authorized {
        tracing::debug!(
            method = %request.method(),
            path = %request.uri().path(),
            "rejected request without a valid API key"
        );
        return Err(GatewayError::Unauthorized);
    }

    Ok(next.run(request).await)
}
