use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::SERVICE_NAME;
use crate::app::Gateway;
use crate::domain::{Ack, GatewayError, TaskResult, TaskSubmission};

#[derive(Debug, Serialize, Deserialize)]
pub struct Liveness {
    pub ok: bool,
    pub service: String,
    pub time: String,
}

pub async fn liveness(State(gateway): State<Arc<Gateway>>) -> Json<Liveness> {
    Json(Liveness {
        ok: true,
        service: SERVICE_NAME.to_string(),
        time: gateway
            .clock()
            .now()
            .to_rfc3339_opts(SecondsFormat::Micros, true),
    })
}

pub async fn submit_task(
    State(gateway): State<Arc<Gateway>>,
    payload: Result<Json<TaskSubmission>, JsonRejection>,
) -> Result<Json<Ack>, GatewayError> {
    let Json(submission) = payload?;
    let ack = gateway.dispatcher().submit(submission)?;
    Ok(Json(ack))
}

pub async fn push_result(
    State(gateway): State<Arc<Gateway>>,
    payload: Result<Json<TaskResult>, JsonRejection>,
) -> Result<StatusCode, GatewayError> {
    let Json(result) = payload?;
    gateway.ingestion().ingest(result).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_status(
    State(gateway): State<Arc<Gateway>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResult>, GatewayError> {
    let result = gateway.status().get_status(&task_id).await?;
    Ok(Json(result))
}
