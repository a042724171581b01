// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the control API.
//!
//! Every operation is idempotent: repeating a request converges on the
//! same state instead of erroring (except where a precondition
//! genuinely fails, which maps to a 4xx).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use waworker_core::types::{BotConfig, BotConfigPatch, Channel, ChannelPatch, ChannelStatus};
use waworker_core::WorkerError;

use crate::error::{ApiError, ErrorBody, JsonBody};
use crate::server::GatewayState;

/// Request body for POST /v1/channels.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateChannelRequest {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Request body for PATCH /v1/channels/{id}.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateChannelRequest {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Request body for POST /v1/channels/{id}/messages/send.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendRequest {
    pub to: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub message_id: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: ChannelStatus,
}

/// Bot config wrapped the way the dashboard client reads it.
#[derive(Debug, Serialize)]
pub struct BotConfigResponse {
    pub config: BotConfig,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn handle_for(
    state: &GatewayState,
    channel_id: &str,
) -> Result<waworker_supervisor::ChannelHandle, ApiError> {
    state
        .registry
        .get(channel_id)
        .ok_or_else(|| ApiError::Worker(WorkerError::NotFound(format!("channel {channel_id}"))))
}

async fn channel_record(
    state: &GatewayState,
    channel_id: &str,
) -> Result<Channel, ApiError> {
    state
        .store
        .get_channel(channel_id)
        .await?
        .ok_or_else(|| ApiError::Worker(WorkerError::NotFound(format!("channel {channel_id}"))))
}

/// POST /v1/channels
///
/// Registers a new channel with a generated id and returns its record.
pub async fn post_channels(
    State(state): State<GatewayState>,
    JsonBody(body): JsonBody<CreateChannelRequest>,
) -> Result<Json<Channel>, ApiError> {
    let channel_id = Uuid::new_v4().to_string();
    let _ = state.registry.ensure_channel(&channel_id).await;
    if let Some(name) = body.display_name {
        state
            .store
            .merge_channel(
                &channel_id,
                &ChannelPatch {
                    display_name: Some(name),
                    ..ChannelPatch::default()
                },
            )
            .await?;
    }
    Ok(Json(channel_record(&state, &channel_id).await?))
}

/// GET /v1/channels
pub async fn get_channels(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<Channel>>, ApiError> {
    Ok(Json(state.store.list_channels().await?))
}

/// GET /v1/channels/{id}
pub async fn get_channel(
    State(state): State<GatewayState>,
    Path(channel_id): Path<String>,
) -> Result<Json<Channel>, ApiError> {
    Ok(Json(channel_record(&state, &channel_id).await?))
}

/// PATCH /v1/channels/{id}
pub async fn patch_channel(
    State(state): State<GatewayState>,
    Path(channel_id): Path<String>,
    JsonBody(body): JsonBody<UpdateChannelRequest>,
) -> Result<Json<Channel>, ApiError> {
    // 404 before merging: a patch must not create a channel.
    let _ = channel_record(&state, &channel_id).await?;
    if let Some(name) = body.display_name {
        state
            .store
            .merge_channel(
                &channel_id,
                &ChannelPatch {
                    display_name: Some(name),
                    ..ChannelPatch::default()
                },
            )
            .await?;
    }
    Ok(Json(channel_record(&state, &channel_id).await?))
}

/// POST /v1/channels/{id}/qr
pub async fn post_qr(
    State(state): State<GatewayState>,
    Path(channel_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let handle = handle_for(&state, &channel_id)?;
    handle.request_qr().await?;
    Ok(Json(StatusResponse {
        status: handle.status().await?,
    }))
}

/// POST /v1/channels/{id}/disconnect
pub async fn post_disconnect(
    State(state): State<GatewayState>,
    Path(channel_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let handle = handle_for(&state, &channel_id)?;
    handle.disconnect().await?;
    Ok(Json(StatusResponse {
        status: handle.status().await?,
    }))
}

/// POST /v1/channels/{id}/resetSession
pub async fn post_reset_session(
    State(state): State<GatewayState>,
    Path(channel_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let handle = handle_for(&state, &channel_id)?;
    handle.reset_session().await?;
    Ok(Json(StatusResponse {
        status: handle.status().await?,
    }))
}

/// POST /v1/channels/{id}/repair
pub async fn post_repair(
    State(state): State<GatewayState>,
    Path(channel_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let handle = handle_for(&state, &channel_id)?;
    handle.repair().await?;
    Ok(Json(StatusResponse {
        status: handle.status().await?,
    }))
}

/// POST /v1/channels/{id}/messages/send
pub async fn post_send(
    State(state): State<GatewayState>,
    Path(channel_id): Path<String>,
    JsonBody(body): JsonBody<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let handle = handle_for(&state, &channel_id)?;
    let message_id = handle.send_message(&body.to, &body.text).await?;
    // The message is already on the wire; a failed history write must
    // not make the client re-send it.
    if let Err(e) = state
        .ingress
        .record_outbound(&channel_id, &body.to, &message_id, &body.text)
        .await
    {
        warn!(channel_id = %channel_id, message_id = %message_id, error = %e,
            "sent message not recorded in history");
    }
    Ok(Json(SendResponse { message_id }))
}

/// POST /v1/channels/{id}/conversations/{jid}/markRead
pub async fn post_mark_read(
    State(state): State<GatewayState>,
    Path((channel_id, jid)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    handle_for(&state, &channel_id)?;
    state.ingress.mark_read(&channel_id, &jid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/channels/{id}/bot/config
pub async fn get_bot_config(
    State(state): State<GatewayState>,
    Path(channel_id): Path<String>,
) -> Result<Json<BotConfigResponse>, ApiError> {
    handle_for(&state, &channel_id)?;
    let config = state.store.get_bot_config(&channel_id).await?;
    Ok(Json(BotConfigResponse { config }))
}

/// PUT /v1/channels/{id}/bot/config
pub async fn put_bot_config(
    State(state): State<GatewayState>,
    Path(channel_id): Path<String>,
    JsonBody(patch): JsonBody<BotConfigPatch>,
) -> Result<Json<BotConfigResponse>, ApiError> {
    handle_for(&state, &channel_id)?;
    let config = state.store.put_bot_config(&channel_id, &patch).await?;
    Ok(Json(BotConfigResponse { config }))
}

/// Fallback: JSON 404 for unknown routes.
pub async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "route not found".to_string(),
            code: "not_found",
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_accepts_camel_case() {
        let req: CreateChannelRequest =
            serde_json::from_str(r#"{"displayName": "Loja"}"#).unwrap();
        assert_eq!(req.display_name.as_deref(), Some("Loja"));
        let req: CreateChannelRequest = serde_json::from_str("{}").unwrap();
        assert!(req.display_name.is_none());
    }

    #[test]
    fn create_request_rejects_unknown_fields() {
        let result: Result<CreateChannelRequest, _> =
            serde_json::from_str(r#"{"companyId": "c9"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn send_request_requires_both_fields() {
        let result: Result<SendRequest, _> = serde_json::from_str(r#"{"to": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn status_response_uses_wire_form() {
        let json = serde_json::to_string(&StatusResponse {
            status: ChannelStatus::Qr,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"QR"}"#);
    }
}
