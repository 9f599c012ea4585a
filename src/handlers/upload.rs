use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use shared::SessionId;
use upload_core::features::session::dto::{
    AbortCommand, FinalizeCommand, InitUploadCommand, PutChunkCommand, StatusQuery,
};

use crate::app_state::AppState;
use crate::error::{AppError, Result};
use crate::handlers::{authenticate, CHUNK_CHECKSUM_HEADER, CHUNK_INDEX_HEADER};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitRequest {
    pub filename: String,
    pub size: u64,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub folder: String,
}

pub async fn init(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<InitRequest>,
) -> Result<impl IntoResponse> {
    let owner_id = authenticate(&headers, &state.service_credential)?;

    let target_path = if body.folder.trim().is_empty() {
        body.filename.clone()
    } else {
        format!("{}/{}", body.folder.trim_end_matches('/'), body.filename)
    };

    let response = state
        .session_service
        .init(InitUploadCommand {
            owner_id,
            file_name: body.filename,
            declared_size: body.size,
            mime_hint: body.mime_type,
            target_path,
        })
        .await?;

    Ok(Json(response))
}

pub async fn put_chunk(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let owner_id = authenticate(&headers, &state.service_credential)?;
    let session_id = parse_session_id(&id)?;

    let chunk_index = headers
        .get(CHUNK_INDEX_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| AppError::BadRequest(format!("missing or malformed {CHUNK_INDEX_HEADER} header")))?;

    let client_digest = headers
        .get(CHUNK_CHECKSUM_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let response = state
        .session_service
        .put_chunk(PutChunkCommand {
            session_id,
            owner_id,
            chunk_index,
            client_digest,
            bytes: body,
        })
        .await?;

    Ok(Json(response))
}

pub async fn finalize(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let owner_id = authenticate(&headers, &state.service_credential)?;
    let session_id = parse_session_id(&id)?;

    let response = state
        .session_service
        .finalize(FinalizeCommand { session_id, owner_id })
        .await?;

    Ok(Json(response))
}

pub async fn abort(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let owner_id = authenticate(&headers, &state.service_credential)?;
    let session_id = parse_session_id(&id)?;

    let response = state
        .session_service
        .abort(AbortCommand { session_id, owner_id })
        .await?;

    Ok(Json(AbortResponseBody { status: response.status }))
}

pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let owner_id = authenticate(&headers, &state.service_credential)?;
    let session_id = parse_session_id(&id)?;

    let response = state
        .session_service
        .status(StatusQuery { session_id, owner_id })
        .await?;

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct AbortResponseBody {
    status: &'static str,
}

fn parse_session_id(raw: &str) -> Result<SessionId> {
    SessionId::parse(raw).map_err(|_| AppError::BadRequest(format!("invalid upload id {raw}")))
}
