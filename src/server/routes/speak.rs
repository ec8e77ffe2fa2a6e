//! Synthesis routes
//!
//! Thin transport adapters: each handler builds a [`SynthesisRequest`]
//! and hands it to the shared orchestrator. No pipeline logic lives
//! here.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::debug;

use crate::pipeline::SynthesisRequest;
use crate::server::server_core::AppState;
use crate::server::types::{ApiError, SpeakRequest, SpeakResponse};

/// `POST /speak` — JSON body, default or pre-registered voice
pub async fn speak(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, ApiError> {
    let request = SynthesisRequest {
        text: body.text,
        voice_sample: None,
        profile_id: body.voice_id,
    };
    let link = state.orchestrator.run(request).await?;
    Ok(Json(SpeakResponse {
        url: link.url,
        object_id: link.object_id,
    }))
}

/// `POST /clone` — multipart `text` field plus optional `audio` file
pub async fn clone_speak(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<SpeakResponse>, ApiError> {
    let mut text: Option<String> = None;
    let mut audio: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("text") => {
                text = Some(field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("unreadable text field: {}", e))
                })?);
            }
            Some("audio") => {
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("unreadable audio field: {}", e))
                })?;
                debug!(bytes = bytes.len(), "received voice sample");
                audio = Some(bytes.to_vec());
            }
            other => {
                debug!(field = ?other, "ignoring unknown multipart field");
            }
        }
    }

    let request = SynthesisRequest {
        text: text.unwrap_or_default(),
        voice_sample: audio,
        profile_id: None,
    };
    let link = state.orchestrator.run(request).await?;
    Ok(Json(SpeakResponse {
        url: link.url,
        object_id: link.object_id,
    }))
}
