// src/api/handlers.rs

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::types::{ChatQuery, ChatReply, UploadResponse};
use crate::api::ApiState;
use crate::infra::errors::AerologError;
use crate::prompt;
use crate::provider::{ChatRequest, Message};
use crate::telemetry;

/// POST /api/upload — save the log file, decode it, store the telemetry.
///
/// Always answers HTTP 200; failures come back as `success:false` with the
/// error text in `message`.
pub async fn upload_log(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Json<UploadResponse> {
    let (session_id, outcome) = ingest_upload(&state, multipart).await;
    match outcome {
        Ok(()) => Json(UploadResponse {
            success: true,
            message: "File uploaded and telemetry parsed".into(),
            session_id,
        }),
        Err(e) => {
            tracing::warn!(error = %e, session_id = %session_id, "upload failed");
            Json(UploadResponse {
                success: false,
                message: e.to_string(),
                session_id,
            })
        }
    }
}

/// Pull the multipart fields out, then hand off to `store_upload`. The
/// session id is resolved (given or minted) before any fallible work so
/// that error responses can still echo it.
async fn ingest_upload(
    state: &ApiState,
    mut multipart: Multipart,
) -> (String, Result<(), AerologError>) {
    let mut session_id = String::new();
    let mut upload: Option<(String, Bytes)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().map(str::to_string);
                match name.as_deref() {
                    Some("session_id") => match field.text().await {
                        Ok(text) => session_id = text.trim().to_string(),
                        Err(e) => return (session_id, Err(anyhow::anyhow!(e).into())),
                    },
                    Some("file") => {
                        let filename = field
                            .file_name()
                            .map(str::to_string)
                            .unwrap_or_else(|| "upload.bin".into());
                        match field.bytes().await {
                            Ok(data) => upload = Some((filename, data)),
                            Err(e) => return (session_id, Err(anyhow::anyhow!(e).into())),
                        }
                    }
                    _ => {}
                }
            }
            Ok(None) => break,
            Err(e) => return (session_id, Err(anyhow::anyhow!(e).into())),
        }
    }

    if session_id.is_empty() {
        session_id = uuid::Uuid::new_v4().to_string();
    }

    let result = store_upload(state, &session_id, upload).await;
    (session_id, result)
}

async fn store_upload(
    state: &ApiState,
    session_id: &str,
    upload: Option<(String, Bytes)>,
) -> Result<(), AerologError> {
    let Some((filename, data)) = upload else {
        return Err(anyhow::anyhow!("request carries no file field").into());
    };

    // randomized prefix keeps concurrent uploads of the same filename apart
    let prefix = uuid::Uuid::new_v4().simple().to_string();
    let stored_name = format!("{}_{}", &prefix[..8], sanitize_filename(&filename));
    let path = state.config.storage.upload_dir.join(stored_name);

    tokio::fs::write(&path, &data).await?;
    tracing::info!(file = %path.display(), bytes = data.len(), "log file saved");

    let parse_path = path.clone();
    let dataset = tokio::task::spawn_blocking(move || telemetry::parse_log_file(&parse_path))
        .await
        .map_err(|e| anyhow::anyhow!("log decode task failed: {e}"))??;

    state.sessions.put_telemetry(session_id, dataset);
    Ok(())
}

/// Strip any client-supplied directory components.
fn sanitize_filename(name: &str) -> String {
    std::path::Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("upload.bin")
        .to_string()
}

/// POST /api/chat — answer a question against the session's telemetry.
///
/// Every failure in this path collapses to one generic 500 reply; the
/// session id is echoed either way.
pub async fn chat(
    State(state): State<ApiState>,
    Json(query): Json<ChatQuery>,
) -> Result<Json<ChatReply>, (StatusCode, Json<ChatReply>)> {
    let session_id = query
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    match answer(&state, &session_id, &query.message).await {
        Ok(response) => Ok(Json(ChatReply {
            response,
            session_id,
        })),
        Err(e) => {
            tracing::error!(error = %e, session_id = %session_id, "chat request failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatReply {
                    response: "Internal server error.".into(),
                    session_id,
                }),
            ))
        }
    }
}

async fn answer(
    state: &ApiState,
    session_id: &str,
    message: &str,
) -> Result<String, AerologError> {
    let memory = state.config.chat.conversation_memory;

    let mut messages = if memory {
        state.sessions.history(session_id)
    } else {
        Vec::new()
    };
    if messages.is_empty() {
        let telemetry = state.sessions.telemetry(session_id);
        messages.push(Message::system(prompt::build_system_prompt(&telemetry)));
    }
    messages.push(Message::user(message));

    let request = ChatRequest {
        model: state.config.chat.model.clone(),
        messages: messages.clone(),
        max_tokens: Some(state.config.chat.max_tokens),
        temperature: Some(state.config.chat.temperature),
    };
    let response = state.provider.chat(request).await?;
    tracing::debug!(
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        "chat completion"
    );

    if memory {
        messages.push(Message::assistant(response.content.clone()));
        state.sessions.put_history(session_id, messages);
    }

    Ok(response.content)
}
