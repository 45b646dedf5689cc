// src/api/types.rs

use serde::{Deserialize, Serialize};

/// Response body for `POST /api/upload`.
///
/// Always sent with HTTP 200. Decode and disk failures are reported
/// in-band through `success`, which existing clients inspect instead of
/// the status code.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub message: String,
    /// Absent on a client's first contact; the handler mints one.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
}
