// src/infra/errors.rs — Error types for aerolog

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AerologError {
    /// The uploaded file could not be decoded as a DataFlash log.
    /// Reported in-band to the client through the upload `success` flag.
    #[error("{message}")]
    Decode { message: String },

    /// Transport failure, non-success status, or malformed payload from
    /// the remote chat-completion API. The chat handler collapses all of
    /// these into one generic client-visible failure.
    #[error("chat provider error: {message}")]
    Provider { message: String },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
