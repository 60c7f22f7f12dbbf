//! HTTP layer errors.

use thiserror::Error;

/// Failure to produce a response for a dispatched request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The chain or handler finished without emitting a response.
    #[error("{method} {path} finished without a response")]
    Unanswered {
        method: String,
        path: String,
        route: Option<String>,
    },
}

/// Errors from binding or running the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
