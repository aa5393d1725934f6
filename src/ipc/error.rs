use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from the Discord IPC client.
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("no Discord IPC socket found under {}", .0.display())]
    EndpointNotFound(PathBuf),

    #[error("failed to connect to {}: {source}", path.display())]
    ConnectFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("handshake failed: {0}")]
    HandshakeFailed(#[source] Box<IpcError>),

    #[error("reconnect failed: {0}")]
    ReconnectFailed(#[source] Box<IpcError>),

    #[error("stream closed after {read} of {expected} bytes")]
    ShortRead { expected: usize, read: usize },

    #[error("failed to send frame: {0}")]
    SendFailed(#[source] Box<IpcError>),

    #[error("failed to read response: {0}")]
    ReceiveFailed(#[source] Box<IpcError>),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl IpcError {
    pub(crate) fn handshake(err: IpcError) -> Self {
        Self::HandshakeFailed(Box::new(err))
    }

    pub(crate) fn reconnect(err: IpcError) -> Self {
        Self::ReconnectFailed(Box::new(err))
    }

    pub(crate) fn send(err: IpcError) -> Self {
        Self::SendFailed(Box::new(err))
    }

    pub(crate) fn receive(err: IpcError) -> Self {
        Self::ReceiveFailed(Box::new(err))
    }
}
