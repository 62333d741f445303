//! Unified error types surfaced by the session API.
//!
//! Queue rejections are not errors — they come back as `false` from the
//! handle. These variants cover infrastructure failures only.

use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session requires a room gateway before building")]
    MissingGateway,

    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}
