use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Abstraction over the remote "rename channel" call.
///
/// Implementations must classify failures into `RenameError` so callers can
/// log them per kind instead of swallowing them.
#[async_trait]
pub trait ChannelRenamer: Send + Sync + 'static {
    async fn rename(&self, channel_id: &str, name: &str) -> Result<(), RenameError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenameErrorKind {
    PermissionDenied,
    NotFound,
    Transient,
    Unknown,
}

impl fmt::Display for RenameErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RenameErrorKind::PermissionDenied => "permission_denied",
            RenameErrorKind::NotFound => "not_found",
            RenameErrorKind::Transient => "transient",
            RenameErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenameError {
    #[error("missing permissions to modify channel (api code {code:?})")]
    PermissionDenied { code: Option<u32> },

    #[error("channel not found")]
    NotFound,

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("rename failed: {0}")]
    Unknown(String),
}

impl RenameError {
    pub fn kind(&self) -> RenameErrorKind {
        match self {
            RenameError::PermissionDenied { .. } => RenameErrorKind::PermissionDenied,
            RenameError::NotFound => RenameErrorKind::NotFound,
            RenameError::Transient(_) => RenameErrorKind::Transient,
            RenameError::Unknown(_) => RenameErrorKind::Unknown,
        }
    }
}
