//! Error types for the fetch-and-aggregate pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Failure reported by a [`crate::http_client::Transport`] for one GET.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("http status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Io(String),
}

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The identifier lookup (league code, manager id) was rejected upstream.
    #[error("not found: {what} ({source})")]
    NotFound {
        what: String,
        #[source]
        source: TransportError,
    },

    /// A data endpoint answered with a non-success status or timed out.
    #[error("remote unavailable: {what} ({source})")]
    RemoteUnavailable {
        what: String,
        #[source]
        source: TransportError,
    },

    /// No gameweek is flagged as current in the bootstrap data.
    #[error("no current gameweek flagged upstream")]
    StateUnavailable,

    /// The body arrived but did not have the expected shape.
    #[error("invalid {what} json: {message}")]
    Parse { what: &'static str, message: String },

    #[error("unknown chip code `{0}`")]
    UnknownChip(String),

    #[error("player {player_id} missing from {source_name}")]
    MissingPlayer {
        player_id: u32,
        source_name: &'static str,
    },

    #[error("http client build failed: {0}")]
    Client(String),

    /// Wraps the error that aborted one manager's slice.
    #[error("manager {manager_id}: {source}")]
    ManagerSlice {
        manager_id: u32,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    pub fn not_found(what: impl Into<String>, source: TransportError) -> Self {
        Self::NotFound {
            what: what.into(),
            source,
        }
    }

    pub fn unavailable(what: impl Into<String>, source: TransportError) -> Self {
        Self::RemoteUnavailable {
            what: what.into(),
            source,
        }
    }

    pub fn parse(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            what,
            message: err.to_string(),
        }
    }

    pub fn for_manager(manager_id: u32, err: FetchError) -> Self {
        match err {
            already @ Self::ManagerSlice { .. } => already,
            other => Self::ManagerSlice {
                manager_id,
                source: Box::new(other),
            },
        }
    }

    /// The manager id attached by [`FetchError::for_manager`], if any.
    pub fn manager_id(&self) -> Option<u32> {
        match self {
            Self::ManagerSlice { manager_id, .. } => Some(*manager_id),
            _ => None,
        }
    }
}
