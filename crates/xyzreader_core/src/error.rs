//! Error kinds of the reader synchronization protocol.
//!
//! # Responsibility
//! - Name every failure the collection/detail handshake can hit.
//! - Separate failures surfaced to the host from failures recovered locally.
//!
//! # Invariants
//! - No variant is produced by a panic path; every error is returned.
//! - `RecoveredError` values never abort a transition; they only downgrade it
//!   to a non-anchored one.

use crate::dataset::provider::ProviderError;
use crate::dataset::slot::Screen;
use crate::model::article::ArticleId;
use crate::transition::anchor::AnchorName;
use crate::transition::handshake::SessionId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ReaderResult<T> = Result<T, ReaderError>;

/// Errors surfaced to the host.
#[derive(Debug)]
pub enum ReaderError {
    /// The dataset provider rejected or timed out a load. Not retried here.
    SnapshotLoadFailed { screen: Screen, source: ProviderError },
    /// The screen's ready signal did not fire within the configured bound.
    ReadyTimeout { screen: Screen, after_ms: u64 },
    /// `close()` was invoked again for a session that already reported.
    DoubleClose(SessionId),
    /// The screen has no loaded snapshot yet.
    NotReady(Screen),
    /// A position outside the current snapshot was supplied by the host.
    PositionOutOfBounds {
        screen: Screen,
        position: usize,
        len: usize,
    },
    /// Operation is not valid in the controller's current state.
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    /// The controller was torn down; the call had no effect.
    ControllerTornDown(Screen),
}

impl Display for ReaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SnapshotLoadFailed { screen, source } => {
                write!(f, "{screen} snapshot load failed: {source}")
            }
            Self::ReadyTimeout { screen, after_ms } => {
                write!(f, "{screen} snapshot not ready after {after_ms}ms")
            }
            Self::DoubleClose(session) => {
                write!(f, "navigator session {session} was already closed")
            }
            Self::NotReady(screen) => write!(f, "{screen} has no loaded snapshot"),
            Self::PositionOutOfBounds {
                screen,
                position,
                len,
            } => write!(
                f,
                "{screen} position {position} is out of bounds for snapshot of {len} article(s)"
            ),
            Self::InvalidState { operation, state } => {
                write!(f, "`{operation}` is not valid while {state}")
            }
            Self::ControllerTornDown(screen) => write!(f, "{screen} controller was torn down"),
        }
    }
}

impl Error for ReaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SnapshotLoadFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failures recovered by degrading to a non-anchored transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveredError {
    /// The target article is absent from the resolving screen's snapshot.
    AnchorNotFound(ArticleId),
    /// The anchor exists in the data but no on-screen element carries it.
    AnchorNotMaterialized(AnchorName),
    /// The reported index is outside the collection's snapshot bounds.
    StalePositionReport { position: usize, len: usize },
}

impl Display for RecoveredError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnchorNotFound(id) => write!(f, "article {id} not present in snapshot"),
            Self::AnchorNotMaterialized(anchor) => {
                write!(f, "anchor `{anchor}` has no materialized element")
            }
            Self::StalePositionReport { position, len } => write!(
                f,
                "reported position {position} is stale for snapshot of {len} article(s)"
            ),
        }
    }
}

impl Error for RecoveredError {}
