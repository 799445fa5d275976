//! Core state model for the XYZ Reader collection and detail screens.
//! This crate owns the position/identity synchronization between the two
//! screens; rendering and networking live in the host.

pub mod config;
pub mod controller;
pub mod dataset;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod transition;

pub use config::{ConfigError, ReaderConfig};
pub use controller::collection::{
    CollectionController, CollectionState, ReturnResolution, ReturnTransition,
};
pub use controller::navigator::{
    ExitMapping, NavigationSession, NavigatorController, NavigatorState, NavigatorUpdate,
    PagerState,
};
pub use dataset::provider::{
    fetch_snapshot, DatasetProvider, InMemoryDatasetProvider, ProviderError, ProviderResult,
    SqliteDatasetProvider,
};
pub use dataset::slot::{LoadOutcome, LoadTicket, ReadySignal, Readiness, Screen};
pub use dataset::snapshot::{Snapshot, SnapshotError};
pub use error::{ReaderError, ReaderResult, RecoveredError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::article::{Article, ArticleId, ArticleValidationError};
pub use repo::article_repo::{ArticleRepository, RepoError, RepoResult, SqliteArticleRepository};
pub use transition::anchor::{anchor_name, AnchorName, AnchorTargets};
pub use transition::handshake::{
    reconcile_return, ClickedItem, ClosedEvent, OpenRequest, Reconciliation, ReturnTarget,
    SessionId,
};

/// Minimal health-check used by host smoke probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
