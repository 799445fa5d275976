//! Dataset provider contract and the providers shipped with the core.
//!
//! # Responsibility
//! - Define the asynchronous `load` + `find_index` contract screens consume.
//! - Bound a single load with a caller-visible timeout.
//! - Provide SQLite-backed and in-memory implementations.
//!
//! # Invariants
//! - A provider never hands out a partially built snapshot.
//! - Load failures are returned, never retried by the core.

use crate::db::{open_db, DbError};
use crate::dataset::snapshot::{Snapshot, SnapshotError};
use crate::model::article::{Article, ArticleId};
use crate::repo::article_repo::{ArticleRepository, RepoError, SqliteArticleRepository};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Dataset load failures.
#[derive(Debug)]
pub enum ProviderError {
    Db(DbError),
    Repo(RepoError),
    InvalidSnapshot(SnapshotError),
    TimedOut { after_ms: u64 },
    /// The blocking worker running the load did not finish.
    Worker(String),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InvalidSnapshot(err) => write!(f, "{err}"),
            Self::TimedOut { after_ms } => write!(f, "dataset load timed out after {after_ms}ms"),
            Self::Worker(message) => write!(f, "dataset load worker failed: {message}"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidSnapshot(err) => Some(err),
            Self::TimedOut { .. } | Self::Worker(_) => None,
        }
    }
}

impl From<DbError> for ProviderError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ProviderError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SnapshotError> for ProviderError {
    fn from(value: SnapshotError) -> Self {
        Self::InvalidSnapshot(value)
    }
}

/// Source of ordered article snapshots.
///
/// Loads may be triggered independently by each screen and may complete in
/// any order.
#[async_trait]
pub trait DatasetProvider: Send + Sync {
    /// Loads a fresh snapshot of the whole dataset.
    async fn load(&self) -> ProviderResult<Snapshot>;

    /// Finds the position of `id` in `snapshot`.
    fn find_index(&self, snapshot: &Snapshot, id: ArticleId) -> Option<usize> {
        snapshot.position_of(id)
    }
}

/// Runs one provider load bounded by `timeout`.
pub async fn fetch_snapshot<P>(provider: &P, timeout: Duration) -> ProviderResult<Snapshot>
where
    P: DatasetProvider + ?Sized,
{
    let started_at = Instant::now();
    debug!("event=snapshot_fetch module=dataset status=start");

    let result = match tokio::time::timeout(timeout, provider.load()).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::TimedOut {
            after_ms: duration_ms(timeout),
        }),
    };

    match &result {
        Ok(snapshot) => info!(
            "event=snapshot_fetch module=dataset status=ok count={} duration_ms={}",
            snapshot.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=snapshot_fetch module=dataset status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

/// Provider reading the article table of a SQLite database file.
///
/// Every load opens its own connection on a blocking worker.
#[derive(Debug, Clone)]
pub struct SqliteDatasetProvider {
    db_path: PathBuf,
}

impl SqliteDatasetProvider {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }
}

#[async_trait]
impl DatasetProvider for SqliteDatasetProvider {
    async fn load(&self) -> ProviderResult<Snapshot> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> ProviderResult<Snapshot> {
            let conn = open_db(&db_path)?;
            let repo = SqliteArticleRepository::try_new(&conn)?;
            let articles = repo.list_articles()?;
            Ok(Snapshot::new(articles)?)
        })
        .await
        .map_err(|err| ProviderError::Worker(err.to_string()))?
    }
}

/// Provider over an in-process article list.
///
/// `replace` swaps the list; the next `load` observes it.
#[derive(Debug, Default)]
pub struct InMemoryDatasetProvider {
    articles: RwLock<Vec<Article>>,
    loads: AtomicUsize,
}

impl InMemoryDatasetProvider {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            articles: RwLock::new(articles),
            loads: AtomicUsize::new(0),
        }
    }

    /// Replaces the dataset seen by subsequent loads.
    pub fn replace(&self, articles: Vec<Article>) {
        let mut guard = self.articles.write().unwrap_or_else(PoisonError::into_inner);
        *guard = articles;
    }

    /// Number of completed `load` calls.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DatasetProvider for InMemoryDatasetProvider {
    async fn load(&self) -> ProviderResult<Snapshot> {
        let articles = self
            .articles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let snapshot = Snapshot::new(articles)?;
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(snapshot)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
