//! Immutable ordered article snapshots.
//!
//! # Invariants
//! - Article ids are unique within one snapshot.
//! - A snapshot is never mutated after construction; reloads build a new one.

use crate::model::article::{Article, ArticleId};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Snapshot construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    DuplicateId {
        id: ArticleId,
        first: usize,
        second: usize,
    },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId { id, first, second } => write!(
                f,
                "article {id} appears at positions {first} and {second} in one snapshot"
            ),
        }
    }
}

impl Error for SnapshotError {}

/// Ordered view of the dataset at one point in time.
///
/// Cloning is cheap: articles are shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    articles: Arc<[Article]>,
    positions: Arc<HashMap<ArticleId, usize>>,
}

impl Snapshot {
    /// Builds a snapshot, rejecting duplicate article ids.
    pub fn new(articles: Vec<Article>) -> Result<Self, SnapshotError> {
        let mut positions = HashMap::with_capacity(articles.len());
        for (position, article) in articles.iter().enumerate() {
            if let Some(first) = positions.insert(article.id, position) {
                return Err(SnapshotError::DuplicateId {
                    id: article.id,
                    first,
                    second: position,
                });
            }
        }

        Ok(Self {
            articles: articles.into(),
            positions: Arc::new(positions),
        })
    }

    pub fn empty() -> Self {
        Self {
            articles: Arc::from(Vec::new()),
            positions: Arc::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Article> {
        self.articles.get(position)
    }

    /// Stable id of the article at `position`, if in bounds.
    pub fn id_at(&self, position: usize) -> Option<ArticleId> {
        self.get(position).map(|article| article.id)
    }

    /// Position of `id` within this snapshot.
    pub fn position_of(&self, id: ArticleId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn contains(&self, id: ArticleId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn ids(&self) -> impl Iterator<Item = ArticleId> + '_ {
        self.articles.iter().map(|article| article.id)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
