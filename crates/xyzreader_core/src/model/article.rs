//! Article domain model.
//!
//! # Responsibility
//! - Define the canonical article record rendered by both screens.
//! - Validate display invariants before an article enters a snapshot.
//!
//! # Invariants
//! - `id` is stable across reloads and never reused for another article.
//! - `aspect_ratio` is finite and strictly positive.
//! - `title` is never blank.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier for one article.
///
/// Assigned by the article source and kept across every reload, unlike list
/// positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

impl Display for ArticleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for article invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleValidationError {
    BlankTitle(ArticleId),
    InvalidAspectRatio { id: ArticleId, value: f32 },
}

impl Display for ArticleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle(id) => write!(f, "article {id} has a blank title"),
            Self::InvalidAspectRatio { id, value } => write!(
                f,
                "article {id} has invalid aspect_ratio ({value}); expected a finite value > 0"
            ),
        }
    }
}

impl Error for ArticleValidationError {}

/// Canonical article record.
///
/// Snapshots hold articles by value; screens only ever read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub author: String,
    /// Unix epoch milliseconds.
    pub published_at: i64,
    /// Grid thumbnail reference.
    pub thumb_url: String,
    /// Full-size photo shown by the detail pager.
    pub photo_url: String,
    /// Thumbnail width / height, used to reserve grid cell height.
    pub aspect_ratio: f32,
    pub body: String,
}

impl Article {
    /// Creates an article with empty media/body fields and a square thumbnail.
    pub fn new(id: ArticleId, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            published_at: 0,
            thumb_url: String::new(),
            photo_url: String::new(),
            aspect_ratio: 1.0,
            body: String::new(),
        }
    }

    /// Checks display invariants.
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        if self.title.trim().is_empty() {
            return Err(ArticleValidationError::BlankTitle(self.id));
        }
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(ArticleValidationError::InvalidAspectRatio {
                id: self.id,
                value: self.aspect_ratio,
            });
        }
        Ok(())
    }

    /// Subtitle line shown under the title: publish time and author.
    pub fn byline(&self, published_label: &str) -> String {
        if self.author.trim().is_empty() {
            published_label.to_string()
        } else {
            format!("{published_label} by {}", self.author.trim())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Article, ArticleId, ArticleValidationError};

    #[test]
    fn validate_rejects_blank_title() {
        let article = Article::new(ArticleId(7), "   ", "someone");
        assert_eq!(
            article.validate().unwrap_err(),
            ArticleValidationError::BlankTitle(ArticleId(7))
        );
    }

    #[test]
    fn validate_rejects_non_positive_aspect_ratio() {
        let mut article = Article::new(ArticleId(1), "title", "author");
        article.aspect_ratio = 0.0;
        assert!(matches!(
            article.validate(),
            Err(ArticleValidationError::InvalidAspectRatio { .. })
        ));

        article.aspect_ratio = f32::NAN;
        assert!(article.validate().is_err());
    }

    #[test]
    fn byline_skips_missing_author() {
        let mut article = Article::new(ArticleId(1), "title", "  Carl  ");
        assert_eq!(article.byline("2 hours ago"), "2 hours ago by Carl");

        article.author.clear();
        assert_eq!(article.byline("2 hours ago"), "2 hours ago");
    }
}
