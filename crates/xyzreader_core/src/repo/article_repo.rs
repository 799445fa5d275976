//! Article repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Store articles produced by the refresh process.
//! - List articles in the order both reader screens display them.
//!
//! # Invariants
//! - List order is `published_at DESC, id ASC` and is deterministic.
//! - `replace_all` swaps the whole article set in one transaction.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::article::{Article, ArticleId, ArticleValidationError};
use log::info;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ARTICLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    author,
    body,
    thumb_url,
    photo_url,
    aspect_ratio,
    published_at
FROM articles";

const ARTICLE_UPSERT_SQL: &str = "INSERT INTO articles (
    id,
    title,
    author,
    body,
    thumb_url,
    photo_url,
    aspect_ratio,
    published_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    author = excluded.author,
    body = excluded.body,
    thumb_url = excluded.thumb_url,
    photo_url = excluded.photo_url,
    aspect_ratio = excluded.aspect_ratio,
    published_at = excluded.published_at;";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for article persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(ArticleValidationError),
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted article data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ArticleValidationError> for RepoError {
    fn from(value: ArticleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for reader articles.
pub trait ArticleRepository {
    /// Inserts or updates one article by id.
    fn upsert_article(&self, article: &Article) -> RepoResult<()>;
    /// Replaces the full article set atomically; returns the stored count.
    fn replace_all(&self, articles: &[Article]) -> RepoResult<usize>;
    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    /// Lists every article in display order.
    fn list_articles(&self) -> RepoResult<Vec<Article>>;
    fn count_articles(&self) -> RepoResult<usize>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    /// Wraps a connection that was opened through `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn upsert_article(&self, article: &Article) -> RepoResult<()> {
        article.validate()?;
        upsert_with(self.conn, article)
    }

    fn replace_all(&self, articles: &[Article]) -> RepoResult<usize> {
        for article in articles {
            article.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM articles;", [])?;
        for article in articles {
            upsert_with(&tx, article)?;
        }
        tx.commit()?;

        info!(
            "event=articles_replaced module=repo status=ok count={}",
            articles.len()
        );
        Ok(articles.len())
    }

    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.0])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_article_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_articles(&self) -> RepoResult<Vec<Article>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ARTICLE_SELECT_SQL} ORDER BY published_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }
        Ok(articles)
    }

    fn count_articles(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative article count `{count}`")))
    }
}

fn upsert_with(conn: &Connection, article: &Article) -> RepoResult<()> {
    conn.execute(
        ARTICLE_UPSERT_SQL,
        params![
            article.id.0,
            article.title.as_str(),
            article.author.as_str(),
            article.body.as_str(),
            article.thumb_url.as_str(),
            article.photo_url.as_str(),
            f64::from(article.aspect_ratio),
            article.published_at,
        ],
    )?;
    Ok(())
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let aspect_ratio: f64 = row.get("aspect_ratio")?;
    let article = Article {
        id: ArticleId(row.get("id")?),
        title: row.get("title")?,
        author: row.get("author")?,
        published_at: row.get("published_at")?,
        thumb_url: row.get("thumb_url")?,
        photo_url: row.get("photo_url")?,
        aspect_ratio: aspect_ratio as f32,
        body: row.get("body")?,
    };
    article.validate().map_err(|err| {
        RepoError::InvalidData(format!("row for article {} failed validation: {err}", article.id))
    })?;
    Ok(article)
}
