//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the reader core's pure protocol helpers to Dart via FRB.
//! - Expose article listing from the local article database.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are returned inside response envelopes, never thrown.

use log::warn;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use xyzreader_core::db::open_db;
use xyzreader_core::{
    anchor_name, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, reconcile_return as reconcile_return_inner, Article, ArticleId,
    ArticleRepository, ClickedItem, ClosedEvent, ReaderConfig, SessionId, Snapshot,
    SqliteArticleRepository,
};

const DEFAULT_DB_FILE_NAME: &str = "xyzreader.sqlite3";
static DEFAULT_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), Path::new(log_dir.as_str())) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Shared transition anchor name for one article.
///
/// Both the grid cell and the detail page must carry exactly this name.
#[flutter_rust_bridge::frb(sync)]
pub fn transition_anchor_name(article_id: i64) -> String {
    anchor_name(ArticleId(article_id)).as_str().to_owned()
}

/// Article row projected for list rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleItem {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Unix epoch milliseconds.
    pub published_at: i64,
    pub thumb_url: String,
    pub photo_url: String,
    pub aspect_ratio: f32,
    pub anchor: String,
}

/// Envelope for `list_articles`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleListResponse {
    pub ok: bool,
    pub items: Vec<ArticleItem>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Lists articles in display order.
///
/// `db_path` of `None` uses `XYZREADER_DB_PATH`, then a file in the temp dir.
#[flutter_rust_bridge::frb(sync)]
pub fn list_articles(db_path: Option<String>) -> ArticleListResponse {
    let path = db_path
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(resolve_default_db_path);

    match load_articles(&path) {
        Ok(articles) => {
            let items: Vec<ArticleItem> = articles.into_iter().map(to_article_item).collect();
            ArticleListResponse {
                ok: true,
                message: format!("Loaded {} article(s).", items.len()),
                items,
            }
        }
        Err(message) => {
            warn!("event=ffi_list_articles module=ffi status=error error={message}");
            ArticleListResponse {
                ok: false,
                items: Vec::new(),
                message,
            }
        }
    }
}

/// Return anchor decision for a host driving its own screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnAnchorResponse {
    /// `None` means a non-anchored return.
    pub anchor: Option<String>,
    pub scroll_to: Option<u32>,
    /// Recovered failures, in the order they were hit.
    pub recovered: Vec<String>,
}

/// Reconciles a close report against the collection's current id order.
///
/// Positions are optional; ids are authoritative when present.
#[allow(clippy::too_many_arguments)]
#[flutter_rust_bridge::frb(sync)]
pub fn reconcile_return(
    clicked_id: i64,
    clicked_position: Option<u32>,
    start_id: i64,
    start_position: Option<u32>,
    end_id: Option<i64>,
    end_position: Option<u32>,
    collection_ids: Vec<i64>,
) -> ReturnAnchorResponse {
    let articles = collection_ids
        .into_iter()
        .map(|id| Article::new(ArticleId(id), String::new(), String::new()))
        .collect();
    let snapshot = match Snapshot::new(articles) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            return ReturnAnchorResponse {
                anchor: None,
                scroll_to: None,
                recovered: vec![err.to_string()],
            }
        }
    };

    let clicked = ClickedItem {
        id: ArticleId(clicked_id),
        position: clicked_position.map(to_index),
    };
    let report = ClosedEvent {
        session: SessionId(0),
        start_position: start_position.map(to_index),
        end_position: end_position.map(to_index),
        start_id: ArticleId(start_id),
        end_id: end_id.map(ArticleId),
    };

    let reconciled = reconcile_return_inner(clicked, &report, &snapshot);
    ReturnAnchorResponse {
        anchor: reconciled
            .target
            .as_ref()
            .map(|target| target.anchor.as_str().to_owned()),
        scroll_to: reconciled
            .target
            .as_ref()
            .and_then(|target| u32::try_from(target.position).ok()),
        recovered: reconciled
            .recovered
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

fn load_articles(path: &Path) -> Result<Vec<Article>, String> {
    let conn = open_db(path).map_err(|err| format!("article DB open failed: {err}"))?;
    let repo = SqliteArticleRepository::try_new(&conn).map_err(|err| err.to_string())?;
    repo.list_articles()
        .map_err(|err| format!("list_articles failed: {err}"))
}

fn resolve_default_db_path() -> PathBuf {
    DEFAULT_DB_PATH
        .get_or_init(|| {
            let configured = ReaderConfig::load(None)
                .ok()
                .and_then(|config| config.db_path);
            configured.unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
        })
        .clone()
}

fn to_article_item(article: Article) -> ArticleItem {
    ArticleItem {
        id: article.id.0,
        anchor: anchor_name(article.id).as_str().to_owned(),
        title: article.title,
        author: article.author,
        published_at: article.published_at,
        thumb_url: article.thumb_url,
        photo_url: article.photo_url,
        aspect_ratio: article.aspect_ratio,
    }
}

fn to_index(position: u32) -> usize {
    usize::try_from(position).unwrap_or(usize::MAX)
}
