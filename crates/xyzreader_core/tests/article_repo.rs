use rusqlite::Connection;
use xyzreader_core::db::migrations::latest_version;
use xyzreader_core::db::open_db_in_memory;
use xyzreader_core::{
    Article, ArticleId, ArticleRepository, ArticleValidationError, RepoError,
    SqliteArticleRepository,
};

fn article(id: i64, title: &str, published_at: i64) -> Article {
    let mut article = Article::new(ArticleId(id), title, "Ann Author");
    article.published_at = published_at;
    article.thumb_url = format!("https://cdn.example/{id}/thumb.jpg");
    article.photo_url = format!("https://cdn.example/{id}/photo.jpg");
    article.aspect_ratio = 1.5;
    article.body = format!("body of {title}");
    article
}

#[test]
fn upsert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    let stored = article(7, "Seven", 1_700_000_000_000);
    repo.upsert_article(&stored).unwrap();

    let loaded = repo.get_article(ArticleId(7)).unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert_eq!(repo.get_article(ArticleId(8)).unwrap(), None);
}

#[test]
fn upsert_overwrites_existing_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    repo.upsert_article(&article(1, "draft", 10)).unwrap();
    repo.upsert_article(&article(1, "final", 20)).unwrap();

    let loaded = repo.get_article(ArticleId(1)).unwrap().unwrap();
    assert_eq!(loaded.title, "final");
    assert_eq!(loaded.published_at, 20);
    assert_eq!(repo.count_articles().unwrap(), 1);
}

#[test]
fn list_orders_newest_first_then_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    repo.upsert_article(&article(3, "old", 100)).unwrap();
    repo.upsert_article(&article(2, "new b", 300)).unwrap();
    repo.upsert_article(&article(1, "new a", 300)).unwrap();
    repo.upsert_article(&article(4, "mid", 200)).unwrap();

    let ids: Vec<i64> = repo
        .list_articles()
        .unwrap()
        .iter()
        .map(|article| article.id.0)
        .collect();
    assert_eq!(ids, vec![1, 2, 4, 3]);
}

#[test]
fn replace_all_swaps_the_whole_dataset() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    repo.replace_all(&[article(1, "A", 3), article(2, "B", 2), article(3, "C", 1)])
        .unwrap();
    let count = repo
        .replace_all(&[article(1, "A", 3), article(3, "C", 1)])
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(repo.get_article(ArticleId(2)).unwrap(), None);
    assert_eq!(repo.count_articles().unwrap(), 2);
}

#[test]
fn replace_all_rejects_invalid_batch_without_touching_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    repo.replace_all(&[article(1, "A", 1)]).unwrap();

    let err = repo
        .replace_all(&[article(2, "B", 2), article(3, "   ", 3)])
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(ArticleValidationError::BlankTitle(ArticleId(3)))
    ));
    assert_eq!(repo.count_articles().unwrap(), 1);
    assert!(repo.get_article(ArticleId(1)).unwrap().is_some());
}

#[test]
fn upsert_rejects_non_positive_aspect_ratio() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    let mut broken = article(5, "Five", 1);
    broken.aspect_ratio = 0.0;

    let err = repo.upsert_article(&broken).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ArticleValidationError::InvalidAspectRatio { .. })
    ));
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteArticleRepository::try_new(&conn).err().unwrap();
    match err {
        RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn corrupted_row_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO articles (id, title, aspect_ratio) VALUES (9, '', 1.0);",
        [],
    )
    .unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    let err = repo.list_articles().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
