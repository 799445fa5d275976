use std::time::Duration;
use xyzreader_core::{
    anchor_name, fetch_snapshot, Article, ArticleId, CollectionController,
    InMemoryDatasetProvider, NavigatorController, NavigatorUpdate, ReaderError, Readiness,
    ReturnResolution, Screen,
};

fn articles(ids: &[i64]) -> Vec<Article> {
    ids.iter()
        .map(|id| Article::new(ArticleId(*id), format!("Article {id}"), "Staff"))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn wait_resolves_when_the_load_lands() {
    let provider = InMemoryDatasetProvider::new(articles(&[1, 2]));
    let mut navigator = NavigatorController::new();
    let mut signal = navigator.ready_signal();
    assert_eq!(signal.current(), Readiness::Unloaded);

    let ticket = navigator.begin_load();
    let waiter = tokio::spawn(async move { signal.wait(Duration::from_secs(3)).await });
    tokio::task::yield_now().await;

    let result = fetch_snapshot(&provider, Duration::from_secs(1)).await;
    navigator.on_load_finished(ticket, result).unwrap();

    assert_eq!(waiter.await.unwrap().unwrap(), ticket.generation());
}

#[tokio::test(start_paused = true)]
async fn wait_returns_immediately_when_already_ready() {
    let mut collection = CollectionController::new();
    let ticket = collection.begin_load();
    collection
        .on_load_finished(ticket, Ok(xyzreader_core::Snapshot::new(articles(&[1])).unwrap()))
        .unwrap();

    let mut signal = collection.ready_signal();
    assert_eq!(
        signal.wait(Duration::from_millis(1)).await.unwrap(),
        ticket.generation()
    );
}

#[tokio::test(start_paused = true)]
async fn wait_times_out_without_a_load() {
    let navigator = NavigatorController::new();
    let mut signal = navigator.ready_signal();

    let err = signal.wait(Duration::from_secs(3)).await.unwrap_err();
    assert!(matches!(
        err,
        ReaderError::ReadyTimeout {
            screen: Screen::Navigator,
            after_ms: 3000,
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn teardown_wakes_waiters_with_torn_down_error() {
    let mut collection = CollectionController::new();
    collection.begin_load();
    let mut signal = collection.ready_signal();
    let waiter = tokio::spawn(async move { signal.wait(Duration::from_secs(3)).await });
    tokio::task::yield_now().await;

    collection.tear_down();

    let err = waiter.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        ReaderError::ControllerTornDown(Screen::Collection)
    ));
}

#[tokio::test(start_paused = true)]
async fn return_anchor_is_resolved_after_collection_ready_signal() {
    let provider = InMemoryDatasetProvider::new(articles(&[1, 2, 3]));
    let mut collection = CollectionController::new();
    let mut navigator = NavigatorController::new();

    let ticket = collection.begin_load();
    collection
        .on_load_finished(ticket, fetch_snapshot(&provider, Duration::from_secs(1)).await)
        .unwrap();

    let request = collection.on_item_activated(1).unwrap();
    let nav_ticket = navigator.begin_load();
    assert_eq!(
        navigator.open(request.id).unwrap(),
        NavigatorUpdate::AwaitingSnapshot
    );
    collection.on_detail_opened().unwrap();

    let update = navigator
        .on_load_finished(
            nav_ticket,
            fetch_snapshot(&provider, Duration::from_secs(1)).await,
        )
        .unwrap();
    assert!(matches!(update, NavigatorUpdate::Opened { position: 1, .. }));
    navigator.on_page_changed(2).unwrap();

    // The collection refreshes while the detail screen closes.
    provider.replace(articles(&[4, 1, 2, 3]));
    let reload = collection.begin_load();
    collection.on_detail_closed(navigator.close().unwrap()).unwrap();
    navigator.resolve_exit_anchor().unwrap();
    assert_eq!(collection.resolve_return_anchor(), ReturnResolution::Pending);

    let mut ready = collection.ready_signal();
    collection
        .on_load_finished(reload, fetch_snapshot(&provider, Duration::from_secs(1)).await)
        .unwrap();
    ready.wait(Duration::from_secs(3)).await.unwrap();

    let resolution = collection.resolve_return_anchor();
    assert_eq!(resolution.anchor(), Some(&anchor_name(ArticleId(3))));
    match resolution {
        ReturnResolution::Resolved(transition) => assert_eq!(transition.scroll_to, Some(3)),
        other => panic!("expected a resolved return, got {other:?}"),
    }
    assert_eq!(provider.load_count(), 3);
}
