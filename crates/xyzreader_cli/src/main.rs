//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive one open/swipe/close cycle through both screen controllers.
//! - Print the resolved anchors so the handshake can be checked by eye.
//!
//! Usage: `xyzreader_cli [config.toml]`. Without a configured `db_path` the
//! scenario runs against a built-in in-memory dataset.

use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use xyzreader_core::{
    fetch_snapshot, init_logging, Article, ArticleId, CollectionController, DatasetProvider,
    InMemoryDatasetProvider, NavigatorController, ReaderConfig, ReturnResolution,
    SqliteDatasetProvider,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xyzreader_cli failed: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = ReaderConfig::load(config_path.as_deref())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    println!("xyzreader_core ping={}", xyzreader_core::ping());
    println!("xyzreader_core version={}", xyzreader_core::core_version());

    let provider: Arc<dyn DatasetProvider> = match &config.db_path {
        Some(path) => Arc::new(SqliteDatasetProvider::new(path)),
        None => Arc::new(InMemoryDatasetProvider::new(demo_articles())),
    };

    let mut collection = CollectionController::new();
    let ticket = collection.begin_load();
    let loaded = fetch_snapshot(provider.as_ref(), config.load_timeout()).await;
    collection.on_load_finished(ticket, loaded)?;
    collection.ready_signal().wait(config.ready_timeout()).await?;

    let count = collection.item_count();
    if count < 2 {
        println!("dataset has {count} article(s); nothing to swipe");
        return Ok(());
    }
    let tapped = count / 2;
    let request = collection.on_item_activated(tapped)?;
    println!(
        "open id={} position={} anchor={}",
        request.id, request.position, request.anchor
    );

    // The navigator loads on its own; open is deferred until it lands.
    let mut navigator = NavigatorController::with_provider(Arc::clone(&provider));
    let nav_ticket = navigator.begin_load();
    let update = navigator.open(request.id)?;
    println!("navigator open={update:?}");
    let loaded = fetch_snapshot(provider.as_ref(), config.load_timeout()).await;
    let update = navigator.on_load_finished(nav_ticket, loaded)?;
    println!("navigator update={update:?}");
    collection.on_detail_opened()?;

    let swipe_to = (tapped + 1) % navigator.page_count().max(1);
    navigator.on_page_changed(swipe_to)?;
    let report = navigator.close()?;
    println!(
        "closed start_position={:?} end_position={:?}",
        report.start_position, report.end_position
    );
    let exit = navigator.resolve_exit_anchor()?;
    println!(
        "exit anchor={:?} replaces={:?}",
        exit.anchor.as_ref().map(|anchor| anchor.as_str()),
        exit.replaces.as_ref().map(|anchor| anchor.as_str())
    );

    let reload = collection.begin_load();
    collection.on_detail_closed(report)?;
    let loaded = fetch_snapshot(provider.as_ref(), config.load_timeout()).await;
    collection.on_load_finished(reload, loaded)?;
    collection.ready_signal().wait(config.ready_timeout()).await?;

    match collection.resolve_return_anchor() {
        ReturnResolution::Resolved(transition) => println!(
            "return scroll_to={:?} anchor={:?}",
            transition.scroll_to,
            transition.anchor.as_ref().map(|anchor| anchor.as_str())
        ),
        other => println!("return unresolved={other:?}"),
    }
    info!("event=cli_smoke module=cli status=ok");
    Ok(())
}

fn demo_articles() -> Vec<Article> {
    ["Harbour lights", "Night trains", "Salt and stone"]
        .into_iter()
        .zip(1_i64..)
        .map(|(title, id)| {
            let mut article = Article::new(ArticleId(id), title, "XYZ Staff");
            article.published_at = 1_700_000_000_000 - id * 86_400_000;
            article
        })
        .collect()
}
