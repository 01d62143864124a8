use async_trait::async_trait;
use hl_core::{ArticleRecord, Error, HeadlineStorage, Result, RowFilter};
use hl_storage::MemoryStorage;
use std::sync::Arc;

use super::{date, instant_config, listing_page, regio7_card, regio7_page};
use crate::card::query_all;
use crate::manager::ScraperManager;
use crate::pagination::StopReason;
use crate::scrapers::spain::Regio7Scraper;
use crate::scrapers::CardExtractor;
use crate::testing::{ScriptedFailure, ScriptedPageFactory};

const TABLE: &str = "pymes_news_headlines";
const DOMAIN: &str = "https://www.regio7.cat";

fn manager_with(storage: Arc<dyn HeadlineStorage>, pages: Vec<String>) -> (ScraperManager, Arc<ScriptedPageFactory>) {
    let factory = Arc::new(ScriptedPageFactory::new(move || regio7_page(pages.clone())));
    let manager = ScraperManager::new(storage, factory.clone(), instant_config());
    (manager, factory)
}

fn records_from(cards: &[String]) -> Vec<ArticleRecord> {
    let scraper = Regio7Scraper::new();
    query_all(&listing_page(cards), scraper.card_selector())
        .unwrap()
        .iter()
        .filter_map(|card| scraper.extract(card, date(2024, 5, 3)))
        .collect()
}

#[tokio::test]
async fn test_update_is_idempotent() {
    let storage = Arc::new(MemoryStorage::new());
    let pages = vec![
        listing_page(&[regio7_card("2024-05-02", "a1"), regio7_card("2024-05-01", "a2")]),
        listing_page(&[regio7_card("2024-04-30", "b1")]),
    ];
    let (manager, factory) = manager_with(storage.clone(), pages);

    assert_eq!(manager.update("regio7", None).await.unwrap(), 3);
    assert_eq!(manager.update("regio7", None).await.unwrap(), 0);

    let rows = storage.read_table(TABLE, &RowFilter::domain(DOMAIN)).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(manager.watermark(DOMAIN).await.unwrap(), Some(date(2024, 5, 2)));

    let opened = factory.opened();
    assert_eq!(opened.len(), 2);
    assert!(opened.iter().all(|page| page.state().closed));
}

#[tokio::test]
async fn test_only_new_records_are_inserted() {
    let cards: Vec<String> = (1..=8).map(|i| regio7_card("2024-04-05", &format!("n{}", i))).collect();
    let storage = Arc::new(MemoryStorage::new());
    let existing = records_from(&cards[..5]);
    assert_eq!(storage.upsert_table(TABLE, &existing).await.unwrap(), 5);

    let (manager, _) = manager_with(storage.clone(), vec![listing_page(&cards)]);
    let report = manager.update_with_report("regio7", None).await.unwrap();

    assert_eq!(report.bound, Some(date(2024, 4, 5)));
    assert_eq!(report.cards_seen, 8);
    assert_eq!(report.inserted, 3);
    assert_eq!(storage.read_table(TABLE, &RowFilter::all()).await.unwrap().len(), 8);
}

#[tokio::test]
async fn test_existing_rows_are_left_untouched() {
    let cards = vec![regio7_card("2024-04-05", "same")];
    let storage = Arc::new(MemoryStorage::new());
    let existing = records_from(&cards);
    storage.upsert_table(TABLE, &existing).await.unwrap();

    let (manager, _) = manager_with(storage.clone(), vec![listing_page(&cards)]);
    assert_eq!(manager.update("regio7", None).await.unwrap(), 0);

    let rows = storage.read_table(TABLE, &RowFilter::all()).await.unwrap();
    assert_eq!(rows, existing);
}

#[tokio::test]
async fn test_invalid_cards_never_reach_storage() {
    let untitled = r#"<a class="new__media" href="/economia/2024/05/02/x.html"><img src="x.jpg"></a>"#.to_string();
    let undated = r#"<a class="new__media" href="/economia/opinio/y.html" title="Opinió">Opinió</a>"#.to_string();
    let storage = Arc::new(MemoryStorage::new());
    let (manager, _) = manager_with(
        storage.clone(),
        vec![listing_page(&[
            regio7_card("2024-05-02", "ok1"),
            untitled,
            undated,
            regio7_card("2024-05-01", "ok2"),
        ])],
    );

    let report = manager.update_with_report("regio7", None).await.unwrap();

    assert_eq!(report.cards_seen, 4);
    assert_eq!(report.invalid_cards, 2);
    assert_eq!(report.inserted, 2);
    let rows = storage.read_table(TABLE, &RowFilter::all()).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| !r.title.is_empty() && r.article_url.contains("/economia/2024/")));
}

#[tokio::test]
async fn test_explicit_bound_drops_older_records() {
    let storage = Arc::new(MemoryStorage::new());
    let (manager, factory) = manager_with(
        storage.clone(),
        vec![
            listing_page(&[regio7_card("2024-05-02", "new"), regio7_card("2024-04-20", "old")]),
            listing_page(&[regio7_card("2024-04-01", "older")]),
        ],
    );

    let report = manager.update_with_report("Regió7", Some(date(2024, 4, 25))).await.unwrap();

    assert_eq!(report.stop, StopReason::CutoffReached);
    assert_eq!(report.pages, 1);
    assert_eq!(report.below_bound, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(factory.opened()[0].state().attempts, 0);
}

#[tokio::test]
async fn test_duplicates_within_a_batch() {
    let storage = Arc::new(MemoryStorage::new());
    let card = regio7_card("2024-05-02", "twice");
    let (manager, _) = manager_with(storage, vec![listing_page(&[card.clone(), card])]);

    let report = manager.update_with_report("regio7", None).await.unwrap();

    assert_eq!(report.duplicates, 1);
    assert_eq!(report.inserted, 1);
}

#[tokio::test]
async fn test_degraded_run_stores_what_was_loaded() {
    let storage = Arc::new(MemoryStorage::new());
    let pages = vec![
        listing_page(&[regio7_card("2024-05-03", "p1")]),
        listing_page(&[regio7_card("2024-05-02", "p2")]),
        listing_page(&[regio7_card("2024-05-01", "p3")]),
    ];
    let factory = Arc::new(ScriptedPageFactory::new(move || {
        regio7_page(pages.clone()).fail_click(2, ScriptedFailure::Intercepted)
    }));
    let manager = ScraperManager::new(storage, factory.clone(), instant_config());

    let report = manager.update_with_report("regio7", None).await.unwrap();

    assert!(report.stop.is_degraded());
    assert_eq!(report.pages, 2);
    assert_eq!(report.inserted, 2);
    assert!(factory.opened()[0].state().closed);
}

#[tokio::test]
async fn test_fatal_page_error_still_closes_page() {
    let storage = Arc::new(MemoryStorage::new());
    let pages = vec![listing_page(&[regio7_card("2024-05-03", "p1")]), listing_page(&[])];
    let factory = Arc::new(ScriptedPageFactory::new(move || {
        regio7_page(pages.clone()).fail_click(1, ScriptedFailure::Fatal)
    }));
    let manager = ScraperManager::new(storage.clone(), factory.clone(), instant_config());

    let result = manager.update("regio7", None).await;

    assert!(matches!(result, Err(Error::Browser(_))));
    assert!(factory.opened()[0].state().closed);
    assert!(storage.read_table(TABLE, &RowFilter::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_source_opens_no_page() {
    let (manager, factory) = manager_with(Arc::new(MemoryStorage::new()), vec![listing_page(&[])]);

    let result = manager.update("lavanguardia", None).await;

    assert!(matches!(result, Err(Error::UnknownSource(_))));
    assert!(factory.opened().is_empty());
}

struct BrokenStorage;

#[async_trait]
impl HeadlineStorage for BrokenStorage {
    async fn read_table(&self, _table: &str, _filter: &RowFilter) -> Result<Vec<ArticleRecord>> {
        Err(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone")))
    }

    async fn upsert_table(&self, _table: &str, _rows: &[ArticleRecord]) -> Result<usize> {
        Err(Error::Storage("read only".to_string()))
    }
}

#[tokio::test]
async fn test_watermark_read_failure_is_fatal() {
    let (manager, factory) = manager_with(Arc::new(BrokenStorage), vec![listing_page(&[])]);

    let result = manager.update("regio7", None).await;

    assert!(matches!(result, Err(Error::Storage(_))));
    assert!(factory.opened().is_empty());
}

#[tokio::test]
async fn test_list_scrapers() {
    let (manager, _) = manager_with(Arc::new(MemoryStorage::new()), Vec::new());
    assert_eq!(manager.list_scrapers(), vec!["spain/elperiodico", "spain/regio7"]);
}
