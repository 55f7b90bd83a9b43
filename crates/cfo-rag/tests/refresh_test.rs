//! Daily corpus refresh

mod common;

use cfo_rag::processing::{standing_corpus, CorpusDocument, DailyRefresh};
use cfo_rag::IngestPipeline;
use chrono::NaiveDate;
use common::{test_services, Fixture, HashEmbedder, RecordingCompletion, UnreachableEmbedder};
use std::sync::Arc;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn invoice_corpus(fixture: &Fixture) -> Vec<CorpusDocument> {
    standing_corpus(&fixture.data)
        .into_iter()
        .filter(|doc| doc.source_type.starts_with("finance_"))
        .collect()
}

#[test]
fn test_standing_corpus_tags() {
    let fixture = Fixture::new();
    let corpus = standing_corpus(&fixture.data);
    let tags: Vec<(&str, &str)> = corpus
        .iter()
        .map(|d| (d.doc_name.as_str(), d.source_type.as_str()))
        .collect();
    assert_eq!(
        tags,
        vec![
            ("AP_invoice.csv", "finance_AP"),
            ("AR_invoice.csv", "finance_AR"),
            ("RPS_CSR_ENG.pdf", "regulation"),
            ("PO_T&C.pdf", "terms_and_conditions"),
        ]
    );
    assert_eq!(corpus[0].metadata()["source_type"], "finance_AP");
}

#[tokio::test]
async fn test_refresh_runs_once_per_day() {
    let fixture = Fixture::new();
    let ts = test_services(Arc::new(HashEmbedder), RecordingCompletion::answering("ok"));
    let pipeline = IngestPipeline::from_config(ts.services.clone(), &fixture.config()).unwrap();
    let refresh = DailyRefresh::new(pipeline, invoice_corpus(&fixture), fixture.data.refresh_marker.clone());

    assert_eq!(refresh.last_refresh().await.unwrap(), None);
    assert!(refresh.refresh_if_stale(day(15)).await.unwrap());
    assert_eq!(refresh.last_refresh().await.unwrap(), Some(day(15)));
    assert_eq!(ts.metadata.len(), 2);

    assert!(!refresh.refresh_if_stale(day(15)).await.unwrap());
    assert_eq!(ts.metadata.len(), 2);

    // a new day clears before re-ingesting, so nothing piles up
    assert!(refresh.refresh_if_stale(day(16)).await.unwrap());
    assert_eq!(ts.metadata.len(), 2);
    assert_eq!(ts.index.len().await, 2);
    assert_eq!(
        std::fs::read_to_string(&fixture.data.refresh_marker).unwrap(),
        "2024-06-16"
    );
}

#[tokio::test]
async fn test_failed_refresh_leaves_marker_untouched() {
    let fixture = Fixture::new();
    let ts = test_services(Arc::new(UnreachableEmbedder), RecordingCompletion::answering("ok"));
    let pipeline = IngestPipeline::from_config(ts.services.clone(), &fixture.config()).unwrap();
    let refresh = DailyRefresh::new(pipeline, invoice_corpus(&fixture), fixture.data.refresh_marker.clone());

    assert!(refresh.refresh_if_stale(day(15)).await.is_err());
    assert!(!fixture.data.refresh_marker.exists());
    assert!(refresh.is_stale(day(15)).await.unwrap());
}

#[tokio::test]
async fn test_unreadable_marker_counts_as_stale() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.data.refresh_marker.parent().unwrap()).unwrap();
    std::fs::write(&fixture.data.refresh_marker, "yesterday-ish").unwrap();

    let ts = test_services(Arc::new(HashEmbedder), RecordingCompletion::answering("ok"));
    let pipeline = IngestPipeline::from_config(ts.services.clone(), &fixture.config()).unwrap();
    let refresh = DailyRefresh::new(pipeline, invoice_corpus(&fixture), fixture.data.refresh_marker.clone());

    assert_eq!(refresh.last_refresh().await.unwrap(), None);
    assert!(refresh.is_stale(day(15)).await.unwrap());
}
