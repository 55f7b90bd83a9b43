//! Once-a-day rebuild of the retrieval corpus

use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::DataConfig;
use crate::error::Result;
use crate::ingestion::{IngestPipeline, IngestReport};

const MARKER_DATE_FORMAT: &str = "%Y-%m-%d";

/// One document of the standing corpus with its provenance tags
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusDocument {
    pub path: PathBuf,
    pub doc_name: String,
    pub source_type: String,
}

impl CorpusDocument {
    fn new(path: &Path, doc_name: &str, source_type: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            doc_name: doc_name.to_string(),
            source_type: source_type.to_string(),
        }
    }

    /// Metadata stored with every chunk of this document
    pub fn metadata(&self) -> HashMap<String, String> {
        HashMap::from([
            ("doc_name".to_string(), self.doc_name.clone()),
            ("source_type".to_string(), self.source_type.clone()),
        ])
    }
}

/// The documents re-ingested on every refresh, in ingestion order
pub fn standing_corpus(data: &DataConfig) -> Vec<CorpusDocument> {
    vec![
        CorpusDocument::new(&data.ap_invoices, "AP_invoice.csv", "finance_AP"),
        CorpusDocument::new(&data.ar_invoices, "AR_invoice.csv", "finance_AR"),
        CorpusDocument::new(&data.regulations, "RPS_CSR_ENG.pdf", "regulation"),
        CorpusDocument::new(&data.po_terms, "PO_T&C.pdf", "terms_and_conditions"),
    ]
}

/// Clears and re-ingests the corpus the first time it runs on a new day
pub struct DailyRefresh {
    pipeline: IngestPipeline,
    corpus: Vec<CorpusDocument>,
    marker: PathBuf,
}

impl DailyRefresh {
    /// Create with an explicit corpus and marker file
    pub fn new(pipeline: IngestPipeline, corpus: Vec<CorpusDocument>, marker: PathBuf) -> Self {
        Self {
            pipeline,
            corpus,
            marker,
        }
    }

    /// Create for the configured data directory
    pub fn from_config(pipeline: IngestPipeline, data: &DataConfig) -> Self {
        Self::new(pipeline, standing_corpus(data), data.refresh_marker.clone())
    }

    /// Date recorded by the last completed refresh, if any
    pub async fn last_refresh(&self) -> Result<Option<NaiveDate>> {
        match tokio::fs::read_to_string(&self.marker).await {
            Ok(raw) => Ok(NaiveDate::parse_from_str(raw.trim(), MARKER_DATE_FORMAT).ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether no refresh has completed on `today`
    pub async fn is_stale(&self, today: NaiveDate) -> Result<bool> {
        Ok(self.last_refresh().await? != Some(today))
    }

    /// Refresh when the marker is older than `today`; returns whether a refresh ran
    pub async fn refresh_if_stale(&self, today: NaiveDate) -> Result<bool> {
        if !self.is_stale(today).await? {
            tracing::info!("Corpus already refreshed for {}", today);
            return Ok(false);
        }
        self.refresh(today).await?;
        Ok(true)
    }

    /// Clear both stores, ingest the whole corpus and record `today`
    ///
    /// The marker is only written once every document is ingested, so a failed
    /// refresh is retried on the next call.
    pub async fn refresh(&self, today: NaiveDate) -> Result<Vec<IngestReport>> {
        tracing::info!("Refreshing corpus for {}", today);

        if let Err(e) = self.pipeline.clear_all().await {
            tracing::warn!("Continuing refresh after incomplete clear: {}", e);
        }

        let mut reports = Vec::with_capacity(self.corpus.len());
        for doc in &self.corpus {
            let report = self.pipeline.ingest_document(&doc.path, doc.metadata()).await?;
            tracing::info!("{} ingested ({} chunks)", doc.doc_name, report.chunk_count());
            reports.push(report);
        }

        if let Some(parent) = self.marker.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.marker, today.format(MARKER_DATE_FORMAT).to_string()).await?;

        tracing::info!("Corpus refresh complete for {}", today);
        Ok(reports)
    }
}
