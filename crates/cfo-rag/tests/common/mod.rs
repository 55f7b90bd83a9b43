//! Shared test doubles and on-disk fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use cfo_rag::config::{DataConfig, RagConfig};
use cfo_rag::error::{Error, Result};
use cfo_rag::providers::local::{InMemoryMetadataStore, InMemoryVectorIndex};
use cfo_rag::providers::reranker::PassthroughReranker;
use cfo_rag::providers::{CompletionProvider, CompletionRequest, EmbeddingProvider};
use cfo_rag::RagServices;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const DIMENSIONS: usize = 64;

/// Bag-of-words embedder: each lowercase word bumps one hashed bucket
pub struct HashEmbedder;

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIMENSIONS];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % DIMENSIONS as u64) as usize] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Embedder whose backend is always down
pub struct UnreachableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnreachableEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::embedding("connection refused"))
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

/// How a [`RecordingCompletion`] answers
pub enum Reply {
    Text(String),
    Fail,
    Hang,
}

/// Completion double that keeps every prompt it receives
pub struct RecordingCompletion {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl RecordingCompletion {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(text: &str) -> Arc<Self> {
        Self::new(Reply::Text(text.to_string()))
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for RecordingCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(Error::CompletionFailure("worker crashed".to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("too late".to_string())
            }
        }
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn model(&self) -> &str {
        "test"
    }
}

/// Services with in-memory stores; the concrete stores are returned for inspection
pub struct TestServices {
    pub services: RagServices,
    pub index: Arc<InMemoryVectorIndex>,
    pub metadata: Arc<InMemoryMetadataStore>,
    pub completion: Arc<RecordingCompletion>,
}

pub fn test_services(embedder: Arc<dyn EmbeddingProvider>, completion: Arc<RecordingCompletion>) -> TestServices {
    let index = Arc::new(InMemoryVectorIndex::new());
    let metadata = Arc::new(InMemoryMetadataStore::new());
    let services = RagServices::new(
        embedder,
        index.clone(),
        metadata.clone(),
        Arc::new(PassthroughReranker),
        completion.clone(),
    );
    TestServices {
        services,
        index,
        metadata,
        completion,
    }
}

pub const AR_CSV: &str = "\
Customer Name,Invoice No.,Service Description,Amount (AED),Invoice Date,Due Date,Payment Status,Paid Date
Acme Trading,AR-001,Audit services,1200,2024-05-01,2024-06-10,Not Paid,
Globex LLC,AR-002,Consulting,300,2024-05-20,2024-06-20,not paid,
Initech,AR-003,Licenses,450,2024-05-01,2024-06-10,Paid,2024-06-09
Umbrella Corp,AR-004,Support retainer,90,2024-06-01,2024-07-30,not paid,
";

pub const AP_CSV: &str = "\
Supplier Name,Invoice No.,Service Description,Amount (AED),Invoice Date,Due Date,Payment Status,Paid Date
Desert Logistics,AP-101,Freight,800,2024-05-01,2024-06-01,Not Paid,
Gulf Office Supplies,AP-102,Stationery,120,2024-06-01,2024-06-18,Not Paid,
Emirates Power,AP-103,Electricity,640,2024-05-15,2024-06-05,Paid,2024-06-04
";

pub const TEMPLATES_JSON: &str = r#"{
    "default": "Today is {current_date}. Window ends {current_date_plus_7_days}.\n{context}\nQuestion: {query}",
    "ar_summary": "AR ONLY\n{AR_context}\nQuestion: {query}",
    "json_answer": "Reply as {{\"answer\": ...}}\n{regulations_context}\n{PO_context}\nQuestion: {query}"
}"#;

/// Write a one-page PDF whose page shows `text`
pub fn write_pdf(path: &Path, text: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// A data directory holding every file the query pipeline reads
pub struct Fixture {
    pub dir: TempDir,
    pub data: DataConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_ar(AR_CSV)
    }

    pub fn with_ar(ar_csv: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        std::fs::write(root.join("AR_Invoice.csv"), ar_csv).unwrap();
        std::fs::write(root.join("AP_Invoice.csv"), AP_CSV).unwrap();
        std::fs::write(root.join("insights.json"), TEMPLATES_JSON).unwrap();
        write_pdf(&root.join("PO_T&C.pdf"), "Payment terms net 30 days from invoice date");
        write_pdf(&root.join("regulations.pdf"), "Late payment penalties apply after 60 days");

        let data = DataConfig {
            ar_invoices: root.join("AR_Invoice.csv"),
            ap_invoices: root.join("AP_Invoice.csv"),
            po_terms: root.join("PO_T&C.pdf"),
            regulations: root.join("regulations.pdf"),
            templates: root.join("insights.json"),
            refresh_marker: root.join("state").join("last_update_date.txt"),
        };

        Self { dir, data }
    }

    /// Config pointing at this fixture with small chunks
    pub fn config(&self) -> RagConfig {
        let mut config = RagConfig::default();
        config.data = self.data.clone();
        config.chunking.chunk_size = 50;
        config.chunking.chunk_overlap = 10;
        config.completion.timeout_secs = 1;
        config
    }

    pub fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}
