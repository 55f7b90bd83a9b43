//! Question answering over retrieval results and local invoice data

use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{CompletionConfig, DataConfig, QueryConfig, RagConfig};
use crate::error::{Error, Result, TIMEOUT_MESSAGE};
use crate::generation::{clean_output, fill_template, ContextSections, TemplateStore};
use crate::ingestion::FileParser;
use crate::invoices::{InvoiceTable, LabeledInvoices, QueryIntent};
use crate::providers::CompletionRequest;
use crate::retrieval::Retriever;
use crate::services::RagServices;

/// Local documents read fresh for every question
struct LocalContext {
    ar: LabeledInvoices,
    ap: LabeledInvoices,
    po_terms: String,
    regulations: String,
}

impl LocalContext {
    fn load(data: &DataConfig, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            ar: InvoiceTable::from_path(&data.ar_invoices)?.label(today),
            ap: InvoiceTable::from_path(&data.ap_invoices)?.label(today),
            po_terms: FileParser::parse_pdf(&data.po_terms)?,
            regulations: FileParser::parse_pdf(&data.regulations)?,
        })
    }
}

/// Where templates come from
#[derive(Clone)]
enum Templates {
    /// Re-read the JSON file on every question
    File(PathBuf),
    /// Fixed set supplied by the caller
    Fixed(TemplateStore),
}

/// Answers questions by combining retrieval, filtered invoice tables and reference documents
#[derive(Clone)]
pub struct QueryPipeline {
    services: RagServices,
    retriever: Retriever,
    query: QueryConfig,
    completion: CompletionConfig,
    data: DataConfig,
    templates: Templates,
}

impl QueryPipeline {
    /// Create from config; templates are read from `data.templates` per question
    pub fn new(services: RagServices, config: &RagConfig) -> Self {
        Self {
            retriever: Retriever::from_config(services.clone(), config),
            services,
            query: config.query.clone(),
            completion: config.completion.clone(),
            data: config.data.clone(),
            templates: Templates::File(config.data.templates.clone()),
        }
    }

    /// Use a fixed template set instead of the template file
    pub fn with_templates(mut self, templates: TemplateStore) -> Self {
        self.templates = Templates::Fixed(templates);
        self
    }

    fn template_store(&self) -> Result<TemplateStore> {
        match &self.templates {
            Templates::File(path) => TemplateStore::load(path),
            Templates::Fixed(store) => Ok(store.clone()),
        }
    }

    /// Answer `query` as of the local calendar day
    pub async fn query_rag(&self, query: &str, template_name: &str, top_k: usize) -> Result<String> {
        let today = chrono::Local::now().date_naive();
        self.query_rag_at(query, template_name, top_k, today).await
    }

    /// Answer `query` with invoice statuses computed for `today`
    ///
    /// Retrieval failures shrink the context instead of failing the question;
    /// missing invoice or reference files are errors. Generation timeouts and
    /// backend failures come back as a user-facing message.
    pub async fn query_rag_at(
        &self,
        query: &str,
        template_name: &str,
        top_k: usize,
        today: NaiveDate,
    ) -> Result<String> {
        let intent = QueryIntent::classify(query);
        tracing::info!("Answering query (intent: {:?}, template: {})", intent, template_name);

        let data = self.data.clone();
        let (retrieved, local) = tokio::join!(
            self.retriever.retrieve_or_empty(query, top_k),
            tokio::task::spawn_blocking(move || LocalContext::load(&data, today)),
        );
        let retrieved = retrieved?;
        let local = local.map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        let ar_rows = local.ar.filter_by_intent(intent);
        let ap_rows = local.ap.filter_by_intent(intent);
        tracing::debug!(
            "Context: {} retrieved docs, {} AR rows, {} AP rows",
            retrieved.len(),
            ar_rows.len(),
            ap_rows.len()
        );

        let sections = ContextSections {
            ar_table: ar_rows.to_csv_string()?,
            ap_table: ap_rows.to_csv_string()?,
            po_terms: local.po_terms,
            regulations: local.regulations,
            retrieved,
        };
        let context = sections.build(self.query.max_section_len, &self.query.ellipsis);

        let templates = self.template_store()?;
        let prompt = fill_template(
            templates.load_template(template_name),
            today,
            &context.placeholders(query),
        );

        self.generate(prompt).await
    }

    /// Run the completion under the configured wall-clock limit
    async fn generate(&self, prompt: String) -> Result<String> {
        let request = CompletionRequest {
            prompt,
            max_output_tokens: self.completion.max_output_tokens,
            temperature: self.completion.temperature,
        };
        let limit = Duration::from_secs(self.completion.timeout_secs);

        let outcome = tokio::time::timeout(limit, self.services.completion.complete(&request)).await;
        match outcome {
            Ok(Ok(raw)) => Ok(clean_output(&raw)),
            Ok(Err(e)) => match e.user_message() {
                Some(message) => {
                    tracing::error!("Completion via {} failed: {}", self.services.completion.name(), e);
                    Ok(message)
                }
                None => Err(e),
            },
            Err(_) => {
                tracing::error!(
                    "{}",
                    Error::CompletionTimeout(self.completion.timeout_secs)
                );
                Ok(TIMEOUT_MESSAGE.to_string())
            }
        }
    }
}
