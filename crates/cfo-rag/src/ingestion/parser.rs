//! PDF and CSV parsing

use std::path::Path;

use crate::error::{Error, Result};

/// Seconds allowed for the pdf-extract fallback before giving up
const PDF_EXTRACT_TIMEOUT_SECS: u64 = 60;

/// Replace ligatures and typographic characters that PDF fonts commonly emit
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{2010}', "-")
        .replace('\u{2011}', "-")
        .replace('\u{2013}', "-")
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// Escape a CSV cell so it cannot break a markdown table row
fn escape_markdown_cell(cell: &str) -> String {
    cell.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
        .trim()
        .to_string()
}

fn markdown_row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let cells: Vec<String> = cells.map(escape_markdown_cell).collect();
    format!("| {} |", cells.join(" | "))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Document parser for the formats the pipeline ingests
pub struct FileParser;

impl FileParser {
    /// Extract text from a PDF file, pages joined with newlines
    ///
    /// A PDF without extractable text yields an empty string.
    pub fn parse_pdf(path: &Path) -> Result<String> {
        let data = std::fs::read(path)?;
        Self::parse_pdf_bytes(&display_name(path), &data)
    }

    /// Extract text from PDF bytes
    pub fn parse_pdf_bytes(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    tracing::debug!("Could not extract page {} of {}: {}", page_number, filename, e);
                    pages.push(String::new());
                }
            }
        }

        let mut content = pages.join("\n");
        if content.trim().is_empty() {
            tracing::warn!("lopdf found no text in {}, trying pdf-extract", filename);
            content = Self::extract_pdf_with_timeout(filename, data)?;
        }

        Ok(cleanup_pdf_text(&content))
    }

    /// Run pdf-extract on a worker thread so problematic fonts cannot hang ingestion
    fn extract_pdf_with_timeout(filename: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(Duration::from_secs(PDF_EXTRACT_TIMEOUT_SECS)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                tracing::warn!("pdf-extract failed on {}: {}", filename, e);
                Ok(String::new())
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::parse(
                filename,
                format!("PDF extraction timed out after {}s", PDF_EXTRACT_TIMEOUT_SECS),
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::parse(filename, "PDF extraction thread crashed"))
            }
        }
    }

    /// Render a CSV file as a single markdown table
    ///
    /// Returned as a one-element list so callers can treat it like chunked output.
    pub fn parse_csv(path: &Path) -> Result<Vec<String>> {
        let data = std::fs::read(path)?;
        let table = Self::csv_to_markdown(&display_name(path), &data)?;
        Ok(vec![table])
    }

    /// Render CSV bytes as a markdown table, preserving row order
    pub fn csv_to_markdown(filename: &str, data: &[u8]) -> Result<String> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data);

        let headers = reader
            .headers()
            .map_err(|e| Error::parse(filename, format!("Invalid CSV header: {}", e)))?
            .clone();

        let mut lines = Vec::new();
        lines.push(markdown_row(headers.iter()));
        lines.push(format!("|{}", "---|".repeat(headers.len())));

        for (row, result) in reader.records().enumerate() {
            let record = result
                .map_err(|e| Error::parse(filename, format!("Invalid CSV row {}: {}", row + 1, e)))?;
            lines.push(markdown_row(record.iter()));
        }

        Ok(lines.join("\n"))
    }
}
