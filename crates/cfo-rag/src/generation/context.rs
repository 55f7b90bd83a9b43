//! Prompt context assembly from independently bounded sections

use std::collections::HashMap;

/// Cut `text` to at most `max_chars` characters, appending `ellipsis` when anything was removed
pub fn truncate(text: &str, max_chars: usize, ellipsis: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ellipsis),
        None => text.to_string(),
    }
}

/// The sections one query's prompt is built from
///
/// Each section, including the joined retrieval hits, is truncated on its own
/// budget when the context is built, so a long regulations document or a
/// whole-table CSV hit cannot crowd out invoice data.
#[derive(Debug, Clone, Default)]
pub struct ContextSections {
    /// Accounts receivable rows after intent filtering, as CSV text
    pub ar_table: String,
    /// Accounts payable rows after intent filtering, as CSV text
    pub ap_table: String,
    /// Purchase order terms text
    pub po_terms: String,
    /// Regulations text
    pub regulations: String,
    /// Reranked retrieval hits, best first
    pub retrieved: Vec<String>,
}

/// Rendered context strings handed to the template
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// Everything, with section headers
    pub context: String,
    /// Receivables framing: AR data, regulations, retrieved hits
    pub ar_context: String,
    /// Payables framing: AP data, PO terms, regulations, retrieved hits
    pub ap_context: String,
    /// Truncated regulations text
    pub regulations: String,
    /// Truncated PO terms text
    pub po_terms: String,
}

impl ContextSections {
    /// Truncate every section and assemble the context variants
    pub fn build(&self, max_section_len: usize, ellipsis: &str) -> PromptContext {
        let ar = truncate(&self.ar_table, max_section_len, ellipsis);
        let ap = truncate(&self.ap_table, max_section_len, ellipsis);
        let po = truncate(&self.po_terms, max_section_len, ellipsis);
        let regs = truncate(&self.regulations, max_section_len, ellipsis);
        let top_matches = truncate(&self.retrieved.join("\n\n"), max_section_len, ellipsis);

        let context = format!(
            "Accounts Receivable (AR) Data:\n{}\n\n\
             Accounts Payable (AP) Data:\n{}\n\n\
             Purchase Order Terms:\n{}\n\n\
             Regulatory Context:\n{}\n\n\
             Retrieved Context (Top Matches):\n{}\n",
            ar, ap, po, regs, top_matches
        );

        let ar_context = [
            "Accounts Receivable Invoice Data:",
            ar.as_str(),
            "Regulations:",
            regs.as_str(),
            "Retrieved Context:",
            top_matches.as_str(),
        ]
        .join("\n\n");

        let ap_context = [
            "Accounts Payable Invoice Data:",
            ap.as_str(),
            "Purchase Order Terms:",
            po.as_str(),
            "Regulations:",
            regs.as_str(),
            "Retrieved Context:",
            top_matches.as_str(),
        ]
        .join("\n\n");

        PromptContext {
            context,
            ar_context,
            ap_context,
            regulations: regs,
            po_terms: po,
        }
    }
}

impl PromptContext {
    /// Placeholder values for template formatting
    pub fn placeholders<'a>(&'a self, query: &'a str) -> HashMap<&'static str, &'a str> {
        HashMap::from([
            ("context", self.context.as_str()),
            ("query", query),
            ("AR_context", self.ar_context.as_str()),
            ("AP_context", self.ap_context.as_str()),
            ("regulations_context", self.regulations.as_str()),
            ("PO_context", self.po_terms.as_str()),
        ])
    }
}
