//! Post-processing of raw completion text

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Returned when a completion contains nothing usable
pub const EMPTY_RESPONSE: &str = "No valid response received from LLM.";

static GENERATED_TEXT_DOUBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"'generated_text':\s*"([^"]*)""#).expect("valid regex"));
static GENERATED_TEXT_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'generated_text':\s*'([^']*)'").expect("valid regex"));
static ECHOED_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)User Question:.*?Answer:").expect("valid regex"));
static TOKEN_DUMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)'tokens':\s*\[.*?\]").expect("valid regex"));

fn unescape(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t").trim().to_string()
}

/// Turn raw model output into answer text
///
/// A stringified `generated_text` field wins when present. Otherwise echoed
/// prompt blocks and token dumps are removed and repeated lines collapsed,
/// keeping the first occurrence.
pub fn clean_output(text: &str) -> String {
    if text.trim().is_empty() {
        return EMPTY_RESPONSE.to_string();
    }

    for pattern in [&*GENERATED_TEXT_DOUBLE, &*GENERATED_TEXT_SINGLE] {
        if let Some(caps) = pattern.captures(text) {
            return unescape(&caps[1]);
        }
    }

    let cleaned = ECHOED_PROMPT.replace_all(text, "");
    let cleaned = TOKEN_DUMP.replace_all(&cleaned, "");

    let mut seen = HashSet::new();
    let lines: Vec<&str> = cleaned
        .trim()
        .lines()
        .filter(|line| {
            let key = line.trim();
            !key.is_empty() && seen.insert(key.to_string())
        })
        .collect();

    if lines.is_empty() {
        EMPTY_RESPONSE.to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_output() {
        assert_eq!(clean_output("   "), EMPTY_RESPONSE);
        assert_eq!(clean_output("'tokens': [1, 2, 3]"), EMPTY_RESPONSE);
    }

    #[test]
    fn test_generated_text_extracted() {
        let raw = r#"{'generated_text': "Line one\nLine two", 'other': 1}"#;
        assert_eq!(clean_output(raw), "Line one\nLine two");

        let raw = "{'generated_text': 'Single quoted'}";
        assert_eq!(clean_output(raw), "Single quoted");
    }

    #[test]
    fn test_echo_and_duplicates_removed() {
        let raw = "User Question: which invoices?\nAnswer: Acme is overdue.\nAcme is overdue.\n\nPay Globex next.";
        assert_eq!(clean_output(raw), "Acme is overdue.\nPay Globex next.");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(clean_output("  Two invoices are overdue.  "), "Two invoices are overdue.");
    }
}
