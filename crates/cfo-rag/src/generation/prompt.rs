//! Prompt templates: loading by name and placeholder substitution

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Name of the mandatory fallback template
pub const DEFAULT_TEMPLATE: &str = "default";

/// Days between `{current_date}` and `{current_date_plus_7_days}`
const LOOKAHEAD_DAYS: i64 = 7;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

/// Named prompt templates read from a JSON object of `name -> template`
#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: HashMap<String, String>,
}

impl TemplateStore {
    /// Read the template file; it must contain a `default` entry
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let templates: HashMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| Error::template(format!("{}: {}", path.display(), e)))?;
        Self::from_map(templates)
    }

    /// Build from an in-memory map; it must contain a `default` entry
    pub fn from_map(templates: HashMap<String, String>) -> Result<Self> {
        if !templates.contains_key(DEFAULT_TEMPLATE) {
            return Err(Error::template(format!(
                "template store has no '{}' entry",
                DEFAULT_TEMPLATE
            )));
        }
        Ok(Self { templates })
    }

    /// Template stored under `name`, or the default template when the name is unknown
    pub fn load_template(&self, name: &str) -> &str {
        match self.templates.get(name) {
            Some(template) => template,
            None => {
                tracing::debug!("Template '{}' not found, using '{}'", name, DEFAULT_TEMPLATE);
                // from_map guarantees the default entry
                self.templates
                    .get(DEFAULT_TEMPLATE)
                    .map(String::as_str)
                    .unwrap_or_default()
            }
        }
    }

    /// Template names, unordered
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

/// Replace the date literals a template may carry
///
/// `{current_date_plus_6_days}` is accepted as an alias of the seven-day lookahead.
pub fn substitute_dates(template: &str, today: NaiveDate) -> String {
    let today_str = today.format("%Y-%m-%d").to_string();
    let ahead_str = (today + Duration::days(LOOKAHEAD_DAYS))
        .format("%Y-%m-%d")
        .to_string();

    template
        .replace("{current_date}", &today_str)
        .replace("{current_date_plus_7_days}", &ahead_str)
        .replace("{current_date_plus_6_days}", &ahead_str)
}

/// Fill `{name}` placeholders from `values`; `{{` and `}}` render as literal braces
///
/// Placeholders without a value are left in place.
pub fn format_template(template: &str, values: &HashMap<&str, &str>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match caps.get(1) {
            Some(name) => match values.get(name.as_str()) {
                Some(value) => (*value).to_string(),
                None => {
                    tracing::warn!("Template placeholder '{{{}}}' has no value", name.as_str());
                    caps[0].to_string()
                }
            },
            None => caps[0][..1].to_string(),
        })
        .into_owned()
}

/// Date substitution first, then generic placeholder formatting
pub fn fill_template(template: &str, today: NaiveDate, values: &HashMap<&str, &str>) -> String {
    format_template(&substitute_dates(template, today), values)
}
