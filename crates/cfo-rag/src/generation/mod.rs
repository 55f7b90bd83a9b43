//! Prompt assembly, template filling and completion post-processing

pub mod cleanup;
pub mod context;
pub mod ollama;
pub mod prompt;

pub use cleanup::clean_output;
pub use context::{truncate, ContextSections, PromptContext};
pub use ollama::OllamaClient;
pub use prompt::{fill_template, TemplateStore, DEFAULT_TEMPLATE};
