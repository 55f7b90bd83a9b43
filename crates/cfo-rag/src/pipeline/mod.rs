//! Query orchestration

mod query;

pub use query::QueryPipeline;
