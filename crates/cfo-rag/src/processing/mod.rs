//! Scheduled maintenance of the retrieval corpus

mod refresh;

pub use refresh::{standing_corpus, CorpusDocument, DailyRefresh};
