// Document query commands - outline, statistics and search listing

use crate::outline::{self, DocumentStats, Heading};
use crate::search::{self, SearchResult};

pub fn get_table_of_contents(content: &str) -> Vec<Heading> {
    outline::extract_headings(content)
}

pub fn get_word_count(content: &str) -> DocumentStats {
    outline::document_stats(content)
}

pub fn search_in_document(content: &str, query: &str) -> Vec<SearchResult> {
    let results = search::search_with_context(content, query);
    tracing::debug!(query, results = results.len(), "search_in_document");
    results
}
