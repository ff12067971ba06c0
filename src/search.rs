// In-document search for MarkView
// Case-insensitive literal matching, line by line, with a navigable cursor

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Bytes of surrounding line kept on each side of a match in result snippets
const CONTEXT_BYTES: usize = 30;

/// One occurrence of the query in the document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub start_offset: usize, // byte offset into the whole text
    pub end_offset: usize,   // exclusive
    pub line_number: usize,  // 1-based
    pub matched_text: String,
}

/// Query state for the find bar.
///
/// `matches` is always rebuilt from scratch when the query or text changes.
/// `current` is `Some` exactly when there is at least one match.
#[derive(Debug, Default)]
pub struct SearchSession {
    query: String,
    matches: Vec<SearchMatch>,
    current: Option<usize>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `query` against `text` and move the cursor to the first match
    pub fn set_query(&mut self, text: &str, query: &str) {
        self.query = query.to_string();
        self.recompute(text);
    }

    /// Re-run the current query after the text changed
    pub fn refresh(&mut self, text: &str) {
        self.recompute(text);
    }

    fn recompute(&mut self, text: &str) {
        self.matches = find_matches(text, &self.query);
        self.current = if self.matches.is_empty() { None } else { Some(0) };
        tracing::trace!(query = %self.query, matches = self.matches.len(), "search updated");
    }

    pub fn next(&mut self) {
        let len = self.matches.len();
        if let Some(i) = self.current.filter(|_| len > 0) {
            self.current = Some((i + 1) % len);
        }
    }

    pub fn prev(&mut self) {
        let len = self.matches.len();
        if let Some(i) = self.current.filter(|_| len > 0) {
            self.current = Some((i + len - 1) % len);
        }
    }

    pub fn current_match(&self) -> Option<&SearchMatch> {
        self.current.and_then(|i| self.matches.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current = None;
    }
}

/// Literal, case-insensitive matcher for `query`
fn literal_matcher(query: &str) -> Option<Regex> {
    match RegexBuilder::new(&regex::escape(query)).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "search query rejected");
            None
        }
    }
}

/// All non-overlapping matches in document order. Matches never cross a line break.
pub fn find_matches(text: &str, query: &str) -> Vec<SearchMatch> {
    let mut matches = Vec::new();
    if query.is_empty() {
        return matches;
    }
    let Some(re) = literal_matcher(query) else {
        return matches;
    };

    let mut line_start = 0;
    for (index, line) in text.split('\n').enumerate() {
        for m in re.find_iter(line) {
            matches.push(SearchMatch {
                start_offset: line_start + m.start(),
                end_offset: line_start + m.end(),
                line_number: index + 1,
                matched_text: m.as_str().to_string(),
            });
        }
        line_start += line.len() + 1;
    }
    matches
}

// ============================================
// SEARCH RESULTS WITH CONTEXT
// ============================================

/// Match listing entry with a snippet of its line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub line: usize,
    pub column: usize, // 1-based byte column
    pub text: String,
    pub match_start: usize, // byte offset within the line
    pub match_end: usize,
}

/// Every match of `query` with up to 30 bytes of context either side
pub fn search_with_context(content: &str, query: &str) -> Vec<SearchResult> {
    let mut results = Vec::new();
    if query.is_empty() {
        return results;
    }
    let Some(re) = literal_matcher(query) else {
        return results;
    };

    for (index, line) in content.split('\n').enumerate() {
        for m in re.find_iter(line) {
            let start = floor_char_boundary(line, m.start().saturating_sub(CONTEXT_BYTES));
            let end = ceil_char_boundary(line, (m.end() + CONTEXT_BYTES).min(line.len()));

            let mut text = String::new();
            if start > 0 {
                text.push_str("...");
            }
            text.push_str(&line[start..end]);
            if end < line.len() {
                text.push_str("...");
            }

            results.push(SearchResult {
                line: index + 1,
                column: m.start() + 1,
                text,
                match_start: m.start(),
                match_end: m.end(),
            });
        }
    }
    results
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, mut index: usize) -> usize {
    while index < s.len() && !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_for(text: &str, query: &str) -> SearchSession {
        let mut search = SearchSession::new();
        search.set_query(text, query);
        search
    }

    #[test]
    fn test_empty_query_has_no_matches() {
        let search = session_for("anything at all", "");
        assert!(search.matches().is_empty());
        assert_eq!(search.current_index(), None);
        assert!(!search.is_active());
    }

    #[test]
    fn test_whitespace_query_matches_literally() {
        let search = session_for("a b c", " ");
        let starts: Vec<_> = search.matches().iter().map(|m| m.start_offset).collect();
        assert_eq!(starts, vec![1, 3]);
        assert_eq!(search.current_index(), Some(0));
        assert!(search.is_active());

        assert_eq!(search_with_context("a b", " ").len(), 1);
    }

    #[test]
    fn test_case_insensitive_matches_keep_source_casing() {
        let text = "The cat sat.\nA Cat ran.";
        let search = session_for(text, "cat");

        let matches = search.matches();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].line_number, 1);
        assert_eq!(matches[0].matched_text, "cat");
        assert_eq!((matches[0].start_offset, matches[0].end_offset), (4, 7));
        assert_eq!(matches[1].line_number, 2);
        assert_eq!(matches[1].matched_text, "Cat");
        assert_eq!((matches[1].start_offset, matches[1].end_offset), (15, 18));
        assert_eq!(&text[15..18], "Cat");
        assert_eq!(search.current_index(), Some(0));
    }

    #[test]
    fn test_metacharacters_match_literally() {
        let search = session_for("a.b.c axb", "a.b");
        assert_eq!(search.matches().len(), 1);
        assert_eq!(search.matches()[0].start_offset, 0);

        let search = session_for("call(x) and x", "(x)");
        assert_eq!(search.matches().len(), 1);
        assert_eq!(search.matches()[0].matched_text, "(x)");

        assert!(session_for("abc", ".*").matches().is_empty());
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let search = session_for("aaaa", "aa");
        let starts: Vec<_> = search.matches().iter().map(|m| m.start_offset).collect();
        assert_eq!(starts, vec![0, 2]);
    }

    #[test]
    fn test_matches_do_not_span_lines() {
        assert!(session_for("foo\nbar", "o\nb").matches().is_empty());
        assert!(session_for("ab\ncd", "bc").matches().is_empty());
    }

    #[test]
    fn test_degenerate_inputs_yield_no_matches() {
        assert!(session_for("", "cat").matches().is_empty());
        assert!(session_for("short\nlines", "much longer than any line").matches().is_empty());
    }

    #[test]
    fn test_offsets_account_for_carriage_returns_and_multibyte_text() {
        let text = "héllo\r\nwörld hello";
        let search = session_for(text, "hello");

        let matches = search.matches();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.line_number, 2);
        assert_eq!(&text[m.start_offset..m.end_offset], "hello");
    }

    #[test]
    fn test_next_and_prev_wrap_around() {
        let mut search = session_for("x x x", "x");
        assert_eq!(search.matches().len(), 3);

        search.next();
        search.next();
        assert_eq!(search.current_index(), Some(2));
        search.next();
        assert_eq!(search.current_index(), Some(0));
        search.prev();
        assert_eq!(search.current_index(), Some(2));
        assert_eq!(search.current_match().unwrap().start_offset, 4);
    }

    #[test]
    fn test_navigation_without_matches_is_noop() {
        let mut search = session_for("nothing here", "zzz");
        search.next();
        search.prev();
        assert_eq!(search.current_index(), None);
        assert!(search.current_match().is_none());
    }

    #[test]
    fn test_refresh_recomputes_against_new_text() {
        let mut search = session_for("one cat", "cat");
        search.refresh("cat cat cat");
        assert_eq!(search.matches().len(), 3);
        assert_eq!(search.current_index(), Some(0));

        search.refresh("dog");
        assert!(search.matches().is_empty());
        assert_eq!(search.current_index(), None);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut search = session_for("cat", "cat");
        search.clear();
        assert_eq!(search.query(), "");
        assert!(search.matches().is_empty());
        assert_eq!(search.current_index(), None);
    }

    #[test]
    fn test_results_include_clipped_context() {
        let line = format!("{}needle{}", "a".repeat(40), "b".repeat(40));
        let results = search_with_context(&line, "NEEDLE");

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.line, 1);
        assert_eq!(r.column, 41);
        assert_eq!((r.match_start, r.match_end), (40, 46));
        assert_eq!(r.text, format!("...{}needle{}...", "a".repeat(30), "b".repeat(30)));
    }

    #[test]
    fn test_result_context_respects_char_boundaries() {
        let line = format!("{}needle", "é".repeat(20));
        let results = search_with_context(&line, "needle");
        assert_eq!(results.len(), 1);
        assert!(results[0].text.starts_with("..."));
        assert!(results[0].text.ends_with("needle"));
    }
}
