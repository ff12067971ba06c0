// Outline and statistics for markdown text
// Used by the table of contents sidebar and the status bar

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid heading pattern"));

/// Table of contents entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub id: String, // anchor id, unique per line
    pub text: String,
    pub level: u8,
    pub line: usize, // 1-based
}

/// Extract ATX headings, one regex pass per line
pub fn extract_headings(content: &str) -> Vec<Heading> {
    content
        .split('\n')
        .enumerate()
        .filter_map(|(index, line)| {
            let caps = HEADING.captures(line)?;
            let level = caps[1].len() as u8;
            let text = caps[2].trim().to_string();
            Some(Heading {
                id: format!("heading-{}-{}", index, slug::slugify(&text)),
                text,
                level,
                line: index + 1,
            })
        })
        .collect()
}

/// Word, character, line and paragraph counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentStats {
    pub words: usize,
    pub characters: usize,
    pub lines: usize,
    pub paragraphs: usize,
}

pub fn document_stats(content: &str) -> DocumentStats {
    let mut stats = DocumentStats {
        characters: content.chars().count(),
        ..Default::default()
    };

    let mut in_paragraph = false;
    for line in content.split('\n') {
        stats.lines += 1;
        stats.words += line.split_whitespace().count();

        if line.trim().is_empty() {
            in_paragraph = false;
        } else if !in_paragraph {
            stats.paragraphs += 1;
            in_paragraph = true;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_headings_levels_and_ids() {
        let doc = "# Title\n\nSome text\n## Getting Started!\n####### too deep\n#nospace\n###   Spaced  ";
        let headings = extract_headings(doc);

        assert_eq!(headings.len(), 3);
        assert_eq!(headings[0], Heading {
            id: "heading-0-title".to_string(),
            text: "Title".to_string(),
            level: 1,
            line: 1,
        });
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].id, "heading-3-getting-started");
        assert_eq!(headings[2].text, "Spaced");
        assert_eq!(headings[2].level, 3);
        assert_eq!(headings[2].line, 7);
    }

    #[test]
    fn test_no_headings_in_plain_text() {
        assert!(extract_headings("just words\nand more").is_empty());
        assert!(extract_headings("").is_empty());
    }

    #[test]
    fn test_document_stats() {
        let stats = document_stats("# Title\n\nfirst para\nstill first\n\n\nsecond ünïcode");
        assert_eq!(stats.lines, 7);
        assert_eq!(stats.words, 8);
        assert_eq!(stats.paragraphs, 3);
        assert_eq!(stats.characters, "# Title\n\nfirst para\nstill first\n\n\nsecond ünïcode".chars().count());
    }

    #[test]
    fn test_empty_document_stats() {
        let stats = document_stats("");
        assert_eq!(stats, DocumentStats { words: 0, characters: 0, lines: 1, paragraphs: 0 });
    }
}
