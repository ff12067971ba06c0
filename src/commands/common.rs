// Common helpers for commands

use std::path::{Path, PathBuf};

use crate::storage::absolute_path;

/// Extensions accepted when a file arrives from the command line or a drop
pub const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// True for `.md` / `.markdown` files (case-insensitive)
pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MARKDOWN_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
        .unwrap_or(false)
}

/// Markdown file named by a launch argument vector (`argv[1]`), made absolute
pub fn markdown_file_from_args<S: AsRef<str>>(args: &[S]) -> Option<PathBuf> {
    let arg = args.get(1)?;
    let path = Path::new(arg.as_ref());
    is_markdown_path(path).then(|| absolute_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_markdown_path() {
        assert!(is_markdown_path(Path::new("notes.md")));
        assert!(is_markdown_path(Path::new("/a/b/README.MARKDOWN")));
        assert!(!is_markdown_path(Path::new("notes.txt")));
        assert!(!is_markdown_path(Path::new("md")));
    }

    #[test]
    fn test_markdown_file_from_args() {
        let found = markdown_file_from_args(&["markview", "docs/guide.md"]).expect("markdown arg");
        assert!(found.is_absolute());
        assert!(found.ends_with("docs/guide.md"));

        assert!(markdown_file_from_args(&["markview", "image.png"]).is_none());
        assert!(markdown_file_from_args(&["markview"]).is_none());
    }
}
