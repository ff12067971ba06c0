// Folder commands - markdown file tree for the sidebar

use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;
use crate::models::FileNode;
use super::common::is_markdown_path;

/// Levels below the opened folder that are listed
pub const MAX_TREE_DEPTH: usize = 3;

const IGNORED_DIRS: [&str; 3] = ["node_modules", "dist", "build"];

fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || IGNORED_DIRS.contains(&name.as_ref())
}

/// Directories first, then case-insensitive name order
fn tree_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| {
            let a = a.file_name().to_string_lossy().to_lowercase();
            let b = b.file_name().to_string_lossy().to_lowercase();
            a.cmp(&b)
        })
}

/// Build the file tree of `root`: directories and markdown files only
pub fn open_folder(root: &Path) -> Result<Vec<FileNode>> {
    tracing::debug!(root = %root.display(), "open_folder");
    fs::read_dir(root)?;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_TREE_DEPTH)
        .sort_by(tree_order)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e));

    // Directories still collecting children, with their walk depth
    let mut open_dirs: Vec<(usize, FileNode)> = Vec::new();
    let mut roots = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let depth = entry.depth();
        while open_dirs.last().is_some_and(|(d, _)| *d >= depth) {
            close_dir(&mut open_dirs, &mut roots);
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path().to_path_buf();
        if entry.file_type().is_dir() {
            open_dirs.push((depth, FileNode::directory(name, path)));
        } else if is_markdown_path(&path) {
            attach(&mut open_dirs, &mut roots, FileNode::file(name, path));
        }
    }
    while !open_dirs.is_empty() {
        close_dir(&mut open_dirs, &mut roots);
    }

    tracing::debug!(entries = roots.len(), "open_folder done");
    Ok(roots)
}

fn close_dir(open_dirs: &mut Vec<(usize, FileNode)>, roots: &mut Vec<FileNode>) {
    if let Some((_, node)) = open_dirs.pop() {
        attach(open_dirs, roots, node);
    }
}

fn attach(open_dirs: &mut [(usize, FileNode)], roots: &mut Vec<FileNode>, node: FileNode) {
    match open_dirs.last_mut() {
        Some((_, parent)) => parent.children.push(node),
        None => roots.push(node),
    }
}
