// Image commands - persist pasted or dropped images next to the document

use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Folder (relative to the document) that receives images
pub const ASSETS_FOLDER: &str = "assets";

/// Assets directory for a document; untitled documents use `assets/` in the working directory
fn assets_dir(document_path: Option<&Path>) -> PathBuf {
    match document_path.and_then(Path::parent) {
        Some(dir) => dir.join(ASSETS_FOLDER),
        None => PathBuf::from(ASSETS_FOLDER),
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    if mime.contains("jpeg") || mime.contains("jpg") {
        ".jpg"
    } else if mime.contains("gif") {
        ".gif"
    } else if mime.contains("webp") {
        ".webp"
    } else {
        ".png"
    }
}

/// Markdown-friendly relative link (always forward slashes)
fn markdown_link(file_name: &str) -> String {
    format!("{ASSETS_FOLDER}/{file_name}")
}

/// Decode a `data:<mime>;base64,<payload>` URL and write it into the assets folder.
///
/// Returns the relative path to embed in the document.
pub fn save_base64_image(data_url: &str, document_path: Option<&Path>) -> Result<String> {
    let Some((header, payload)) = data_url.split_once(',') else {
        return Err(AppError::InvalidImageData("expected '<header>,<data>'".to_string()));
    };
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim())?;

    let dir = assets_dir(document_path);
    fs::create_dir_all(&dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let file_name = format!("image-{}{}", timestamp, extension_for_mime(header));
    fs::write(dir.join(&file_name), bytes)?;

    tracing::debug!(file = %file_name, dir = %dir.display(), "saved pasted image");
    Ok(markdown_link(&file_name))
}

/// Copy an image file into the assets folder, adding `-N` on name clashes
pub fn copy_image_to_assets(source: &Path, document_path: Option<&Path>) -> Result<String> {
    let bytes = fs::read(source)?;
    let dir = assets_dir(document_path);
    fs::create_dir_all(&dir)?;

    let stem = source.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut file_name = format!("{stem}{ext}");
    let mut counter = 1;
    while dir.join(&file_name).exists() {
        file_name = format!("{stem}-{counter}{ext}");
        counter += 1;
    }
    fs::write(dir.join(&file_name), bytes)?;

    tracing::debug!(source = %source.display(), file = %file_name, "copied image");
    Ok(markdown_link(&file_name))
}
