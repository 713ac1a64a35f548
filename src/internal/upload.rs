//! Turning terminal input (dropped paths, typed paths) into a [`SelectedImage`].

use anyhow::{Context, Result, bail};
use reqwest::Url;
use std::path::{Path, PathBuf};

use crate::internal::models::SelectedImage;

const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("heic", "image/heic"),
];

/// MIME type sent with the multipart part, derived from the extension.
pub fn guess_mime_type(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    IMAGE_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}

/// Browse filter, the terminal equivalent of `accept="image/*"`.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|(known, _)| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Split the text a terminal pastes when files are dropped onto it.
///
/// Terminals differ: some quote each path, some backslash-escape spaces, some
/// emit `file://` URIs one per line.
pub fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => quote = Some(c),
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (None, c) if c.is_whitespace() => {
                paths.extend(normalize_dropped(&current));
                current.clear();
            }
            (None, c) => current.push(c),
        }
    }
    paths.extend(normalize_dropped(&current));
    paths
}

/// `file://` URIs go through [`Url`] so hosts like `localhost` and
/// percent-escapes are handled; anything else is taken as a literal path.
fn normalize_dropped(token: &str) -> Option<PathBuf> {
    if token.is_empty() {
        return None;
    }
    if !token.starts_with("file://") {
        return Some(PathBuf::from(token));
    }
    match Url::parse(token).map(|url| url.to_file_path()) {
        Ok(Ok(path)) => Some(path),
        _ => {
            tracing::debug!(%token, "Ignoring unusable file URI");
            None
        }
    }
}

/// First path of a drop; extra files are ignored.
pub fn first_dropped_path(text: &str) -> Option<PathBuf> {
    parse_dropped_paths(text).into_iter().next()
}

/// Read an image from disk into memory.
#[tracing::instrument]
pub async fn load_image(path: &Path) -> Result<SelectedImage> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("cannot access {}", path.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a file", path.display());
    }

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();

    tracing::info!(filename = %filename, bytes = data.len(), "Image loaded");
    Ok(SelectedImage::new(filename, data))
}
