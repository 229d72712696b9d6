//! Attachment staging
//!
//! Decodes `data:` URL attachments into files the generator can reference.
//! Staging is best-effort: an attachment that cannot be decoded or written
//! is logged and left out. Staged files only live for one generation call
//! and are removed with [`remove_staged`].

use appforge_core::fail_open::fail_open;
use appforge_core::{AppforgeError, Attachment, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};

/// Decode a `data:` URL into its MIME type and bytes
///
/// Returns `Ok(None)` for any other URL scheme.
pub fn decode_data_url(url: &str) -> Result<Option<(String, Vec<u8>)>> {
    let Some(rest) = url.strip_prefix("data:") else {
        return Ok(None);
    };

    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| AppforgeError::Attachment("data URL has no payload".to_string()))?;

    let mut params = header.split(';');
    let mime = params
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        BASE64_STANDARD
            .decode(data.trim())
            .map_err(|e| AppforgeError::Attachment(format!("invalid base64: {}", e)))?
    } else {
        data.as_bytes().to_vec()
    };

    Ok(Some((mime, bytes)))
}

/// Stage every decodable attachment under `dir`, returning the written paths
pub async fn stage_attachments(attachments: &[Attachment], dir: &Path) -> Vec<PathBuf> {
    let mut staged = Vec::with_capacity(attachments.len());

    for attachment in attachments {
        let operation = format!("stage attachment {}", attachment.name);
        if let Some(Some(path)) = fail_open(&operation, stage_one(attachment, dir)).await {
            tracing::info!("Saved attachment: {}", attachment.name);
            staged.push(path);
        }
    }

    staged
}

/// Remove files written by [`stage_attachments`]
///
/// Failures are logged; a file that is already gone is not an error.
pub async fn remove_staged(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!("Removed staged attachment {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
}

async fn stage_one(attachment: &Attachment, dir: &Path) -> Result<Option<PathBuf>> {
    let Some((mime, bytes)) = decode_data_url(&attachment.url)? else {
        tracing::debug!("Skipping non-data attachment {}", attachment.name);
        return Ok(None);
    };

    let extension = mime
        .rsplit('/')
        .next()
        .filter(|ext| !ext.is_empty())
        .unwrap_or("bin");
    let id = uuid::Uuid::new_v4().simple().to_string();
    let file_name = format!("{}-{}.{}", sanitize(&attachment.name), &id[..8], extension);

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await?;
    Ok(Some(path))
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.trim_matches('.') {
        "" => "attachment".to_string(),
        trimmed => trimmed.to_string(),
    }
}
