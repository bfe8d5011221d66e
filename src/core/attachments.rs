//! Turning selected or pasted files into staged image attachments.

use base64::Engine as _;
use std::path::Path;
use tokio::task::JoinError;

use crate::core::message::Attachment;
use crate::utils::ids::create_id;

/// A file offered to the composer, before it is accepted.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// `None` for pasted clipboard images.
    pub name: Option<String>,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Read a file from disk, declaring its MIME type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self {
            name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            mime_type: mime_type_for_path(path).to_string(),
            bytes,
        })
    }
}

pub fn mime_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Encode an accepted file as an attachment with an inline `data:` preview.
///
/// `staged_count` is the number of attachments already staged; it only
/// matters for naming unnamed (pasted) images.
pub async fn decode_preview(
    file: SelectedFile,
    staged_count: usize,
) -> Result<Attachment, JoinError> {
    let SelectedFile {
        name,
        mime_type,
        bytes,
    } = file;
    let size = bytes.len() as u64;
    let mime_for_url = mime_type.clone();
    let encoded = encode_off_thread(bytes, encode_base64).await?;

    Ok(Attachment {
        id: create_id(),
        name: name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("pasted-image-{}.png", staged_count + 1)),
        mime_type,
        size,
        preview: format!("data:{mime_for_url};base64,{encoded}"),
    })
}

fn encode_base64(bytes: &[u8]) -> String {
    base64::prelude::BASE64_STANDARD.encode(bytes)
}

async fn encode_off_thread(
    bytes: Vec<u8>,
    encode: fn(&[u8]) -> String,
) -> Result<String, JoinError> {
    tokio::task::spawn_blocking(move || encode(&bytes)).await
}
