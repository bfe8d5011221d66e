use unicode_segmentation::UnicodeSegmentation;

/// Default preview length for the conversation history list.
pub const PREVIEW_LIMIT: usize = 80;

/// Truncate `text` to `limit` graphemes, appending an ellipsis when cut.
pub fn truncate_text(text: &str, limit: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(limit).collect();
    if graphemes.next().is_none() {
        return text.to_string();
    }
    format!("{head}…")
}

/// Human-readable byte size (`512 B`, `1.5 KB`, `2.0 MB`).
pub fn format_file_size(size: u64) -> String {
    if size < 1024 {
        return format!("{size} B");
    }
    if size < 1024 * 1024 {
        return format!("{:.1} KB", size as f64 / 1024.0);
    }
    format!("{:.1} MB", size as f64 / (1024.0 * 1024.0))
}
