// src/util.rs — Display helpers for queries and model output

/// One-line preview of free text for progress and error lines.
///
/// Whitespace runs (including newlines) collapse to a single space. Text
/// longer than `max_chars` characters is cut and suffixed with "...".
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut out: String = flat.chars().take(max_chars).collect();
    out.truncate(out.trim_end().len());
    out.push_str("...");
    out
}
