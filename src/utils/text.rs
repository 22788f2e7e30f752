// Text helpers shared by the agents and the workflow

/// Strips one leading ```` ```json ```` (or bare ```` ``` ````) fence and one trailing
/// ```` ``` ```` fence, then trims. Text without fences is only trimmed.
pub fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let opened = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let closed = opened.trim_end().strip_suffix("```").unwrap_or(opened);
    closed.trim()
}

/// First `max_chars` characters of `text`, never splitting a UTF-8 sequence.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
