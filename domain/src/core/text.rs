//! Text helpers shared by list and log displays.

/// Single-line preview of `text`: whitespace runs collapse to one space and
/// the result is cut to at most `max_chars` characters, ending in `…` when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut out: String = collapsed.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
