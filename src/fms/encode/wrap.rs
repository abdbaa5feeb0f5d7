//! Line wrapping.

/// Byte offsets of the spaces `line` may break at: outside quoted strings and not right after a
/// backslash.
fn break_points(line: &str) -> Vec<usize> {
    let mut points = Vec::new();
    let mut quoted = false;
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            ' ' if !quoted => points.push(index),
            _ => {}
        }
    }
    points
}

/// Wraps `line` so no piece is wider than `width` where possible. Continuation lines start with
/// `indent` spaces. A word wider than `width` stays whole. Comment lines and a zero `width` are
/// left alone.
pub(super) fn wrap_line(line: &str, width: usize, indent: usize) -> Vec<String> {
    if width == 0 || line.starts_with("//") || line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let mut words = Vec::new();
    let mut start = 0;
    for point in break_points(line) {
        words.push(&line[start..point]);
        start = point + 1;
    }
    words.push(&line[start..]);

    let pad = " ".repeat(indent);
    let mut lines = Vec::new();
    let mut current: Option<(String, usize)> = None;
    for word in words.into_iter().filter(|word| !word.is_empty()) {
        let word_width = word.chars().count();
        current = Some(match current.take() {
            None => (word.to_string(), word_width),
            Some((mut text, text_width)) if text_width + 1 + word_width <= width => {
                text.push(' ');
                text.push_str(word);
                (text, text_width + 1 + word_width)
            }
            Some((text, _)) => {
                lines.push(text);
                (format!("{pad}{word}"), indent + word_width)
            }
        });
    }
    lines.extend(current.map(|(text, _)| text));
    lines
}
