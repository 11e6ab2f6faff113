//! Word tokenization shared by the feature extractors.

/// Split text into lowercase word tokens.
///
/// Words keep interior apostrophes ("don't") and hyphens; everything
/// else is a separator.
pub fn words(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '\'' || ch == '-' {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            push_word(&mut out, &mut current);
        }
    }
    if !current.is_empty() {
        push_word(&mut out, &mut current);
    }

    out
}

fn push_word(out: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim_matches(|c| c == '\'' || c == '-');
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    current.clear();
}
