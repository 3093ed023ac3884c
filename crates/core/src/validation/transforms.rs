//! Value transforms. Total functions: every input yields an output.

/// Upper-case the first character and lower-case the rest.
///
/// Empty input returns empty output. When the upper-case form of the first
/// character is more than one character (`ß` -> `SS`), the first character
/// is kept as-is so the transform stays idempotent.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut upper = first.to_uppercase();
    let head = match (upper.next(), upper.next()) {
        (Some(c), None) => c,
        _ => first,
    };

    let mut out = String::with_capacity(s.len());
    out.push(head);
    out.push_str(&chars.as_str().to_lowercase());
    out
}

pub fn lowercase(s: &str) -> String {
    s.to_lowercase()
}
