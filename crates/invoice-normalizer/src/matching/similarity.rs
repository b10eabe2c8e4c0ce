//! Header normalization and edit-distance similarity.

/// Normalize a header for comparison: lowercase, punctuation and symbols
/// become spaces, whitespace collapses to single spaces, ends trimmed.
pub fn normalize_header(header: &str) -> String {
    let replaced: String = header
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity ratio in [0, 1] between two already-normalized strings.
///
/// `1 - distance / max_len`; identical strings score 1.0 and an empty string
/// scores 0.0 against anything.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Similarity between a raw header and a raw alias.
pub fn header_similarity(header: &str, alias: &str) -> f64 {
    similarity(&normalize_header(header), &normalize_header(alias))
}

/// Levenshtein edit distance over chars, two-row variant.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}
