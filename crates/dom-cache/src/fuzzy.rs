use strsim::normalized_levenshtein;

/// Best normalized similarity between the shorter input and any
/// equally-sized window of the longer one.
///
/// This is the substring-similarity counterpart of a plain edit distance:
/// "sign" scores high against "Sign up for free" even though the full
/// strings differ widely. Returns a score in `[0.0, 1.0]`; matching is
/// case-sensitive, callers lowercase both sides first.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return if a == b { 1.0 } else { 0.0 };
    }

    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let needle: Vec<char> = shorter.chars().collect();
    let haystack: Vec<char> = longer.chars().collect();
    let window = needle.len();
    let needle_str: String = needle.iter().collect();

    let mut best: f64 = 0.0;
    for start in 0..=(haystack.len() - window) {
        let slice: String = haystack[start..start + window].iter().collect();
        let score = normalized_levenshtein(&needle_str, &slice);
        if score > best {
            best = score;
        }
        if best >= 1.0 {
            break;
        }
    }
    best
}
