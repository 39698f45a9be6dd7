//! Query-to-filename similarity scoring.
//!
//! The catalog holds many versions of the same title ("Song", "Song (Live)",
//! "Song - 2011 Remaster"), so scoring works on two views of every string:
//! the normalized full name and a "base name" with parenthesized and
//! post-hyphen annotations removed. An exact base hit outranks a lexically
//! closer full-string hit.

/// Score for normalized full strings that are identical.
pub const EXACT_SCORE: f64 = 1.0;
/// Score for identical base names when both or neither side is annotated.
pub const BASE_EXACT_SCORE: f64 = 0.95;
/// Score for identical base names when exactly one side is annotated.
pub const BASE_EXACT_ANNOTATED_SCORE: f64 = 0.92;

const BASE_WEIGHT: f64 = 0.7;
const FULL_WEIGHT: f64 = 0.3;
const CONTAINS_BOOST: f64 = 0.15;
const CONTAINS_CAP: f64 = 0.95;
const BASE_CONTAINS_BOOST: f64 = 0.10;
const BASE_CONTAINS_CAP: f64 = 0.90;

/// Lowercase, trim, and collapse internal whitespace runs to one space.
pub fn normalize(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip parenthesized groups, cut at the first hyphen, then normalize.
///
/// An unbalanced `(` is kept as a literal character.
pub fn base_name(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut stripped = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '(' {
            if let Some(offset) = chars[i + 1..].iter().position(|&c| c == ')') {
                stripped.push(' ');
                i += offset + 2;
                continue;
            }
        }
        stripped.push(chars[i]);
        i += 1;
    }

    let head = match stripped.find('-') {
        Some(pos) => &stripped[..pos],
        None => stripped.as_str(),
    };
    normalize(head)
}

/// Whether the raw string carries disambiguating annotation (a parenthesis
/// or a hyphen).
fn is_annotated(s: &str) -> bool {
    s.contains('(') || s.contains('-')
}

/// Similarity of `candidate` (an indexed stem) to a user `query`, in `[0, 1]`.
///
/// Pure and deterministic; insensitive to case and whitespace layout.
pub fn score(candidate: &str, query: &str) -> f64 {
    let full_candidate = normalize(candidate);
    let full_query = normalize(query);
    if full_candidate == full_query {
        return EXACT_SCORE;
    }

    let base_candidate = base_name(candidate);
    let base_query = base_name(query);
    if !base_candidate.is_empty() && base_candidate == base_query {
        return if is_annotated(candidate) == is_annotated(query) {
            BASE_EXACT_SCORE
        } else {
            BASE_EXACT_ANNOTATED_SCORE
        };
    }

    let full = ratio(&full_candidate, &full_query);
    let base = ratio(&base_candidate, &base_query);
    let mut combined = BASE_WEIGHT * base + FULL_WEIGHT * full;

    if full_candidate.contains(&full_query) {
        combined = (combined + CONTAINS_BOOST).min(CONTAINS_CAP);
    }
    if base_candidate != base_query && base_candidate.contains(&base_query) {
        combined = (combined + BASE_CONTAINS_BOOST).min(BASE_CONTAINS_CAP);
    }

    combined
}

/// Ratcliff/Obershelp similarity: `2 * M / (|a| + |b|)` where `M` is the
/// total size of the recursively found longest matching blocks.
/// Two empty strings are identical (1.0).
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest common run of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
/// Ties resolve to the run that starts earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            if a[i] == b[j] {
                let k = prev[col - 1] + 1;
                cur[col] = k;
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            } else {
                cur[col] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    (best_i, best_j, best_k)
}
