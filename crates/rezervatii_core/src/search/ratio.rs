//! Ratcliff/Obershelp sequence-matching ratio.
//!
//! `ratio = 2*M / T` where `M` counts characters in the recursively found
//! longest common blocks and `T` is the combined length of both inputs.
//! Comparison is per Unicode scalar value; callers normalize first.

/// Similarity in `[0, 1]`; two empty strings are identical (`1.0`).
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_chars(&a, &b);
    (2 * matched) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }
        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }

    matched
}

/// Longest common block inside `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Ties resolve to the earliest block in `a`, then in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
    let width = b_hi - b_lo + 1;
    let mut previous = vec![0usize; width];
    let mut current = vec![0usize; width];

    for i in a_lo..a_hi {
        current.iter_mut().for_each(|slot| *slot = 0);
        for j in b_lo..b_hi {
            if a[i] != b[j] {
                continue;
            }
            let run = previous[j - b_lo] + 1;
            current[j - b_lo + 1] = run;
            if run > best_size {
                best_i = i + 1 - run;
                best_j = j + 1 - run;
                best_size = run;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    (best_i, best_j, best_size)
}
