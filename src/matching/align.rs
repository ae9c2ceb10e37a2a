//! Smith-Waterman local alignment, for OCR text that was not split into words.

const MATCH_SCORE: i32 = 2;
const MISMATCH_SCORE: i32 = -1;
const GAP_PENALTY: i32 = -1;

/// Highest local-alignment score between `a` and `b`.
///
/// Each cell is `max(0, diagonal, up, left)`; the result is the largest cell
/// anywhere in the matrix, so it is never negative.
pub fn local_alignment_score(a: &[char], b: &[char]) -> i32 {
    // Only the previous row is needed to fill the next one.
    let mut previous = vec![0i32; b.len() + 1];
    let mut current = vec![0i32; b.len() + 1];
    let mut best = 0;

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            let step = if ca == cb { MATCH_SCORE } else { MISMATCH_SCORE };
            let value = 0
                .max(previous[j] + step)
                .max(previous[j + 1] + GAP_PENALTY)
                .max(current[j] + GAP_PENALTY);
            current[j + 1] = value;
            best = best.max(value);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    best
}

/// Scores `noisy` against `text`, both compared by code point.
#[cfg(test)]
pub fn score(noisy: &str, text: &str) -> i32 {
    let a: Vec<char> = noisy.chars().collect();
    let b: Vec<char> = text.chars().collect();
    local_alignment_score(&a, &b)
}

/// Index of the candidate that aligns best with `noisy`.
///
/// Ties go to the earliest candidate. Returns `None` when there are no
/// candidates or nothing aligns at all (every score is zero).
pub fn best_match<S: AsRef<str>>(noisy: &str, candidates: &[S]) -> Option<usize> {
    let query: Vec<char> = noisy.chars().collect();

    let mut best: Option<(usize, i32)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let chars: Vec<char> = candidate.as_ref().chars().collect();
        let score = local_alignment_score(&query, &chars);
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((index, score));
        }
    }

    if let Some((index, score)) = best {
        log::debug!(
            "Aligned {:?} to {:?} (score {})",
            noisy,
            candidates[index].as_ref(),
            score
        );
    }
    best.map(|(index, _)| index)
}
