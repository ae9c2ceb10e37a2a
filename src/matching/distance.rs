//! Character-level edit distance.

/// Returns the minimum number of single-character insertions, deletions and
/// substitutions needed to turn `a` into `b`.
///
/// Compares Unicode scalar values, not bytes. Uses the full
/// `(len(a)+1) × (len(b)+1)` table.
#[cfg(test)]
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    distance_chars(&a, &b)
}

/// Edit distance between pre-split character slices.
pub fn distance_chars(a: &[char], b: &[char]) -> usize {
    let m = a.len();
    let n = b.len();

    let mut table = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        table[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let substitution = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            table[i][j] = (table[i - 1][j] + 1)
                .min(table[i][j - 1] + 1)
                .min(table[i - 1][j - 1] + substitution);
        }
    }

    table[m][n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_known_pairs() {
        let cases = [
            ("", "", 0),
            ("a", "", 1),
            ("", "a", 1),
            ("abc", "abc", 0),
            ("abc", "ab", 1),
            ("abc", "bc", 1),
            ("abc", "ac", 1),
            ("abc", "abcd", 1),
            ("kitten", "sitting", 3),
            ("forma", "format", 1),
            ("forma", "form", 1),
            ("forma", "f0rmal", 2),
            ("Pirme", "Prime", 2),
        ];

        for (a, b, want) in cases {
            assert_eq!(distance(a, b), want, "distance({:?}, {:?})", a, b);
        }
    }

    #[test]
    fn test_distance_identity_and_empty() {
        for s in ["", "Ash", "Blueprint", "Neuroptics", "ÄÖÜ"] {
            assert_eq!(distance(s, s), 0);
            assert_eq!(distance("", s), s.chars().count());
            assert_eq!(distance(s, ""), s.chars().count());
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let words = ["Prime", "Pirme", "Chassis", "Chasis", "Systems", "Stock", ""];
        for a in words {
            for b in words {
                assert_eq!(distance(a, b), distance(b, a));
            }
        }
    }

    #[test]
    fn test_distance_triangle_inequality() {
        let words = ["Barrel", "Baarel", "Bareel", "Receiver", "Grip"];
        for a in words {
            for b in words {
                for c in words {
                    assert!(distance(a, c) <= distance(a, b) + distance(b, c));
                }
            }
        }
    }

    #[test]
    fn test_distance_counts_code_points() {
        // One substitution, even though the replacement is multi-byte.
        assert_eq!(distance("Prime", "Prïme"), 1);
    }
}
