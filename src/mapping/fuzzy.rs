// Fuzzy string scoring on a 0–100 scale.
//
// `ratio` is the normalized indel similarity: 2 * LCS / (len_a + len_b),
// computed over chars. `token_sort_ratio` sorts the words of both sides
// first, so "effects network" scores the same as "network effects".

/// Normalized indel similarity of two strings, 0.0–100.0.
///
/// Two empty strings are identical (100); one empty side scores 0.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let lcs = lcs_len(&a, &b);
    200.0 * lcs as f64 / (a.len() + b.len()) as f64
}

/// `ratio` after lowercasing, splitting on non-alphanumerics and sorting tokens.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Best choice for `term` by token-sort score. Earlier choices win ties.
pub fn best_match<'a>(term: &str, choices: &[&'a str]) -> Option<(&'a str, f64)> {
    let term = term.trim().to_lowercase();
    let mut best: Option<(&'a str, f64)> = None;
    for &choice in choices {
        let score = token_sort_ratio(&term, choice);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((choice, score));
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Length of the longest common subsequence, two-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert!((ratio("platform", "platform") - 100.0).abs() < 1e-9);
        assert!(ratio("abc", "xyz").abs() < 1e-9);
    }

    #[test]
    fn test_ratio_known_value() {
        // LCS("kitten", "sitting") = 4 → 2*4 / 13
        let expected = 800.0 / 13.0;
        assert!((ratio("kitten", "sitting") - expected).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_empty_sides() {
        assert!((ratio("", "") - 100.0).abs() < 1e-9);
        assert!(ratio("", "abc").abs() < 1e-9);
    }

    #[test]
    fn test_token_sort_ignores_order_and_case() {
        let score = token_sort_ratio("Effects Network", "network effects");
        assert!((score - 100.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_best_match_picks_closest() {
        let choices = ["Network Effects", "Five Forces", "Value Chain"];
        let (best, score) = best_match("network effect", &choices).unwrap();
        assert_eq!(best, "Network Effects");
        assert!(score > 90.0, "got {score}");
    }

    #[test]
    fn test_best_match_empty_choices() {
        assert!(best_match("anything", &[]).is_none());
    }

    #[test]
    fn test_ratio_counts_chars_not_bytes() {
        assert!((ratio("über", "uber") - 75.0).abs() < 1e-9);
    }
}
