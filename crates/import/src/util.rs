/// Levenshtein edit distance over Unicode scalar values, using two rows.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Shorter string on the inner loop.
    let (a, b) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let mut prev: Vec<usize> = (0..=a.len()).collect();
    let mut curr = vec![0usize; a.len() + 1];

    for (j, cb) in b.iter().enumerate() {
        curr[0] = j + 1;
        for (i, ca) in a.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[i + 1] = (prev[i + 1] + 1).min(curr[i] + 1).min(prev[i] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[a.len()]
}

/// `1 - distance / longer length`, so identical strings score 1.0.
pub fn similarity_ratio(s1: &str, s2: &str) -> f32 {
    let max_len = s1.chars().count().max(s2.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(s1, s2) as f32 / max_len as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_are_zero() {
        assert_eq!(levenshtein_distance("rewe", "rewe"), 0);
        assert_eq!(levenshtein_distance("", ""), 0);
    }

    #[test]
    fn empty_string_is_length_of_other() {
        assert_eq!(levenshtein_distance("", "aldi"), 4);
        assert_eq!(levenshtein_distance("aldi", ""), 4);
    }

    #[test]
    fn single_edits() {
        assert_eq!(levenshtein_distance("shell", "shel"), 1);
        assert_eq!(levenshtein_distance("lidl", "lidle"), 1);
        assert_eq!(levenshtein_distance("uber", "uver"), 1);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(levenshtein_distance("café", "cafe"), 1);
        assert_eq!(similarity_ratio("müller", "muller"), 1.0 - 1.0 / 6.0);
    }

    #[test]
    fn commutative() {
        assert_eq!(
            levenshtein_distance("spotify", "sptfy"),
            levenshtein_distance("sptfy", "spotify")
        );
    }

    #[test]
    fn ratio_bounds() {
        assert_eq!(similarity_ratio("netflix", "netflix"), 1.0);
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
    }
}
