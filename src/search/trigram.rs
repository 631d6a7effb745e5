//! Trigram similarity, compatible with PostgreSQL's `pg_trgm`.
//!
//! Text is lower-cased and split into alphanumeric words. Each word is padded
//! with two leading spaces and one trailing space before its trigrams are
//! taken. The score is the Jaccard index of the two trigram sets.

use std::collections::HashSet;

/// Candidates must score strictly above this to match by similarity alone.
pub const SIMILARITY_THRESHOLD: f64 = 0.2;

type Trigram = [char; 3];

/// Trigram set of `text`.
pub fn trigrams(text: &str) -> HashSet<Trigram> {
    let lowered = text.to_lowercase();
    let mut set = HashSet::new();

    for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let padded: Vec<char> = "  ".chars().chain(word.chars()).chain(" ".chars()).collect();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}

/// Similarity score in `[0, 1]`. Zero when either side has no trigrams.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;
    shared as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_padding() {
        let set = trigrams("Ana");
        let expected: HashSet<Trigram> = [
            [' ', ' ', 'a'],
            [' ', 'a', 'n'],
            ['a', 'n', 'a'],
            ['n', 'a', ' '],
        ]
        .into_iter()
        .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn test_punctuation_splits_words() {
        // "ana", "x", "com"
        assert_eq!(trigrams("ana@x.com").len(), 4 + 2 + 4);
    }

    #[test]
    fn test_identical_strings_score_one() {
        assert!((similarity("Ana Silva", "ana silva") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_match() {
        // 4 shared trigrams out of 10 distinct
        let score = similarity("ana@x.com", "ana");
        assert!((score - 0.4).abs() < 1e-9);
        assert!(score > SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_unrelated_strings() {
        assert_eq!(similarity("b@x.com", "ana"), 0.0);
        assert_eq!(similarity("", "ana"), 0.0);
        assert_eq!(similarity("---", "---"), 0.0);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let a = similarity("joao.pedro@empresa.com", "pedro");
        let b = similarity("pedro", "joao.pedro@empresa.com");
        assert!((a - b).abs() < f64::EPSILON);
    }
}
