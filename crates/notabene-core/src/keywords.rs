//! Frequency-based keyword extraction for note indexing.
//!
//! Runs over the plain-text form of a note (see [`crate::richtext`]):
//! lowercase, split on whitespace, drop short words and Romanian stop
//! words, count, take the most frequent. Ties keep first-encounter order
//! because the sort is stable over the insertion-ordered counts.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Default number of keywords stored per note.
pub const DEFAULT_KEYWORD_LIMIT: usize = 10;

/// Words of this many characters or fewer are never keywords.
const MIN_WORD_CHARS: usize = 4;

/// Romanian stop words. Entries of three characters or fewer are redundant
/// with the length filter but kept so the list reads as one unit.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "acea", "aceasta", "această", "aceea", "acei", "acel", "acela", "acele", "acest",
        "acesta", "aceste", "acestea", "acestei", "acestor", "acum", "adică", "alte", "altfel",
        "anume", "apoi", "asta", "astfel", "atât", "atunci", "avea", "avem", "aveți", "cand",
        "care", "cărei", "căror", "cât", "câte", "către", "ceea", "cele", "celor", "chiar",
        "cine", "cineva", "cum", "cumva", "după", "dacă", "dar", "deci", "deja", "deoarece",
        "despre", "din", "dintr", "dintre", "doar", "două", "ești", "este", "fără", "fie",
        "fiecare", "fiind", "foarte", "iar", "încât", "încă", "între", "lângă", "mai", "mult",
        "multă", "nici", "niște", "noastră", "noastre", "noi", "nostru", "numai", "orice",
        "pentru", "peste", "prea", "prin", "sale", "sau", "său", "spre", "sunt", "suntem",
        "sunteți", "șapte", "toate", "toată", "totul", "totuși", "unde", "unei", "unele",
        "uneori", "unor", "vreo", "vreun",
    ]
    .into_iter()
    .collect()
});

/// Extract up to `limit` keywords from plain text, most frequent first.
///
/// Punctuation is trimmed from word edges before filtering, so "examen,"
/// and "examen" count as the same word.
pub fn extract_keywords(plain: &str, limit: usize) -> Vec<String> {
    let lowered = plain.to_lowercase();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for raw in lowered.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if word.chars().count() < MIN_WORD_CHARS {
            continue;
        }
        if STOP_WORDS.contains(word) {
            continue;
        }
        match counts.iter_mut().find(|entry| entry.0 == word) {
            Some(entry) => entry.1 += 1,
            None => counts.push((word.to_string(), 1)),
        }
    }

    // Stable sort: equal counts keep first-encountered order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts.into_iter().map(|(word, _)| word).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_frequency_wins() {
        let out = extract_keywords("caine caine pisica pisica pisica", 1);
        assert_eq!(out, vec!["pisica"]);
    }

    #[test]
    fn test_short_words_dropped() {
        let out = extract_keywords("cat cat cat contabilitate", 10);
        assert_eq!(out, vec!["contabilitate"]);
    }

    #[test]
    fn test_stop_words_dropped() {
        let out = extract_keywords("aceasta este pentru examen examen", 10);
        assert_eq!(out, vec!["examen"]);
    }

    #[test]
    fn test_lowercasing_merges_counts() {
        let out = extract_keywords("Examen EXAMEN bilanț", 1);
        assert_eq!(out, vec!["examen"]);
    }

    #[test]
    fn test_tie_keeps_first_encountered_order() {
        let out = extract_keywords("bilanț examen bilanț examen", 10);
        assert_eq!(out, vec!["bilanț", "examen"]);
    }

    #[test]
    fn test_punctuation_trimmed() {
        let out = extract_keywords("examen, examen. (examen)", 1);
        assert_eq!(out, vec!["examen"]);
    }

    #[test]
    fn test_limit_truncates() {
        let out = extract_keywords("unua doiua treia patra cincea", 2);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_keywords("", 10).is_empty());
    }
}
