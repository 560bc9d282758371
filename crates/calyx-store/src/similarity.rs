//! Text-similarity scoring for `Recall` (spec §4.3): "text-similarity search
//! over summary; may use embedding hook if provided, else substring/ngram
//! scoring." This module is the ngram fallback; an embedding hook is a
//! `Fn(&str) -> Vec<f32>` the caller may supply instead of calling this.

use std::collections::HashSet;

/// Character trigrams of a lowercased string, used as the ngram alphabet
/// for Jaccard similarity. Short inputs (<3 chars) degrade to the whole
/// string as their only trigram.
fn trigrams(s: &str) -> HashSet<String> {
    let lower = s.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();
    if chars.len() < 3 {
        let mut set = HashSet::new();
        if !lower.is_empty() {
            set.insert(lower);
        }
        return set;
    }
    chars
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Jaccard similarity over character trigrams, in [0, 1]. A substring match
/// of the shorter string within the longer scores at least as high as pure
/// trigram overlap would suggest, since full containment implies every one
/// of the shorter string's trigrams appears in the longer.
pub fn ngram_similarity(query: &str, candidate: &str) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    let a = trigrams(query);
    let b = trigrams(candidate);
    if a.is_empty() || b.is_empty() {
        return if candidate.to_lowercase().contains(&query.to_lowercase()) {
            1.0
        } else {
            0.0
        };
    }
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
