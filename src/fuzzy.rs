//! Fuzzy matching utilities for search
//!
//! Tiered scorer behind the city and feature search boxes. Candidates are
//! ranked exact > prefix > substring > acronym > in-order subsequence, with
//! an edit-distance fallback over a short target prefix. Scores live in
//! [0, 1]; each match also carries the character indices of the target that
//! justify it, for highlighting.

use std::iter::once;

use strsim::levenshtein;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Default cutoff used by the search boxes
pub const DEFAULT_MIN_SCORE: f64 = 0.2;

/// Result of a fuzzy match with the matched value, score and highlight indices
#[derive(Debug, Clone)]
pub struct FuzzyMatch {
    pub value: String,
    pub score: f64,
    /// Character positions in `value` that the query hit
    pub indices: Vec<usize>,
}

/// Fold a single character: strip combining marks, then lowercase.
///
/// Per-character NFD keeps the fold 1:1 with the original character
/// positions, so highlight indices stay valid ("ș" folds to "s" without
/// shifting anything).
fn fold_char(c: char) -> char {
    let base = once(c).nfd().find(|d| !is_combining_mark(*d)).unwrap_or(c);
    base.to_lowercase().next().unwrap_or(base)
}

fn fold(text: &str) -> Vec<char> {
    text.chars().map(fold_char).collect()
}

/// Score a query against a target without keeping the highlight indices
pub fn fuzzy_score(query: &str, target: &str) -> f64 {
    score_and_indices(query, target).0
}

/// Highlight indices for a query against a target
///
/// Substring matches yield the contiguous run of the match location;
/// subsequence matches yield the greedy left-to-right positions; the
/// edit-distance fallback yields no indices.
pub fn match_indices(query: &str, target: &str) -> Vec<usize> {
    score_and_indices(query, target).1
}

/// Filter candidates by fuzzy score
///
/// An empty (or all-whitespace) query matches everything with score 1.0 and
/// no highlights, so the caller can render the full list. Otherwise keeps
/// candidates scoring at least `min_score`, sorted by score descending;
/// ties keep their input order.
pub fn fuzzy_filter(query: &str, candidates: &[String], min_score: f64) -> Vec<FuzzyMatch> {
    if query.trim().is_empty() {
        return candidates
            .iter()
            .map(|c| FuzzyMatch {
                value: c.clone(),
                score: 1.0,
                indices: Vec::new(),
            })
            .collect();
    }

    let mut matches: Vec<FuzzyMatch> = candidates
        .iter()
        .filter_map(|candidate| {
            let (score, indices) = score_and_indices(query, candidate);
            if score >= min_score {
                Some(FuzzyMatch {
                    value: candidate.clone(),
                    score,
                    indices,
                })
            } else {
                None
            }
        })
        .collect();

    // Stable sort: equal scores keep the caller's ordering
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    matches
}

/// Find the best match above a minimum score
///
/// Returns None if no candidate meets the cutoff
pub fn fuzzy_best(query: &str, candidates: &[String], cutoff: f64) -> Option<FuzzyMatch> {
    fuzzy_filter(query, candidates, cutoff).into_iter().next()
}

/// The scoring ladder. First matching tier returns.
fn score_and_indices(query: &str, target: &str) -> (f64, Vec<usize>) {
    let q = fold(query.trim());
    if q.is_empty() {
        // The universal-match guard lives in fuzzy_filter; the raw ladder
        // treats an empty query as no match.
        return (0.0, Vec::new());
    }

    let t_all = fold(target);
    let offset = t_all.iter().take_while(|c| c.is_whitespace()).count();
    let end = t_all.len() - t_all.iter().rev().take_while(|c| c.is_whitespace()).count();
    if offset >= end {
        return (0.0, Vec::new());
    }
    let t = &t_all[offset..end];

    // 1. Exact (case- and diacritic-insensitive, whitespace-trimmed)
    if q == t {
        return (1.0, (offset..end).collect());
    }

    if q.len() <= t.len() {
        // 2. Prefix
        if t[..q.len()] == q[..] {
            return (0.9, (offset..offset + q.len()).collect());
        }

        // 3. Contiguous substring
        if let Some(pos) = t.windows(q.len()).position(|w| w == &q[..]) {
            let start = offset + pos;
            return (0.7, (start..start + q.len()).collect());
        }
    }

    // 4. Acronym: query spells the word-initial letters ("uk" hits
    //    "United Kingdom"). Checked before the subsequence tier, which
    //    would otherwise shadow it with a lower score.
    if let Some(indices) = acronym_indices(&q, t, offset) {
        return (0.6, indices);
    }

    // 5. In-order subsequence, greedy earliest match
    if let Some(indices) = subsequence_indices(&q, t, offset) {
        let score = 0.5 + 0.2 * (q.len() as f64 / t.len() as f64);
        return (score, indices);
    }

    // 6. Edit distance against a prefix of the target. Truncating to
    //    |q| + 2 keeps long targets from drowning short queries.
    let prefix: String = t.iter().take(q.len() + 2).collect();
    let q_str: String = q.iter().collect();
    let distance = levenshtein(&q_str, &prefix);
    let max_distance = q.len().max(3);
    if distance <= max_distance {
        let score = 0.3 * (1.0 - distance as f64 / max_distance as f64);
        (score, Vec::new())
    } else {
        (0.0, Vec::new())
    }
}

/// Word-initial characters of `t`, if they spell `q` exactly
fn acronym_indices(q: &[char], t: &[char], offset: usize) -> Option<Vec<usize>> {
    let mut initials: Vec<usize> = Vec::new();
    let mut at_word_start = true;
    for (i, c) in t.iter().enumerate() {
        if c.is_whitespace() {
            at_word_start = true;
        } else {
            if at_word_start {
                initials.push(i);
            }
            at_word_start = false;
        }
    }

    if initials.len() != q.len() {
        return None;
    }
    for (qi, &ti) in q.iter().zip(initials.iter()) {
        if t[ti] != *qi {
            return None;
        }
    }
    Some(initials.into_iter().map(|i| i + offset).collect())
}

/// Greedy left-to-right scan for all of `q` inside `t`, in order
fn subsequence_indices(q: &[char], t: &[char], offset: usize) -> Option<Vec<usize>> {
    let mut indices = Vec::with_capacity(q.len());
    let mut from = 0;
    for qc in q {
        let found = t[from..].iter().position(|tc| tc == qc)?;
        indices.push(offset + from + found);
        from += found + 1;
    }
    Some(indices)
}
