use crate::cluster::{by_score_desc, Clusters};
use crate::index::Dictionary;
use crate::tokenizer::Analyzer;
use crate::vector::DocumentVector;
use crate::{DocId, TermId};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

lazy_static! {
    // ASCII whitespace only, U+00A0 and friends make a query malformed
    static ref QUERY: Regex = Regex::new(r"^[a-z]+(?:(?-u:\s)+[a-z]+)*$").expect("valid regex");
    static ref WORD: Regex = Regex::new(r"[a-z]+").expect("valid regex");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub doc_id: DocId,
    pub title: String,
    pub score: f64,
}

/// Split a query into lowercase words. `None` when the trimmed, lowercased
/// text is not one or more alphabetic words separated by ASCII whitespace.
pub fn parse_query(text: &str) -> Option<Vec<String>> {
    // trims ASCII space and control characters only
    let q = text.trim_matches(|c: char| c <= ' ').to_lowercase();
    if !QUERY.is_match(&q) {
        return None;
    }
    Some(WORD.find_iter(&q).map(|m| m.as_str().to_string()).collect())
}

/// Resolve query words to term ids, dropping words the index has never seen.
/// Repeated words are kept and contribute once per occurrence.
pub fn resolve_terms(words: &[String], analyzer: &Analyzer, dictionary: &Dictionary) -> Vec<TermId> {
    words
        .iter()
        .filter_map(|w| analyzer.normalize_term(w))
        .filter_map(|t| dictionary.get(&t))
        .collect()
}

/// Sum of the document's weights for the query terms.
pub fn relevance(terms: &[TermId], vector: &DocumentVector) -> f64 {
    terms.iter().filter_map(|&t| vector.weight(t)).sum()
}

/// Walk clusters in descending leader relevance and collect up to `k`
/// documents with a positive relevance. Returns `(doc_id, score)` ordered by
/// descending score then ascending id.
pub fn clustered_search(
    terms: &[TermId],
    vectors: &HashMap<DocId, DocumentVector>,
    clusters: &Clusters,
    k: usize,
) -> Vec<(DocId, f64)> {
    if terms.is_empty() || k == 0 {
        return Vec::new();
    }
    let empty = DocumentVector::default();
    let score = |id: DocId| relevance(terms, vectors.get(&id).unwrap_or(&empty));

    let mut leaders: Vec<(f64, DocId)> = clusters.leaders().map(|l| (score(l), l)).collect();
    leaders.sort_by(by_score_desc);

    let mut results: Vec<(f64, DocId)> = Vec::with_capacity(k);
    for (_, leader) in leaders {
        if results.len() >= k {
            break;
        }
        let Some(members) = clusters.members(leader) else { continue };
        let mut ranked: Vec<(f64, DocId)> = members
            .iter()
            .map(|&d| (score(d), d))
            .filter(|(s, _)| *s > 0.0)
            .collect();
        ranked.sort_by(by_score_desc);
        let room = k - results.len();
        results.extend(ranked.into_iter().take(room));
    }

    results.sort_by(by_score_desc);
    results.truncate(k);
    results.into_iter().map(|(s, d)| (d, s)).collect()
}
