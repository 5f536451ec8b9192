//! Retrieval quality against relevance judgments.
//!
//! Each judged query is run through the clustered search with a fixed result
//! size. Precision and recall are averaged over the judged queries and the
//! F-measure is the harmonic mean of the two averages.

use crate::engine::Snapshot;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A query together with the documents judged relevant to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub query: String,
    pub relevant: BTreeSet<DocId>,
}

impl Judgment {
    pub fn new(query: impl Into<String>, relevant: impl IntoIterator<Item = DocId>) -> Self {
        Self { query: query.into(), relevant: relevant.into_iter().collect() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEval {
    pub query: String,
    pub retrieved: usize,
    pub relevant: usize,
    pub relevant_retrieved: usize,
    pub precision: f64,
    pub recall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalReport {
    pub k: usize,
    pub queries: Vec<QueryEval>,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn harmonic_mean(p: f64, r: f64) -> f64 {
    if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
}

/// Score the snapshot's top-`k` clustered results against `judgments`.
///
/// Judgments with no relevant documents are skipped. A query that retrieves
/// nothing has precision 0.
pub fn evaluate(snapshot: &Snapshot, judgments: &[Judgment], k: usize) -> EvalReport {
    let mut queries = Vec::with_capacity(judgments.len());
    for judgment in judgments {
        if judgment.relevant.is_empty() {
            tracing::debug!(query = %judgment.query, "skipping judgment without relevant documents");
            continue;
        }
        let hits = snapshot.search(&judgment.query, k);
        let relevant_retrieved = hits.iter().filter(|h| judgment.relevant.contains(&h.doc_id)).count();
        queries.push(QueryEval {
            query: judgment.query.clone(),
            retrieved: hits.len(),
            relevant: judgment.relevant.len(),
            relevant_retrieved,
            precision: ratio(relevant_retrieved, hits.len()),
            recall: ratio(relevant_retrieved, judgment.relevant.len()),
        });
    }

    let n = queries.len();
    let (precision, recall) = if n == 0 {
        (0.0, 0.0)
    } else {
        (
            queries.iter().map(|q| q.precision).sum::<f64>() / n as f64,
            queries.iter().map(|q| q.recall).sum::<f64>() / n as f64,
        )
    };
    let f1 = harmonic_mean(precision, recall);
    tracing::info!(num_queries = n, k, precision, recall, f1, "evaluation complete");
    EvalReport { k, queries, precision, recall, f1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::document::RawDocument;
    use crate::engine::Engine;
    use std::sync::Arc;

    fn fruit_snapshot() -> Arc<Snapshot> {
        let engine = Engine::new(EngineConfig { seed: Some(11), ..EngineConfig::default() });
        engine.add_document(RawDocument::new("Apple", ["apple pie"])).unwrap();
        engine.add_document(RawDocument::new("Apple", ["apple tart"])).unwrap();
        engine.add_document(RawDocument::new("Banana", ["banana"])).unwrap();
        engine.add_document(RawDocument::new("Cherry", ["cherry"])).unwrap();
        engine.build().unwrap();
        engine.snapshot().unwrap()
    }

    #[test]
    fn averages_precision_and_recall_over_queries() {
        let snap = fruit_snapshot();
        let judgments = vec![
            // retrieves 0 and 1, one of them relevant: p = 1/2, r = 1/2
            Judgment::new("apple", [0, 2]),
            // retrieves 3 only: p = 1, r = 1
            Judgment::new("cherry", [3]),
            // unknown word retrieves nothing: p = 0, r = 0
            Judgment::new("durian", [2]),
        ];
        let report = evaluate(&snap, &judgments, 3);

        assert_eq!(report.queries.len(), 3);
        assert_eq!(report.queries[0].retrieved, 2);
        assert_eq!(report.queries[0].relevant_retrieved, 1);
        assert_eq!(report.queries[0].precision, 0.5);
        assert_eq!(report.queries[0].recall, 0.5);
        assert_eq!(report.queries[1].precision, 1.0);
        assert_eq!(report.queries[2].retrieved, 0);
        assert_eq!(report.queries[2].precision, 0.0);

        assert_eq!(report.precision, 0.5);
        assert_eq!(report.recall, 0.5);
        assert_eq!(report.f1, 0.5);
    }

    #[test]
    fn result_size_bounds_recall() {
        let snap = fruit_snapshot();
        let report = evaluate(&snap, &[Judgment::new("apple", [0, 1])], 1);
        assert_eq!(report.queries[0].retrieved, 1);
        assert_eq!(report.precision, 1.0);
        assert_eq!(report.recall, 0.5);
        assert!((report.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn unjudged_queries_are_skipped() {
        let snap = fruit_snapshot();
        let report = evaluate(&snap, &[Judgment::new("apple", []), Judgment::new("abc123", [1])], 3);
        assert_eq!(report.queries.len(), 1);
        assert_eq!(report.queries[0].query, "abc123");
        assert_eq!(report.f1, 0.0);

        let empty = evaluate(&snap, &[], 3);
        assert!(empty.queries.is_empty());
        assert_eq!((empty.precision, empty.recall, empty.f1), (0.0, 0.0, 0.0));
    }

    #[test]
    fn judgments_load_from_json() {
        let parsed: Vec<Judgment> =
            serde_json::from_str(r#"[{"query": "apple", "relevant": [1, 0, 1]}]"#).unwrap();
        assert_eq!(parsed, vec![Judgment::new("apple", [0, 1])]);
    }
}
