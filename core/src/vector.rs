//! Log-scaled TF-IDF document vectors and cosine similarity.

use crate::index::FrequencyTable;
use crate::{DocId, TermId};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Sparse term-weight vector with its Euclidean length cached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentVector {
    weights: BTreeMap<TermId, f64>,
    length: f64,
}

impl DocumentVector {
    pub fn from_weights(weights: BTreeMap<TermId, f64>) -> Self {
        let length = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        Self { weights, length }
    }

    pub fn weight(&self, term: TermId) -> Option<f64> { self.weights.get(&term).copied() }

    pub fn length(&self) -> f64 { self.length }

    pub fn len(&self) -> usize { self.weights.len() }

    pub fn is_empty(&self) -> bool { self.weights.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f64)> + '_ {
        self.weights.iter().map(|(&t, &w)| (t, w))
    }

    /// Dot product as a merge over both term-ordered maps, so `a.dot(b)` and
    /// `b.dot(a)` add the same products in the same order.
    pub fn dot(&self, other: &DocumentVector) -> f64 {
        let mut a_it = self.weights.iter();
        let mut b_it = other.weights.iter();
        let mut a_next = a_it.next();
        let mut b_next = b_it.next();
        let mut dot = 0.0;
        while let (Some((ta, wa)), Some((tb, wb))) = (a_next, b_next) {
            match ta.cmp(tb) {
                Ordering::Equal => {
                    dot += wa * wb;
                    a_next = a_it.next();
                    b_next = b_it.next();
                }
                Ordering::Less => a_next = a_it.next(),
                Ordering::Greater => b_next = b_it.next(),
            }
        }
        dot
    }

    /// Cosine similarity; 0 when either vector has zero length.
    pub fn cosine(&self, other: &DocumentVector) -> f64 {
        if self.length == 0.0 || other.length == 0.0 {
            return 0.0;
        }
        self.dot(other) / (self.length * other.length)
    }
}

/// `(1 + ln tf) * (1 + ln(N / df))`
pub fn term_weight(tf: u32, df: usize, num_docs: usize) -> f64 {
    if tf == 0 || df == 0 {
        return 0.0;
    }
    let tf = 1.0 + (tf as f64).ln();
    let idf = 1.0 + (num_docs as f64 / df as f64).ln();
    tf * idf
}

/// Compute one vector per document in `doc_ids`. The table must be complete
/// for the whole corpus since idf depends on every document.
pub fn vectorize(table: &FrequencyTable, doc_ids: &[DocId]) -> HashMap<DocId, DocumentVector> {
    let num_docs = doc_ids.len();
    let mut per_doc: HashMap<DocId, Vec<(TermId, u32, usize)>> = HashMap::with_capacity(num_docs);
    for (term, docs) in table.iter() {
        let df = docs.len();
        for (&doc, &tf) in docs {
            per_doc.entry(doc).or_default().push((term, tf, df));
        }
    }

    doc_ids
        .par_iter()
        .map(|&doc| {
            let weights: BTreeMap<TermId, f64> = per_doc
                .get(&doc)
                .map(|terms| terms.iter().map(|&(t, tf, df)| (t, term_weight(tf, df, num_docs))).collect())
                .unwrap_or_default();
            (doc, DocumentVector::from_weights(weights))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FrequencyIndex;
    use crate::tokenizer::tokenize;

    fn vectors(texts: &[&str]) -> HashMap<DocId, DocumentVector> {
        let mut idx = FrequencyIndex::new();
        for (i, t) in texts.iter().enumerate() {
            idx.record_all(tokenize(t), i as DocId);
        }
        let ids: Vec<DocId> = (0..texts.len() as DocId).collect();
        vectorize(idx.table(), &ids)
    }

    #[test]
    fn weight_follows_log_tf_idf() {
        assert_eq!(term_weight(1, 4, 4), 1.0);
        let w = term_weight(3, 1, 4);
        let expected = (1.0 + 3f64.ln()) * (1.0 + 4f64.ln());
        assert!((w - expected).abs() < 1e-12);
    }

    #[test]
    fn length_is_norm_of_weights() {
        let v = vectors(&["apple apple pear", "pear plum", "plum plum plum kiwi"]);
        for vec in v.values() {
            let norm = vec.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            assert!((vec.length() - norm).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_document_has_zero_vector() {
        let v = vectors(&["apple", "1234 !!"]);
        assert!(v[&1].is_empty());
        assert_eq!(v[&1].length(), 0.0);
        assert_eq!(v[&0].cosine(&v[&1]), 0.0);
        assert_eq!(v[&1].cosine(&v[&1]), 0.0);
    }

    #[test]
    fn cosine_is_symmetric_and_bounded() {
        let v = vectors(&["red green blue", "red red yellow", "blue sky", "green tea red"]);
        for a in v.values() {
            for b in v.values() {
                let s = a.cosine(b);
                assert_eq!(s, b.cosine(a));
                assert!((0.0..=1.0 + 1e-12).contains(&s));
            }
        }
        assert!((v[&0].cosine(&v[&0]) - 1.0).abs() < 1e-12);
    }
}
