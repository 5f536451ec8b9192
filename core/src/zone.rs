//! Title/body zone index. Each (term, document) pair remembers which zones the
//! term occurred in; a query scores a document by the configured zone weights.

use crate::cluster::by_score_desc;
use crate::config::ZoneConfig;
use crate::document::Corpus;
use crate::tokenizer::Analyzer;
use crate::DocId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zones {
    pub in_title: bool,
    pub in_body: bool,
}

impl Zones {
    fn score(self, config: &ZoneConfig) -> f64 {
        let mut s = 0.0;
        if self.in_title { s += config.title_weight; }
        if self.in_body { s += config.body_weight; }
        s
    }
}

#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    postings: HashMap<String, HashMap<DocId, Zones>>,
}

impl ZoneIndex {
    pub fn build(corpus: &Corpus, analyzer: &Analyzer) -> Self {
        let mut index = ZoneIndex::default();
        for doc in corpus.iter() {
            for term in analyzer.tokenize(doc.title()) {
                index.entry(term, doc.id()).in_title = true;
            }
            for segment in doc.segments() {
                for term in analyzer.tokenize(segment) {
                    index.entry(term, doc.id()).in_body = true;
                }
            }
        }
        index
    }

    fn entry(&mut self, term: String, doc: DocId) -> &mut Zones {
        self.postings.entry(term).or_default().entry(doc).or_default()
    }

    pub fn zones(&self, term: &str, doc: DocId) -> Option<Zones> {
        self.postings.get(term).and_then(|m| m.get(&doc)).copied()
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    /// Score every document containing a query term, keep positive scores,
    /// order by descending score then ascending id, truncate to the configured size.
    pub fn search(&self, terms: &[String], config: &ZoneConfig) -> Vec<(DocId, f64)> {
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for term in terms {
            if let Some(docs) = self.postings.get(term) {
                for (&doc, zones) in docs {
                    *scores.entry(doc).or_insert(0.0) += zones.score(config);
                }
            }
        }
        let mut ranked: Vec<(f64, DocId)> = scores
            .into_iter()
            .filter(|(_, s)| *s > 0.0)
            .map(|(d, s)| (s, d))
            .collect();
        ranked.sort_by(by_score_desc);
        ranked.truncate(config.result_size);
        ranked.into_iter().map(|(s, d)| (d, s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawDocument;

    fn index() -> ZoneIndex {
        let mut corpus = Corpus::new();
        corpus.add(RawDocument::new("Ocean tides", ["the moon pulls water"])).unwrap();
        corpus.add(RawDocument::new("Moon landing", ["ocean of storms"])).unwrap();
        corpus.add(RawDocument::new("Gardening", ["soil and water"])).unwrap();
        ZoneIndex::build(&corpus, &Analyzer::default())
    }

    #[test]
    fn records_zones_per_document() {
        let idx = index();
        assert_eq!(idx.zones("ocean", 0), Some(Zones { in_title: true, in_body: false }));
        assert_eq!(idx.zones("ocean", 1), Some(Zones { in_title: false, in_body: true }));
        assert_eq!(idx.zones("ocean", 2), None);
    }

    #[test]
    fn title_hits_outrank_body_hits() {
        let idx = index();
        let hits = idx.search(&["moon".to_string()], &ZoneConfig::default());
        assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![1, 0]);
        assert!((hits[0].1 - 0.8).abs() < 1e-12);
        assert!((hits[1].1 - 0.2).abs() < 1e-12);
    }

    #[test]
    fn scores_add_across_terms_and_ties_use_id() {
        let idx = index();
        let terms = vec!["ocean".to_string(), "moon".to_string()];
        let hits = idx.search(&terms, &ZoneConfig::default());
        // both documents score 0.8 + 0.2
        assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![0, 1]);
        let hits = idx.search(&terms, &ZoneConfig { result_size: 1, ..ZoneConfig::default() });
        assert_eq!(hits.len(), 1);
    }
}
