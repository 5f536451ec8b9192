use crate::{DocId, TermId};
use std::collections::HashMap;

/// Term → id mapping. Ids are handed out in first-seen order starting at 0.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    ids: HashMap<String, TermId>,
}

impl Dictionary {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, term: &str) -> Option<TermId> { self.ids.get(term).copied() }

    /// Return the id of `term`, assigning the next free one if it is new.
    pub fn intern(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.ids.len() as TermId;
        self.ids.insert(term.to_string(), id);
        id
    }

    pub fn len(&self) -> usize { self.ids.len() }

    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TermId)> {
        self.ids.iter().map(|(t, &id)| (t.as_str(), id))
    }
}

/// Raw term counts per (term, document). Every stored count is at least 1.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: HashMap<TermId, HashMap<DocId, u32>>,
}

impl FrequencyTable {
    /// Raw count of `term` in `doc`, 0 when absent.
    pub fn tf(&self, term: TermId, doc: DocId) -> u32 {
        self.counts.get(&term).and_then(|m| m.get(&doc)).copied().unwrap_or(0)
    }

    /// Number of documents containing `term`.
    pub fn df(&self, term: TermId) -> usize {
        self.counts.get(&term).map_or(0, HashMap::len)
    }

    pub fn postings(&self, term: TermId) -> Option<&HashMap<DocId, u32>> { self.counts.get(&term) }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &HashMap<DocId, u32>)> {
        self.counts.iter().map(|(&t, m)| (t, m))
    }

    pub fn num_terms(&self) -> usize { self.counts.len() }
}

/// Accumulates the dictionary and frequency table while documents are ingested.
#[derive(Debug, Default)]
pub struct FrequencyIndex {
    dictionary: Dictionary,
    table: FrequencyTable,
}

impl FrequencyIndex {
    pub fn new() -> Self { Self::default() }

    pub fn record(&mut self, term: &str, doc: DocId) -> TermId {
        let tid = self.dictionary.intern(term);
        *self.table.counts.entry(tid).or_default().entry(doc).or_insert(0) += 1;
        tid
    }

    pub fn record_all<I, S>(&mut self, terms: I, doc: DocId)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            self.record(term.as_ref(), doc);
        }
    }

    pub fn dictionary(&self) -> &Dictionary { &self.dictionary }

    pub fn table(&self) -> &FrequencyTable { &self.table }

    pub fn into_parts(self) -> (Dictionary, FrequencyTable) { (self.dictionary, self.table) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_assigns_ids_in_first_seen_order() {
        let mut idx = FrequencyIndex::new();
        assert_eq!(idx.record("beta", 0), 0);
        assert_eq!(idx.record("alpha", 0), 1);
        assert_eq!(idx.record("beta", 1), 0);
        assert_eq!(idx.dictionary().len(), 2);
        assert_eq!(idx.dictionary().get("alpha"), Some(1));
        assert_eq!(idx.dictionary().get("gamma"), None);
    }

    #[test]
    fn record_counts_per_document() {
        let mut idx = FrequencyIndex::new();
        idx.record_all(["rust", "rust", "code"], 0);
        idx.record_all(["rust"], 3);
        let (dict, table) = idx.into_parts();
        let rust = dict.get("rust").unwrap();
        assert_eq!(table.tf(rust, 0), 2);
        assert_eq!(table.tf(rust, 3), 1);
        assert_eq!(table.tf(rust, 1), 0);
        assert_eq!(table.df(rust), 2);
        assert!(table.iter().all(|(_, docs)| docs.values().all(|&c| c >= 1)));
    }
}
