//! Build pipeline and the queryable engine.
//!
//! Every build produces a fresh immutable [`Snapshot`] that is swapped in
//! behind an `Arc`. Queries clone the current `Arc` and run without holding any
//! lock, so a rebuild never exposes partial state.

use crate::cluster::{ClusterBuilder, ClusterParams, Clusters};
use crate::config::{EngineConfig, ZoneConfig};
use crate::document::{Corpus, Document, DocumentProvider};
use crate::dump::ClusterReport;
use crate::index::{Dictionary, FrequencyIndex, FrequencyTable};
use crate::query::{clustered_search, parse_query, resolve_terms, Hit};
use crate::tokenizer::Analyzer;
use crate::vector::{vectorize, DocumentVector};
use crate::zone::ZoneIndex;
use crate::{DocId, Error, Result};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub num_docs: usize,
    pub num_terms: usize,
    pub num_leaders: usize,
    pub max_cluster_size: usize,
    pub unassigned: usize,
}

/// Everything derived from one corpus build. Read-only once constructed.
#[derive(Debug)]
pub struct Snapshot {
    dictionary: Dictionary,
    frequencies: FrequencyTable,
    vectors: HashMap<DocId, DocumentVector>,
    clusters: Clusters,
    zones: ZoneIndex,
    titles: HashMap<DocId, String>,
    analyzer: Analyzer,
    stats: BuildStats,
}

enum Leaders<'a, R: Rng + ?Sized> {
    Random(&'a mut R),
    Fixed(&'a [DocId]),
}

impl Snapshot {
    fn build<R: Rng + ?Sized>(
        corpus: &Corpus,
        analyzer: &Analyzer,
        config: &EngineConfig,
        leaders: Leaders<'_, R>,
    ) -> Result<Self> {
        let started = Instant::now();
        let ids = corpus.ids();
        if ids.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let mut index = FrequencyIndex::new();
        let mut titles = HashMap::with_capacity(ids.len());
        for doc in corpus.iter() {
            index.record_all(analyzer.tokenize(doc.title()), doc.id());
            for segment in doc.segments() {
                index.record_all(analyzer.tokenize(segment), doc.id());
            }
            titles.insert(doc.id(), doc.title().to_string());
        }
        let (dictionary, frequencies) = index.into_parts();
        tracing::debug!(num_docs = ids.len(), num_terms = dictionary.len(), "ingested documents");

        let vectors = vectorize(&frequencies, &ids);
        tracing::debug!(num_vectors = vectors.len(), "computed document vectors");

        let params = ClusterParams::for_corpus(ids.len());
        let builder = ClusterBuilder::new(&vectors, params).overflow(config.overflow);
        let clusters = match leaders {
            Leaders::Random(rng) => builder.build(&ids, rng)?,
            Leaders::Fixed(leaders) => builder.build_with_leaders(&ids, leaders)?,
        };
        let zones = ZoneIndex::build(corpus, analyzer);

        let stats = BuildStats {
            num_docs: ids.len(),
            num_terms: dictionary.len(),
            num_leaders: clusters.len(),
            max_cluster_size: clusters.max_cluster_size(),
            unassigned: clusters.unassigned().len(),
        };
        if stats.unassigned > 0 {
            tracing::warn!(unassigned = stats.unassigned, "some followers were left out of every cluster");
        }
        tracing::info!(
            num_docs = stats.num_docs,
            num_terms = stats.num_terms,
            num_leaders = stats.num_leaders,
            took_ms = started.elapsed().as_millis() as u64,
            "index build complete"
        );

        Ok(Snapshot {
            dictionary,
            frequencies,
            vectors,
            clusters,
            zones,
            titles,
            analyzer: analyzer.clone(),
            stats,
        })
    }

    pub fn dictionary(&self) -> &Dictionary { &self.dictionary }
    pub fn frequencies(&self) -> &FrequencyTable { &self.frequencies }
    pub fn vector(&self, doc: DocId) -> Option<&DocumentVector> { self.vectors.get(&doc) }
    pub fn clusters(&self) -> &Clusters { &self.clusters }
    pub fn zones(&self) -> &ZoneIndex { &self.zones }
    pub fn title(&self, doc: DocId) -> Option<&str> { self.titles.get(&doc).map(String::as_str) }
    pub fn stats(&self) -> &BuildStats { &self.stats }
    pub fn num_docs(&self) -> usize { self.stats.num_docs }

    /// Cosine similarity between two indexed documents.
    pub fn similarity(&self, a: DocId, b: DocId) -> Option<f64> {
        Some(self.vector(a)?.cosine(self.vector(b)?))
    }

    /// Clustered retrieval returning at most `k` hits.
    pub fn search(&self, text: &str, k: usize) -> Vec<Hit> {
        let Some(words) = parse_query(text) else { return Vec::new() };
        let terms = resolve_terms(&words, &self.analyzer, &self.dictionary);
        let hits = clustered_search(&terms, &self.vectors, &self.clusters, k);
        self.to_hits(hits)
    }

    /// Title/body zone retrieval.
    pub fn search_zones(&self, text: &str, config: &ZoneConfig) -> Vec<Hit> {
        let Some(words) = parse_query(text) else { return Vec::new() };
        let terms: Vec<String> = words.iter().filter_map(|w| self.analyzer.normalize_term(w)).collect();
        let hits = self.zones.search(&terms, config);
        self.to_hits(hits)
    }

    fn to_hits(&self, scored: Vec<(DocId, f64)>) -> Vec<Hit> {
        scored
            .into_iter()
            .map(|(doc_id, score)| Hit {
                doc_id,
                title: self.title(doc_id).unwrap_or_default().to_string(),
                score,
            })
            .collect()
    }

    pub fn report(&self) -> ClusterReport<'_> { ClusterReport::new(self) }
}

/// Owns the corpus and the most recently built snapshot.
///
/// Builds work on a copy of the corpus taken under a short read lock, so
/// documents added while a build runs land in the next one.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    analyzer: Analyzer,
    corpus: RwLock<Corpus>,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let analyzer = Analyzer::new(config.analyzer.clone());
        Self { config, analyzer, corpus: RwLock::new(Corpus::new()), snapshot: RwLock::new(None) }
    }

    pub fn with_corpus(config: EngineConfig, corpus: Corpus) -> Self {
        let engine = Self::new(config);
        engine.replace_corpus(corpus);
        engine
    }

    pub fn config(&self) -> &EngineConfig { &self.config }

    /// Append a document; ids follow call order. Takes effect on the next build.
    pub fn add_document<P: DocumentProvider>(&self, provider: P) -> Result<DocId> {
        // run the provider before taking the lock, it may do I/O
        let raw = provider.provide()?;
        let id = self.corpus.write().add(raw)?;
        tracing::debug!(doc_id = id, "document added");
        Ok(id)
    }

    /// Remove a document from the corpus. Takes effect on the next build.
    pub fn remove_document(&self, id: DocId) -> Option<Document> {
        self.corpus.write().remove(id)
    }

    pub fn replace_corpus(&self, corpus: Corpus) {
        *self.corpus.write() = corpus;
    }

    /// Number of live documents in the corpus (not the built snapshot).
    pub fn len(&self) -> usize { self.corpus.read().len() }

    pub fn is_empty(&self) -> bool { self.corpus.read().is_empty() }

    /// Rebuild every derived structure. Uses the configured seed when set.
    pub fn build(&self) -> Result<BuildStats> {
        match self.config.seed {
            Some(seed) => self.build_with_rng(&mut StdRng::seed_from_u64(seed)),
            None => self.build_with_rng(&mut rand::rng()),
        }
    }

    pub fn build_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<BuildStats> {
        self.rebuild(Leaders::Random(rng))
    }

    /// Rebuild with an explicit leader set instead of a random draw.
    pub fn build_with_leaders(&self, leaders: &[DocId]) -> Result<BuildStats> {
        self.rebuild::<StdRng>(Leaders::Fixed(leaders))
    }

    /// Build from `corpus` and, only if that succeeds, make it the engine's
    /// corpus. On failure both the corpus and the snapshot are left as they
    /// were.
    pub fn build_corpus(&self, corpus: Corpus) -> Result<BuildStats> {
        let snapshot = match self.config.seed {
            Some(seed) => self.snapshot_of(&corpus, Leaders::Random(&mut StdRng::seed_from_u64(seed)))?,
            None => self.snapshot_of(&corpus, Leaders::Random(&mut rand::rng()))?,
        };
        *self.corpus.write() = corpus;
        Ok(self.install(snapshot))
    }

    fn rebuild<R: Rng + ?Sized>(&self, leaders: Leaders<'_, R>) -> Result<BuildStats> {
        // build from a copy so add_document is not blocked for the whole pipeline
        let corpus = self.corpus.read().clone();
        let snapshot = self.snapshot_of(&corpus, leaders)?;
        Ok(self.install(snapshot))
    }

    fn snapshot_of<R: Rng + ?Sized>(&self, corpus: &Corpus, leaders: Leaders<'_, R>) -> Result<Snapshot> {
        Snapshot::build(corpus, &self.analyzer, &self.config, leaders)
    }

    fn install(&self, snapshot: Snapshot) -> BuildStats {
        let stats = snapshot.stats.clone();
        *self.snapshot.write() = Some(Arc::new(snapshot));
        stats
    }

    /// The current snapshot, or `NotBuilt` before the first successful build.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.snapshot.read().clone().ok_or(Error::NotBuilt)
    }

    pub fn is_built(&self) -> bool { self.snapshot.read().is_some() }

    /// Clustered query returning up to `result_size` hits. Malformed text gives
    /// an empty list.
    pub fn query(&self, text: &str) -> Result<Vec<Hit>> {
        Ok(self.snapshot()?.search(text, self.config.result_size))
    }

    pub fn query_top(&self, text: &str, k: usize) -> Result<Vec<Hit>> {
        Ok(self.snapshot()?.search(text, k))
    }

    pub fn query_zones(&self, text: &str) -> Result<Vec<Hit>> {
        Ok(self.snapshot()?.search_zones(text, &self.config.zones))
    }
}
