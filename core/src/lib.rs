//! Clustered TF-IDF retrieval over small, static, in-memory corpora.
//!
//! Documents are tokenized into a frequency index, turned into log-scaled
//! TF-IDF vectors, and partitioned into leader/follower clusters. Queries rank
//! the leaders first and then expand their clusters until enough results are
//! collected.
//!
//! ```no_run
//! use clusterdex::{Engine, EngineConfig, RawDocument};
//!
//! let engine = Engine::new(EngineConfig::default());
//! engine.add_document(RawDocument::new("Alpha", ["first body"]))?;
//! engine.add_document(RawDocument::new("Beta", ["second body"]))?;
//! engine.build()?;
//! for hit in engine.query("alpha")? {
//!     println!("{}. {} ({})", hit.doc_id, hit.title, hit.score);
//! }
//! # Ok::<(), clusterdex::Error>(())
//! ```

pub mod cluster;
pub mod config;
pub mod document;
pub mod dump;
pub mod engine;
pub mod error;
pub mod eval;
pub mod index;
pub mod query;
pub mod source;
pub mod tokenizer;
pub mod vector;
pub mod zone;

pub type TermId = u32;
pub type DocId = u32;

pub use cluster::{ClusterParams, Clusters};
pub use config::{AnalyzerConfig, EngineConfig, OverflowPolicy, ZoneConfig};
pub use document::{Corpus, Document, DocumentProvider, RawDocument};
pub use dump::{ClusterReport, ClusterSummary};
pub use engine::{BuildStats, Engine, Snapshot};
pub use error::{Error, Result};
pub use eval::{evaluate, EvalReport, Judgment};
pub use query::Hit;
pub use vector::DocumentVector;
