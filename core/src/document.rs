use crate::{DocId, Error, Result};
use serde::{Deserialize, Serialize};

/// Title and body segments as handed over by a document provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub title: String,
    pub segments: Vec<String>,
}

impl RawDocument {
    pub fn new<T, I, S>(title: T, segments: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { title: title.into(), segments: segments.into_iter().map(Into::into).collect() }
    }
}

/// Source of a single document. Implementations extract the title and body
/// text from whatever markup they understand.
pub trait DocumentProvider {
    fn provide(self) -> Result<RawDocument>;
}

impl DocumentProvider for RawDocument {
    fn provide(self) -> Result<RawDocument> { Ok(self) }
}

impl<F> DocumentProvider for F
where
    F: FnOnce() -> Result<RawDocument>,
{
    fn provide(self) -> Result<RawDocument> { self() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    id: DocId,
    title: String,
    segments: Vec<String>,
}

impl Document {
    pub fn id(&self) -> DocId { self.id }
    pub fn title(&self) -> &str { &self.title }
    pub fn segments(&self) -> &[String] { &self.segments }
}

/// Ordered document collection. Ids follow ingestion order and are never
/// reused, removed documents leave a tombstone behind.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<Option<Document>>,
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    pub fn add<P: DocumentProvider>(&mut self, provider: P) -> Result<DocId> {
        let raw = provider.provide()?;
        let id = DocId::try_from(self.docs.len())
            .map_err(|_| Error::invalid_document(raw.title.clone(), "corpus is full"))?;
        self.docs.push(Some(Document { id, title: raw.title, segments: raw.segments }));
        Ok(id)
    }

    pub fn remove(&mut self, id: DocId) -> Option<Document> {
        self.docs.get_mut(id as usize).and_then(Option::take)
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.docs.get(id as usize).and_then(Option::as_ref)
    }

    /// Live documents in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter().flatten()
    }

    pub fn ids(&self) -> Vec<DocId> { self.iter().map(Document::id).collect() }

    /// Number of live documents.
    pub fn len(&self) -> usize { self.iter().count() }

    pub fn is_empty(&self) -> bool { self.iter().next().is_none() }
}
