//! Loading documents from disk.
//!
//! Accepts `.txt` files (first non-blank line is the title), `.json` files
//! holding one document or an array of them, and `.jsonl` files with one
//! document per line. Files that cannot be read are skipped and reported.

use crate::document::{Corpus, DocumentProvider, RawDocument};
use crate::{Error, Result};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A nested section. Flattened in document order: annotation, title,
/// paragraphs, then subsections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputSection {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub annotation: Vec<String>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub sections: Vec<InputSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputDoc {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub segments: Vec<String>,
    #[serde(default)]
    pub sections: Vec<InputSection>,
}

impl InputDoc {
    /// Collect body text with an explicit worklist so deeply nested sections
    /// cannot exhaust the stack.
    fn flatten(self) -> RawDocument {
        let mut segments: Vec<String> = self.body.into_iter().collect();
        segments.extend(self.segments);

        let mut stack: Vec<InputSection> = self.sections.into_iter().rev().collect();
        while let Some(section) = stack.pop() {
            segments.extend(section.annotation);
            segments.extend(section.title);
            segments.extend(section.paragraphs);
            stack.extend(section.sections.into_iter().rev());
        }
        RawDocument { title: self.title, segments }
    }
}

impl DocumentProvider for InputDoc {
    fn provide(self) -> Result<RawDocument> { Ok(self.flatten()) }
}

/// Plain text file: the first non-blank line is the title, every further
/// non-blank line is a body segment.
#[derive(Debug, Clone)]
pub struct TextFile {
    pub path: PathBuf,
}

impl DocumentProvider for TextFile {
    fn provide(self) -> Result<RawDocument> {
        let origin = self.path.display().to_string();
        let text = fs::read_to_string(&self.path).map_err(|e| Error::invalid_document(&origin, e.to_string()))?;
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let title = lines.next().ok_or_else(|| Error::invalid_document(&origin, "file has no title line"))?;
        Ok(RawDocument::new(title, lines))
    }
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub corpus: Corpus,
    /// Documents or files that were skipped, with the reason.
    pub skipped: Vec<(String, String)>,
}

impl LoadOutcome {
    fn add<P: DocumentProvider>(&mut self, provider: P) {
        if let Err(err) = self.corpus.add(provider) {
            self.skip(err);
        }
    }

    fn skip(&mut self, err: Error) {
        tracing::warn!(error = %err, "skipping document");
        let (origin, reason) = match err {
            Error::InvalidDocument { origin, reason } => (origin, reason),
            other => (String::new(), other.to_string()),
        };
        self.skipped.push((origin, reason));
    }
}

fn is_supported(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("txt" | "json" | "jsonl"))
}

/// Supported files under `input`, sorted by path so ids are stable.
pub fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(Error::Io {
            path: input.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        });
    }
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    let files = WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported(e.path()))
        .map(|e| e.into_path())
        .collect();
    Ok(files)
}

/// Load every supported document under `input` into a fresh corpus.
pub fn load_corpus<P: AsRef<Path>>(input: P) -> Result<LoadOutcome> {
    let mut outcome = LoadOutcome::default();
    for file in collect_files(input.as_ref())? {
        match file.extension().and_then(|s| s.to_str()) {
            Some("jsonl") => load_jsonl(&file, &mut outcome),
            Some("json") => load_json(&file, &mut outcome),
            _ => outcome.add(TextFile { path: file }),
        }
    }
    tracing::info!(documents = outcome.corpus.len(), skipped = outcome.skipped.len(), "corpus loaded");
    Ok(outcome)
}

fn load_jsonl(file: &Path, outcome: &mut LoadOutcome) {
    let origin = file.display().to_string();
    let f = match File::open(file) {
        Ok(f) => f,
        Err(e) => return outcome.skip(Error::invalid_document(origin, e.to_string())),
    };
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => return outcome.skip(Error::invalid_document(format!("{origin}:{}", lineno + 1), e.to_string())),
        };
        if line.trim().is_empty() { continue; }
        match serde_json::from_str::<InputDoc>(&line) {
            Ok(doc) => outcome.add(doc),
            Err(e) => outcome.skip(Error::invalid_document(format!("{origin}:{}", lineno + 1), e.to_string())),
        }
    }
}

fn load_json(file: &Path, outcome: &mut LoadOutcome) {
    let origin = file.display().to_string();
    let parsed = File::open(file)
        .map_err(|e| e.to_string())
        .and_then(|f| serde_json::from_reader::<_, serde_json::Value>(BufReader::new(f)).map_err(|e| e.to_string()));
    let json = match parsed {
        Ok(v) => v,
        Err(reason) => return outcome.skip(Error::invalid_document(origin, reason)),
    };
    let values = match json {
        serde_json::Value::Array(arr) => arr,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => return outcome.skip(Error::invalid_document(origin, "expected a document object or an array")),
    };
    for (i, v) in values.into_iter().enumerate() {
        match serde_json::from_value::<InputDoc>(v) {
            Ok(doc) => outcome.add(doc),
            Err(e) => outcome.skip(Error::invalid_document(format!("{origin}[{i}]"), e.to_string())),
        }
    }
}
