use crate::config::AnalyzerConfig;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[A-Za-z]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Turns raw text into index terms. The same analyzer normalizes query terms so
/// both sides of a lookup agree.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self { Self { config } }

    pub fn config(&self) -> &AnalyzerConfig { &self.config }

    /// Tokenize text into terms: NFKC normalization, maximal runs of ASCII
    /// letters, lowercase, length cap, then optional stopword removal and stemming.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>();
        WORD.find_iter(&normalized)
            .filter_map(|m| self.normalize_term(m.as_str()))
            .collect()
    }

    /// Normalize a single alphabetic word. Returns `None` when the word is
    /// filtered out (too long or a stopword).
    pub fn normalize_term(&self, word: &str) -> Option<String> {
        let term = word.to_ascii_lowercase();
        if term.is_empty() || term.len() > self.config.max_term_len { return None; }
        if self.config.stopwords && is_stopword(&term) { return None; }
        if self.config.stem {
            return Some(STEMMER.stem(&term).into_owned());
        }
        Some(term)
    }
}

/// Tokenize with the default analyzer (no stemming, no stopwords, 20 character cap).
pub fn tokenize(text: &str) -> Vec<String> {
    Analyzer::default().tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_non_letters() {
        assert_eq!(tokenize("Hello, world42foo_bar"), vec!["hello", "world", "foo", "bar"]);
    }

    #[test]
    fn drops_overlong_terms() {
        let twenty = "a".repeat(20);
        let text = format!("{twenty} {}", "b".repeat(21));
        assert_eq!(tokenize(&text), vec![twenty]);
    }

    #[test]
    fn stems_when_enabled() {
        let analyzer = Analyzer::new(AnalyzerConfig { stem: true, ..AnalyzerConfig::default() });
        let t = analyzer.tokenize("Running runs");
        assert!(t.iter().all(|w| w == "run"));
    }
}
