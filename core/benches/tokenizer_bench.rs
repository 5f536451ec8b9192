use clusterdex::tokenizer::{tokenize, Analyzer};
use clusterdex::AnalyzerConfig;
use criterion::{criterion_group, criterion_main, Criterion};

const TEXT: &str = "The leader follower scheme picks a random subset of documents as cluster \
centres and assigns every other document to the most similar centre with spare capacity. \
Queries then rank the centres first and only expand the most promising clusters.";

fn bench_tokenize(c: &mut Criterion) {
    let text = TEXT.repeat(50);
    c.bench_function("tokenize_plain", |b| b.iter(|| tokenize(&text)));
    let stemming = Analyzer::new(AnalyzerConfig { stem: true, stopwords: true, ..AnalyzerConfig::default() });
    c.bench_function("tokenize_stem_stopwords", |b| b.iter(|| stemming.tokenize(&text)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
