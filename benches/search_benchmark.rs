use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::Rng;

use hornet::index::builder::{Document, SegmentBuilder};
use hornet::index::segment::IndexReader;
use hornet::index::term::Term;
use hornet::query::Query;
use hornet::query::boolean::{BooleanQuery, Occur};
use hornet::query::numeric::NumericRangeQuery;
use hornet::query::phrase::PhraseQuery;
use hornet::query::term_query::TermQuery;
use hornet::search::searcher::IndexSearcher;

const WORDS: [&str; 16] = [
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "search", "engine", "query",
    "score", "index", "term", "phrase", "boost",
];

fn build_searcher(doc_count: usize, words_per_doc: usize) -> IndexSearcher {
    let mut rng = rand::thread_rng();
    let mut builder = SegmentBuilder::new();
    for i in 0..doc_count {
        let body: String = (0..words_per_doc)
            .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
            .collect::<Vec<_>>()
            .join(" ");
        builder.add(
            Document::new()
                .text("body", &body)
                .i64("price", (i % 1000) as i64),
        );
    }
    let segment = builder.build().unwrap();
    IndexSearcher::new(IndexReader::new(vec![segment]))
}

fn bench_term_query(c: &mut Criterion) {
    let searcher = build_searcher(10_000, 40);
    let query = Query::Term(TermQuery::new(Term::new("body", "fox")));
    c.bench_function("term_query_top_10", |b| {
        b.iter(|| {
            let results = searcher.search(black_box(&query), 10).unwrap();
            black_box(results.total_hits);
        });
    });
}

fn bench_boolean_query(c: &mut Criterion) {
    let searcher = build_searcher(10_000, 40);
    let mut group = c.benchmark_group("boolean_query");
    for clause_count in [2usize, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(clause_count),
            &clause_count,
            |b, &clause_count| {
                let mut bq = BooleanQuery::new(searcher.config());
                for word in WORDS.iter().take(clause_count) {
                    bq.add(
                        Query::Term(TermQuery::new(Term::new("body", word))),
                        Occur::Should,
                    )
                    .unwrap();
                }
                let query = Query::Boolean(bq);
                b.iter(|| {
                    let results = searcher.search(black_box(&query), 10).unwrap();
                    black_box(results.total_hits);
                });
            },
        );
    }
    group.finish();
}

fn bench_phrase_query(c: &mut Criterion) {
    let searcher = build_searcher(10_000, 40);
    let mut group = c.benchmark_group("phrase_query");
    for slop in [0u32, 2] {
        group.bench_with_input(BenchmarkId::from_parameter(slop), &slop, |b, &slop| {
            let mut pq = PhraseQuery::new("body");
            pq.add_term("quick");
            pq.add_term("brown");
            let query = Query::Phrase(pq.with_slop(slop));
            b.iter(|| {
                let results = searcher.search(black_box(&query), 10).unwrap();
                black_box(results.total_hits);
            });
        });
    }
    group.finish();
}

fn bench_numeric_range(c: &mut Criterion) {
    let searcher = build_searcher(10_000, 10);
    let query = Query::NumericRange(
        NumericRangeQuery::new_i64("price", 4, Some(100), Some(400), true, true).unwrap(),
    );
    c.bench_function("numeric_range_top_10", |b| {
        b.iter(|| {
            let results = searcher.search(black_box(&query), 10).unwrap();
            black_box(results.total_hits);
        });
    });
}

criterion_group!(
    benches,
    bench_term_query,
    bench_boolean_query,
    bench_phrase_query,
    bench_numeric_range
);
criterion_main!(benches);
