use hornet::core::config::SearchConfig;
use hornet::core::error::ErrorKind;
use hornet::index::builder::{Document, SegmentBuilder};
use hornet::index::segment::IndexReader;
use hornet::index::term::Term;
use hornet::index::terms::TermsEnum;
use hornet::query::boolean::{BooleanQuery, Occur};
use hornet::query::constant::{ConstantInner, ConstantScoreQuery};
use hornet::query::dismax::DisjunctionMaxQuery;
use hornet::query::fuzzy::FuzzyQuery;
use hornet::query::more_like_this::MoreLikeThisQuery;
use hornet::query::multi_term::{MultiTermQuery, RewriteMethod};
use hornet::query::numeric::NumericRangeQuery;
use hornet::query::phrase::{MultiPhraseQuery, PhraseQuery};
use hornet::query::prefix::PrefixQuery;
use hornet::query::term_query::TermQuery;
use hornet::query::Query;
use hornet::search::searcher::IndexSearcher;

fn searcher_of(texts: &[&str]) -> IndexSearcher {
    let mut builder = SegmentBuilder::new();
    for text in texts {
        builder.add(Document::new().text("body", text));
    }
    IndexSearcher::new(IndexReader::new(vec![builder.build().unwrap()]))
}

fn term(text: &str) -> Query {
    Query::Term(TermQuery::new(Term::new("body", text)))
}

fn doc_ids(searcher: &IndexSearcher, query: &Query) -> Vec<i32> {
    let mut ids: Vec<i32> = searcher
        .search(query, 100)
        .unwrap()
        .hits
        .iter()
        .map(|h| h.doc_id)
        .collect();
    ids.sort_unstable();
    ids
}

#[test]
fn term_query_finds_matching_docs() {
    let searcher = searcher_of(&["quick brown fox", "lazy dog", "the quick dog"]);
    assert_eq!(doc_ids(&searcher, &term("quick")), vec![0, 2]);
    assert_eq!(doc_ids(&searcher, &term("missing")), Vec::<i32>::new());
}

#[test]
fn term_frequency_raises_the_score() {
    let searcher = searcher_of(&["apple apple apple pear", "apple pear pear pear"]);
    let results = searcher.search(&term("apple"), 10).unwrap();
    assert_eq!(results.hits.len(), 2);
    assert_eq!(results.hits[0].doc_id, 0, "higher tf must rank first");
    assert!(results.hits[0].score > results.hits[1].score);
}

#[test]
fn boolean_must_and_must_not() {
    let searcher = searcher_of(&["cat dog", "cat bird", "dog bird", "cat dog bird"]);
    let mut bq = BooleanQuery::new(searcher.config());
    bq.add(term("cat"), Occur::Must).unwrap();
    bq.add(term("dog"), Occur::Must).unwrap();
    bq.add(term("bird"), Occur::MustNot).unwrap();
    assert_eq!(doc_ids(&searcher, &Query::Boolean(bq)), vec![0]);
}

#[test]
fn boolean_should_is_a_union() {
    let searcher = searcher_of(&["cat", "dog", "bird"]);
    let mut bq = BooleanQuery::new(searcher.config());
    bq.add(term("cat"), Occur::Should).unwrap();
    bq.add(term("dog"), Occur::Should).unwrap();
    assert_eq!(doc_ids(&searcher, &Query::Boolean(bq)), vec![0, 1]);
}

#[test]
fn min_should_match_prunes_weak_unions() {
    let searcher = searcher_of(&["cat dog", "cat", "dog", "cat dog bird"]);
    let mut bq = BooleanQuery::new(searcher.config());
    bq.add(term("cat"), Occur::Should).unwrap();
    bq.add(term("dog"), Occur::Should).unwrap();
    bq.add(term("bird"), Occur::Should).unwrap();
    bq.set_min_should_match(2);
    assert_eq!(doc_ids(&searcher, &Query::Boolean(bq)), vec![0, 3]);
}

#[test]
fn coord_rewards_matching_more_clauses() {
    let searcher = searcher_of(&["cat dog extra", "cat filler filler"]);
    let mut bq = BooleanQuery::new(searcher.config());
    bq.add(term("cat"), Occur::Should).unwrap();
    bq.add(term("dog"), Occur::Should).unwrap();
    let results = searcher.search(&Query::Boolean(bq), 10).unwrap();
    assert_eq!(results.hits[0].doc_id, 0, "two matched clauses beat one");
    assert!(results.hits[0].score > results.hits[1].score);
}

#[test]
fn disable_coord_removes_the_overlap_penalty() {
    // One doc matching one of two equally selective clauses: with coord the
    // score halves, without it the clause score stands.
    let searcher = searcher_of(&["cat", "dog"]);
    let mut with_coord = BooleanQuery::new(searcher.config());
    with_coord.add(term("cat"), Occur::Should).unwrap();
    with_coord.add(term("dog"), Occur::Should).unwrap();
    let mut without = with_coord.clone();
    without.disable_coord = true;

    let coord_score = searcher
        .search(&Query::Boolean(with_coord), 10)
        .unwrap()
        .max_score;
    let plain_score = searcher
        .search(&Query::Boolean(without), 10)
        .unwrap()
        .max_score;
    assert!(
        coord_score < plain_score,
        "coord must shrink a partial match: {coord_score} vs {plain_score}"
    );
}

#[test]
fn clause_limit_is_enforced() {
    let config = SearchConfig::default();
    let mut bq = BooleanQuery::new(&config);
    for i in 0..config.max_clause_count {
        bq.add(term(&format!("t{i}")), Occur::Should).unwrap();
    }
    let err = bq.add(term("overflow"), Occur::Should).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TooManyClauses);
}

#[test]
fn single_clause_boolean_collapses_on_rewrite() {
    let searcher = searcher_of(&["cat"]);
    let mut bq = BooleanQuery::new(searcher.config());
    bq.add(
        Query::Term(TermQuery::new(Term::new("body", "cat")).with_boost(2.0)),
        Occur::Should,
    )
    .unwrap();
    bq.boost = 3.0;
    let rewritten = searcher.rewrite(&Query::Boolean(bq)).unwrap();
    match rewritten {
        Query::Term(tq) => assert!((tq.boost - 6.0).abs() < 1e-6, "boosts must multiply"),
        other => panic!("expected a term query, got {other:?}"),
    }
}

#[test]
fn exact_phrase_requires_adjacency() {
    let searcher = searcher_of(&[
        "the quick brown fox",
        "the brown quick fox",
        "quick and also brown",
    ]);
    let mut pq = PhraseQuery::new("body");
    pq.add_term("quick");
    pq.add_term("brown");
    assert_eq!(doc_ids(&searcher, &Query::Phrase(pq)), vec![0]);
}

#[test]
fn exact_phrase_with_repeated_term() {
    let searcher = searcher_of(&["a b a", "a b c", "b a b"]);
    let mut pq = PhraseQuery::new("body");
    pq.add_term("a");
    pq.add_term("b");
    pq.add_term("a");
    assert_eq!(doc_ids(&searcher, &Query::Phrase(pq)), vec![0]);
}

#[test]
fn sloppy_phrase_tolerates_distance() {
    let searcher = searcher_of(&["quick brown fox", "quick fox", "fox quick"]);
    let mut pq = PhraseQuery::new("body");
    pq.add_term("quick");
    pq.add_term("fox");
    let exact = doc_ids(&searcher, &Query::Phrase(pq.clone()));
    assert_eq!(exact, vec![1]);

    let sloppy = doc_ids(&searcher, &Query::Phrase(pq.clone().with_slop(1)));
    assert_eq!(sloppy, vec![0, 1], "slop 1 reaches across one gap");

    // transposition costs 2
    let sloppier = doc_ids(&searcher, &Query::Phrase(pq.with_slop(2)));
    assert_eq!(sloppier, vec![0, 1, 2]);
}

#[test]
fn sloppy_phrase_with_repeating_term() {
    let searcher = searcher_of(&["t u t v t", "t u v w"]);
    let mut pq = PhraseQuery::new("body");
    pq.add_term("t");
    pq.add_term("t");
    let hits = doc_ids(&searcher, &Query::Phrase(pq.with_slop(2)));
    assert_eq!(hits, vec![0], "both occurrences must be distinct tokens");
}

#[test]
fn closer_sloppy_matches_score_higher() {
    let searcher = searcher_of(&["quick fox", "quick brown fox"]);
    let mut pq = PhraseQuery::new("body");
    pq.add_term("quick");
    pq.add_term("fox");
    let results = searcher
        .search(&Query::Phrase(pq.with_slop(3)), 10)
        .unwrap();
    assert_eq!(results.hits.len(), 2);
    assert_eq!(results.hits[0].doc_id, 0, "tighter match must rank first");
}

#[test]
fn multi_phrase_accepts_alternatives() {
    let searcher = searcher_of(&["quick brown fox", "quick red fox", "quick slow fox"]);
    let mut mpq = MultiPhraseQuery::new("body");
    mpq.add(&["quick"]).unwrap();
    mpq.add(&["brown", "red"]).unwrap();
    mpq.add(&["fox"]).unwrap();
    assert_eq!(doc_ids(&searcher, &Query::MultiPhrase(mpq)), vec![0, 1]);
}

#[test]
fn multi_phrase_repeated_term_across_alternative_slots() {
    // "a" repeats across both slots, and the first slot has alternatives,
    // so colliding slots must be staggered onto distinct tokens.
    let searcher = searcher_of(&["x a b a y", "a y", "a x x x a"]);
    let mut mpq = MultiPhraseQuery::new("body");
    mpq.add(&["a", "b"]).unwrap();
    mpq.add(&["a"]).unwrap();
    let q = Query::MultiPhrase(mpq.with_slop(1));
    assert_eq!(doc_ids(&searcher, &q), vec![0]);
}

#[test]
fn phrase_on_positionless_field_is_an_error() {
    let mut builder = SegmentBuilder::new();
    builder.add(Document::new().i64("price", 10));
    let searcher = IndexSearcher::new(IndexReader::new(vec![builder.build().unwrap()]));
    let mut pq = PhraseQuery::new("price");
    pq.add_term("a");
    pq.add_term("b");
    let err = searcher.search(&Query::Phrase(pq), 10).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
    assert!(err.context.contains("price"), "error must name the field");
}

#[test]
fn phrase_with_unknown_term_matches_nothing() {
    let searcher = searcher_of(&["quick brown fox"]);
    let mut pq = PhraseQuery::new("body");
    pq.add_term("quick");
    pq.add_term("unicorn");
    assert_eq!(doc_ids(&searcher, &Query::Phrase(pq)), Vec::<i32>::new());
}

#[test]
fn fuzzy_query_expands_to_near_terms() {
    let searcher = searcher_of(&["quick", "quack", "brick", "zzzzz"]);
    let one_edit = FuzzyQuery::new(Term::new("body", "quick"), 1, 0).unwrap();
    assert_eq!(doc_ids(&searcher, &Query::Fuzzy(one_edit)), vec![0, 1]);

    let two_edits = FuzzyQuery::new(Term::new("body", "quick"), 2, 0).unwrap();
    assert_eq!(doc_ids(&searcher, &Query::Fuzzy(two_edits)), vec![0, 1, 2]);
}

#[test]
fn fuzzy_ranks_closer_terms_higher() {
    let searcher = searcher_of(&["quick", "quack"]);
    let q = FuzzyQuery::new(Term::new("body", "quick"), 2, 0).unwrap();
    let results = searcher.search(&Query::Fuzzy(q), 10).unwrap();
    assert_eq!(results.hits.len(), 2);
    assert_eq!(results.hits[0].doc_id, 0, "exact term must outrank an edit");
}

#[test]
fn fuzzy_prefix_is_mandatory() {
    let searcher = searcher_of(&["quick", "slick"]);
    // one edit apart overall, but the first two characters must match
    let q = FuzzyQuery::new(Term::new("body", "quick"), 2, 2).unwrap();
    assert_eq!(doc_ids(&searcher, &Query::Fuzzy(q)), vec![0]);
}

#[test]
fn fuzzy_rejects_large_edit_distances() {
    let err = FuzzyQuery::new(Term::new("body", "x"), 3, 0).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}

#[test]
fn fuzzy_rejects_prefix_longer_than_term() {
    let err = FuzzyQuery::new(Term::new("body", "fox"), 1, 4).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}

#[test]
fn fuzzy_expansion_cap_keeps_the_best_terms() {
    let searcher = searcher_of(&["quick", "quack", "quirk"]);
    let q = FuzzyQuery::new(Term::new("body", "quick"), 2, 0)
        .unwrap()
        .with_max_expansions(1);
    // only the distance-0 term survives the queue
    assert_eq!(doc_ids(&searcher, &Query::Fuzzy(q)), vec![0]);
}

fn numeric_searcher(values: &[i64]) -> IndexSearcher {
    let mut builder = SegmentBuilder::new();
    for &v in values {
        builder.add(Document::new().i64("price", v));
    }
    IndexSearcher::new(IndexReader::new(vec![builder.build().unwrap()]))
}

#[test]
fn numeric_range_respects_inclusivity() {
    let values: Vec<i64> = (1..=20).collect();
    let searcher = numeric_searcher(&values);

    let inclusive = NumericRangeQuery::new_i64("price", 4, Some(5), Some(15), true, true).unwrap();
    assert_eq!(
        doc_ids(&searcher, &Query::NumericRange(inclusive)).len(),
        11
    );

    let exclusive =
        NumericRangeQuery::new_i64("price", 4, Some(5), Some(15), false, false).unwrap();
    assert_eq!(doc_ids(&searcher, &Query::NumericRange(exclusive)).len(), 9);
}

#[test]
fn numeric_range_handles_negatives_and_open_ends() {
    let searcher = numeric_searcher(&[-100, -5, 0, 5, 100]);
    let q = NumericRangeQuery::new_i64("price", 4, Some(-10), Some(10), true, true).unwrap();
    assert_eq!(doc_ids(&searcher, &Query::NumericRange(q)), vec![1, 2, 3]);

    let open_low = NumericRangeQuery::new_i64("price", 4, None, Some(0), true, true).unwrap();
    assert_eq!(
        doc_ids(&searcher, &Query::NumericRange(open_low)),
        vec![0, 1, 2]
    );
}

#[test]
fn numeric_range_over_doubles() {
    let mut builder = SegmentBuilder::new();
    for v in [-2.5f64, 0.0, 1.25, 3.75, 10.0] {
        builder.add(Document::new().f64("weight", v));
    }
    let searcher = IndexSearcher::new(IndexReader::new(vec![builder.build().unwrap()]));
    let q = NumericRangeQuery::new_f64("weight", 4, Some(0.0), Some(4.0), true, true).unwrap();
    assert_eq!(doc_ids(&searcher, &Query::NumericRange(q)), vec![1, 2, 3]);
}

#[test]
fn empty_numeric_range_matches_nothing() {
    let searcher = numeric_searcher(&[1, 2, 3]);
    let q = NumericRangeQuery::new_i64("price", 4, Some(10), Some(5), true, true).unwrap();
    assert_eq!(
        doc_ids(&searcher, &Query::NumericRange(q)),
        Vec::<i32>::new()
    );
}

#[test]
fn numeric_range_is_exact_at_any_precision_step() {
    let values: Vec<i64> = (-3..=20).collect();
    let expected: Vec<i32> = (3..=13).collect();
    for step in [1u32, 2, 8] {
        let mut builder = SegmentBuilder::new();
        builder.set_precision_step("price", step);
        for &v in &values {
            builder.add(Document::new().i64("price", v));
        }
        let searcher = IndexSearcher::new(IndexReader::new(vec![builder.build().unwrap()]));
        let q = NumericRangeQuery::new_i64("price", step, Some(0), Some(10), true, true).unwrap();
        assert_eq!(
            doc_ids(&searcher, &Query::NumericRange(q)),
            expected,
            "step {step} changed the matched doc set"
        );
    }

    let mut builder = SegmentBuilder::new();
    builder.set_precision_step("weight", 8);
    for v in [-2.5f64, 0.0, 1.25, 3.75, 10.0] {
        builder.add(Document::new().f64("weight", v));
    }
    let searcher = IndexSearcher::new(IndexReader::new(vec![builder.build().unwrap()]));
    let q = NumericRangeQuery::new_f64("weight", 8, Some(0.0), Some(4.0), true, true).unwrap();
    assert_eq!(doc_ids(&searcher, &Query::NumericRange(q)), vec![1, 2, 3]);
}

#[test]
fn constant_score_flattens_all_hits() {
    let searcher = searcher_of(&["apple apple apple", "apple", "pear"]);
    let q = Query::ConstantScore(ConstantScoreQuery::from_query(term("apple")));
    let results = searcher.search(&q, 10).unwrap();
    assert_eq!(results.hits.len(), 2);
    assert!(
        (results.hits[0].score - results.hits[1].score).abs() < 1e-6,
        "term frequency must not leak into a constant score"
    );
}

#[test]
fn prefix_query_matches_the_block() {
    let searcher = searcher_of(&["car", "cart", "care", "dog"]);
    let q = Query::Prefix(PrefixQuery::new("body", "car"));
    assert_eq!(doc_ids(&searcher, &q), vec![0, 1, 2]);
}

#[test]
fn auto_rewrite_falls_back_to_a_filter_past_the_term_cutoff() {
    let searcher = searcher_of(&["apple", "apricot", "april", "banana"]);
    let q = Query::Prefix(PrefixQuery::new("body", "ap").with_rewrite_method(
        RewriteMethod::ConstantScoreAuto {
            term_cutoff: 2,
            doc_fraction: 1.0,
        },
    ));
    let Query::ConstantScore(cs) = searcher.rewrite(&q).unwrap() else {
        panic!("expected a constant score rewrite");
    };
    assert!(
        matches!(cs.inner, ConstantInner::Filter(_)),
        "three expanding terms must cross a two-term cutoff"
    );
    assert_eq!(doc_ids(&searcher, &q), vec![0, 1, 2]);
}

#[test]
fn auto_rewrite_falls_back_to_a_filter_past_the_doc_cutoff() {
    // 0.1% of three docs truncates to zero visited docs, so the first
    // term already crosses the default cutoff.
    let searcher = searcher_of(&["apple", "apricot", "banana"]);
    let q = Query::Prefix(PrefixQuery::new("body", "ap"));
    let Query::ConstantScore(cs) = searcher.rewrite(&q).unwrap() else {
        panic!("expected a constant score rewrite");
    };
    assert!(matches!(cs.inner, ConstantInner::Filter(_)));
    assert_eq!(doc_ids(&searcher, &q), vec![0, 1]);
}

#[test]
fn auto_rewrite_expands_while_below_the_cutoffs() {
    let searcher = searcher_of(&["apple", "apricot", "banana"]);
    let q = Query::Prefix(PrefixQuery::new("body", "ap").with_rewrite_method(
        RewriteMethod::ConstantScoreAuto {
            term_cutoff: 10,
            doc_fraction: 1.0,
        },
    ));
    let Query::ConstantScore(cs) = searcher.rewrite(&q).unwrap() else {
        panic!("expected a constant score rewrite");
    };
    assert!(
        matches!(cs.inner, ConstantInner::Query(_)),
        "two terms must stay a boolean expansion"
    );
    assert_eq!(doc_ids(&searcher, &q), vec![0, 1]);
}

#[test]
fn dismax_takes_the_best_disjunct() {
    let mut builder = SegmentBuilder::new();
    builder.add(
        Document::new()
            .text("title", "rust search")
            .text("body", "rust library for search"),
    );
    builder.add(Document::new().text("body", "search only in body"));
    let searcher = IndexSearcher::new(IndexReader::new(vec![builder.build().unwrap()]));

    let mut plain = DisjunctionMaxQuery::new(0.0);
    plain.add(Query::Term(TermQuery::new(Term::new("title", "search"))));
    plain.add(Query::Term(TermQuery::new(Term::new("body", "search"))));
    let mut tie = plain.clone();
    tie.tie_breaker = 0.5;

    let plain_results = searcher.search(&Query::DisjunctionMax(plain), 10).unwrap();
    let tie_results = searcher.search(&Query::DisjunctionMax(tie), 10).unwrap();
    assert_eq!(plain_results.hits[0].doc_id, 0);
    assert!(
        tie_results.hits[0].score > plain_results.hits[0].score,
        "tie breaker must add the lesser disjunct"
    );
}

#[test]
fn match_all_respects_deletes() {
    let mut builder = SegmentBuilder::new();
    builder.add(Document::new().text("body", "one"));
    builder.add(Document::new().text("body", "two"));
    builder.add(Document::new().text("body", "three"));
    builder.delete_doc(1);
    let searcher = IndexSearcher::new(IndexReader::new(vec![builder.build().unwrap()]));
    let q = Query::MatchAll(hornet::query::MatchAllQuery::new());
    assert_eq!(doc_ids(&searcher, &q), vec![0, 2]);
}

#[test]
fn deleted_docs_never_match_terms() {
    let mut builder = SegmentBuilder::new();
    builder.add(Document::new().text("body", "apple"));
    builder.add(Document::new().text("body", "apple"));
    builder.delete_doc(0);
    let searcher = IndexSearcher::new(IndexReader::new(vec![builder.build().unwrap()]));
    assert_eq!(doc_ids(&searcher, &term("apple")), vec![1]);
}

#[test]
fn multiple_segments_compose_doc_ids() {
    let mut first = SegmentBuilder::new();
    first.add(Document::new().text("body", "apple"));
    first.add(Document::new().text("body", "pear"));
    let mut second = SegmentBuilder::new();
    second.add(Document::new().text("body", "apple"));
    let reader = IndexReader::new(vec![first.build().unwrap(), second.build().unwrap()]);
    let searcher = IndexSearcher::new(reader);
    assert_eq!(doc_ids(&searcher, &term("apple")), vec![0, 2]);
}

#[test]
fn explanation_value_matches_the_score() {
    let searcher = searcher_of(&["quick brown fox", "quick dog", "lazy dog"]);
    let mut bq = BooleanQuery::new(searcher.config());
    bq.add(term("quick"), Occur::Should).unwrap();
    bq.add(term("dog"), Occur::Should).unwrap();
    let query = Query::Boolean(bq);

    let results = searcher.search(&query, 10).unwrap();
    assert!(!results.hits.is_empty());
    for hit in &results.hits {
        let explanation = searcher.explain(&query, hit.doc_id).unwrap();
        assert!(explanation.matched);
        assert!(
            (explanation.value - hit.score).abs() < 1e-5,
            "explain {} != score {} for doc {}",
            explanation.value,
            hit.score,
            hit.doc_id
        );
    }
}

#[test]
fn explanation_reports_prohibited_matches() {
    let searcher = searcher_of(&["cat dog"]);
    let mut bq = BooleanQuery::new(searcher.config());
    bq.add(term("cat"), Occur::Must).unwrap();
    bq.add(term("dog"), Occur::MustNot).unwrap();
    let e = searcher.explain(&Query::Boolean(bq), 0).unwrap();
    assert!(!e.matched);
}

#[test]
fn explanation_serializes_to_json() {
    let searcher = searcher_of(&["quick fox"]);
    let e = searcher.explain(&term("quick"), 0).unwrap();
    let json = e.to_json();
    assert!(json.contains("\"value\""));
    assert!(json.contains("\"details\""));
}

#[test]
fn more_like_this_builds_a_capped_boolean() {
    let texts = [
        "rust search engine engine engine",
        "rust search library",
        "cooking recipes",
        "rust compiler",
        "search ranking",
    ];
    let searcher = searcher_of(&texts);
    let mlt = MoreLikeThisQuery::new("body", "rust search engine engine")
        .with_min_term_freq(1)
        .with_min_doc_freq(1)
        .with_max_query_terms(2);
    let rewritten = searcher.rewrite(&Query::MoreLikeThis(mlt)).unwrap();
    match &rewritten {
        Query::Boolean(bq) => assert!(bq.clauses.len() <= 2, "term cap must hold"),
        // a one-term result collapses further
        Query::Term(_) => {}
        other => panic!("unexpected rewrite result {other:?}"),
    }
    let results = searcher.search(&rewritten, 10).unwrap();
    assert!(results.hits.iter().any(|h| h.doc_id == 0));
}

#[test]
fn filtered_terms_enum_refuses_to_seek() {
    let searcher = numeric_searcher(&[1, 2, 3]);
    let q = NumericRangeQuery::new_i64("price", 4, Some(1), Some(3), true, true).unwrap();
    let leaves = searcher.reader().leaves();
    let mut te = q.terms_enum(leaves[0].reader).unwrap().unwrap();
    let err = te.seek_ceil(b"anything").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedOperation);
}

#[test]
fn out_of_order_union_scores_match_explanations() {
    // SHOULD-only booleans run through the bucketed scorer; the explanation
    // path recomputes scores clause by clause, so agreement checks both.
    let searcher = searcher_of(&[
        "alpha beta",
        "alpha",
        "beta gamma",
        "gamma alpha beta",
        "delta",
    ]);
    let mut bq = BooleanQuery::new(searcher.config());
    bq.add(term("alpha"), Occur::Should).unwrap();
    bq.add(term("beta"), Occur::Should).unwrap();
    bq.add(term("gamma"), Occur::Should).unwrap();
    let query = Query::Boolean(bq);
    let results = searcher.search(&query, 10).unwrap();
    assert_eq!(results.hits.len(), 4);
    for hit in &results.hits {
        let e = searcher.explain(&query, hit.doc_id).unwrap();
        assert!(
            (e.value - hit.score).abs() < 1e-5,
            "bucketed score diverged for doc {}",
            hit.doc_id
        );
    }
}
