pub mod core;
pub mod index;
pub mod query;
pub mod scoring;
pub mod search;

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                          HORNET STRUCT ARCHITECTURE                          │
└──────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────── QUERY LAYER ───────────────────────────────────┐
│                                                                              │
│  ┌─────────────────────────────────────────────────────────────────────┐    │
│  │                             enum Query                              │    │
│  │  Term | Boolean | Phrase | MultiPhrase | Fuzzy | NumericRange       │    │
│  │  Prefix | ConstantScore | Filtered | DisjunctionMax                 │    │
│  │  MoreLikeThis | MatchAll                                            │    │
│  └─────────────────────────────────────────────────────────────────────┘    │
│                                                                              │
│  rewrite(reader) to fixpoint: term-expanding queries (fuzzy, prefix,        │
│  numeric trie ranges, more-like-this) resolve into primitive queries        │
│  via a RewriteMethod (filter / scoring boolean / top-terms / auto).          │
└──────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────── WEIGHT LAYER ──────────────────────────────────┐
│                                                                              │
│  ┌─────────────────────────────────────────────────────────────────────┐    │
│  │                            enum Weight                               │    │
│  │  value_for_normalization() -> query_norm -> normalize(norm, boost)  │    │
│  │  scorer(segment, in_order, top_scorer, accept_docs)                 │    │
│  │  explain(segment, doc)                                              │    │
│  └─────────────────────────────────────────────────────────────────────┘    │
│                                                                              │
│  Term statistics are resolved once per weight (TermContext) and reused      │
│  by every per-segment scorer.                                               │
└──────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────── SCORER LAYER ──────────────────────────────────┐
│                                                                              │
│  TermScorer                 one posting list                                 │
│  ConjunctionTermScorer      all-required-terms leapfrog, rarest leads        │
│  ConjunctionScorer          general intersection                             │
│  DisjunctionSum/MaxScorer   heap-ordered unions                              │
│  BooleanScorer2             required - excluded + optional, coord table      │
│  BooleanScorer              bucketed out-of-order top scorer                 │
│  Exact/SloppyPhraseScorer   positional matching, repeat-aware slop           │
│                                                                              │
│  All scorers speak DocIdIterator: -1 before first next_doc,                  │
│  NO_MORE_DOCS after exhaustion, advance never moves backward.                │
└──────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────── INDEX LAYER ──────────────────────────────────┐
│                                                                              │
│  SegmentBuilder -> SegmentReader (fst term dict, postings w/ positions,     │
│  roaring live docs) -> IndexReader (doc-base composition) -> IndexSearcher  │
│  (rewrite + weight + TopKCollector -> SearchResults)                        │
└──────────────────────────────────────────────────────────────────────────────┘
*/
