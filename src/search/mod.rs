pub mod boolean_scorer;
pub mod collector;
pub mod conjunction;
pub mod disjunction;
pub mod exact_phrase;
pub mod phrase;
pub mod scorer;
pub mod searcher;
pub mod sloppy_phrase;
pub mod term_scorer;
