pub mod builder;
pub mod postings;
pub mod segment;
pub mod term;
pub mod terms;
