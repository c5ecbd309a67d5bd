pub mod explanation;
pub mod similarity;
