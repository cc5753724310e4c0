pub mod normalizer;
pub mod scorer;
pub mod tokenizer;

pub use normalizer::normalize;
pub use scorer::AnomalyScorer;
pub use tokenizer::{tokenize_event, tokenize_sequence};
