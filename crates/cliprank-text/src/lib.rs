//! Pure text analysis for window scoring.
//!
//! Everything here is deterministic given its inputs: identical window
//! texts produce bit-identical feature values on every run. No I/O, no
//! randomness, no model downloads — the embedding extractor uses a hashed
//! character-ngram embedding instead of a learned one.

pub mod density;
pub mod features;
pub mod filler;
pub mod idf;
pub mod keyphrase;
pub mod stopwords;
pub mod tokenize;

pub use density::density_score;
pub use features::{compute_features, compute_features_parallel};
pub use filler::filler_ratio;
pub use idf::CorpusStats;
pub use keyphrase::extract_keyphrases;
pub use stopwords::is_stopword;
pub use tokenize::words;
