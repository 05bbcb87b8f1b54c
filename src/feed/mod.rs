// src/feed/mod.rs

//! Reading the Bureau's précis forecast products.
//!
//! [`parser`] turns raw XML into a typed document, [`normalize`] turns that
//! document into forecast records keyed for storage.

pub mod normalize;
pub mod parser;

pub use normalize::{NormalizedPeriod, RecordNormalizer, parse_feed_time};
pub use parser::{ProductDocument, parse_product, read_product};
