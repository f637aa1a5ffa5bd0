//! Normalizes notice records from a watchlist-style listing feed into a flat,
//! index-keyed collection.
//!
//! The core is [`normalize`]: it takes already-fetched notices and returns a
//! [`NormalizedCollection`]. Loading files and writing results live in
//! [`loader`] and [`output`] and are only used by the binary.

pub mod config;
pub mod error;
pub mod links;
pub mod loader;
pub mod model;
pub mod normalizer;
pub mod output;

pub use config::{KeyPolicy, NormalizerConfig};
pub use error::NormalizeError;
pub use links::{LinkSet, LinksError, RawLinks};
pub use model::{NormalizedCollection, NormalizedRecord, RawNotice};
pub use normalizer::{NormalizeReport, normalize, normalize_lenient, normalize_values};
