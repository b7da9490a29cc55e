//! Page acquisition and trend extraction.
//!
//! - [`fetch`]: one GET of the source page, charset-aware
//! - [`dom`]: the [`dom::DocumentTree`] abstraction and its `scraper` backing
//! - [`extract`]: the longest-list heuristic (plus optional landmark fallback)
//! - [`trend`]: [`trend::RawDocument`], [`trend::TrendEntry`], [`trend::TrendList`]

pub mod dom;
pub mod extract;
pub mod fetch;
pub mod trend;

pub use extract::{Landmarks, TrendExtractor};
pub use fetch::{PageFetcher, SourcePage};
pub use trend::{RawDocument, TrendEntry, TrendList};
