pub mod analysis;
pub mod charts;
pub mod config;
pub mod data;
pub mod logging;
pub mod types;

pub use analysis::normalizer::ValueNormalizer;
pub use analysis::price_index::{IndexError, PriceIndexTable};
pub use types::{RoundingMode, UnknownPolicy, Year};
