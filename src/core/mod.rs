//! Core aggregation types.

mod aggregator;
mod builder;

pub use aggregator::ConfigAggregator;
pub use builder::AggregatorBuilder;
