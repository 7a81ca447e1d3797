//! Cross-provider comparison: the same audio run through several converters.
//!
//! A provider whose conversion fails is recorded as a [`ProviderFailure`] and the rest of
//! the analysis continues. An unknown provider name fails the whole call up front.

pub mod consistency_analyzer;
pub mod memory_probe;
pub mod performance_benchmark;
pub mod provider_failure;
pub mod quality_comparator;
pub mod samples;

pub use consistency_analyzer::{ConsistencyAnalyzer, ConsistencyReport, PairwiseDiff, ProviderPair};
pub use performance_benchmark::{PerformanceBenchmark, PerformanceReport};
pub use provider_failure::ProviderFailure;
pub use quality_comparator::{QualityComparator, QualityReport};
pub use samples::ProviderSamples;
