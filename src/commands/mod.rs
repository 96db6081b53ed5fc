//! Command implementations for mutperiod.

pub mod analysis;
pub mod kucab;
pub mod overlap_count;
pub mod sort;
pub mod stratify;
pub mod uvde;

pub use crate::streaming::{verify_sorted, SortValidator};
pub use analysis::{
    run_analysis_suite, AnalysisReport, AnalysisStages, NormalizationRequest, PlannedStage,
    PlannedStages,
};
pub use kucab::KucabCommand;
pub use overlap_count::{OverlapCount, OverlapCountCommand, OverlapCountStats};
pub use sort::SortCommand;
pub use stratify::{
    read_counts_table, StratificationJob, StratificationOutcome, StratifiedRewriter,
    StratifyCommand,
};
pub use uvde::UvdeCommand;
