// Clippy allows for the whole crate
#![allow(clippy::should_implement_trait)]

//! mutperiod: mutation periodicity around nucleosomes
//!
//! Data preparation and orchestration for studying how mutations are
//! distributed relative to nucleosome dyads.
//!
//! # Features
//!
//! - **Overlap counting**: a single merge sweep over two sorted bed files
//!   counting how many feature ranges contain each position
//! - **Map stratification**: nucleosome maps narrowed to the dyads inside a
//!   set of feature ranges, jobs run in parallel with Rayon
//! - **Dataset converters**: Kucab compendium substitutions and UVDE-seq
//!   lesions to sorted, context-annotated bed files
//! - **Analysis orchestration**: the counting and normalization stages driven
//!   from one explicit configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use mutperiod::commands::{OverlapCountCommand, StratifiedRewriter};
//! use mutperiod::bed::BedReader;
//!
//! let (counts, _stats) = OverlapCountCommand::new()
//!     .count_files("features.bed", "nucleosome_map.bed")
//!     .unwrap();
//!
//! let original = BedReader::from_path("nucleosome_map.bed").unwrap().positions();
//! let mut stratified = Vec::new();
//! StratifiedRewriter::new()
//!     .rewrite_counts(original, &counts, &mut stratified)
//!     .unwrap();
//! ```

pub mod bed;
pub mod commands;
pub mod config;
pub mod discover;
pub mod interval;
pub mod sequence;
pub mod streaming;

// Re-export commonly used types
pub use bed::{read_intervals, read_positions, BedError, BedReader};
pub use config::{AnalysisConfig, NormalizationMethod};
pub use interval::{EncompassingInterval, PositionId, PositionRecord, Strand};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bed::{read_intervals, read_positions, BedError, BedReader};
    pub use crate::commands::{
        run_analysis_suite, AnalysisStages, KucabCommand, OverlapCountCommand, SortCommand,
        StratifiedRewriter, StratifyCommand, UvdeCommand,
    };
    pub use crate::config::{AnalysisConfig, NormalizationMethod};
    pub use crate::interval::{EncompassingInterval, PositionId, PositionRecord, Strand};
}
