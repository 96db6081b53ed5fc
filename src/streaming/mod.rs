//! Shared streaming components.
//!
//! This module provides the pieces the streaming commands are built from:
//! - Zero-allocation bed field parsing
//! - Sort validation
//! - Buffered output formatting
//! - Active set of interval ends ordered for expiry
//!
//! The overlap sweep keeps O(k) memory where k = max overlapping intervals.

pub mod active_set;
pub mod buffers;
pub mod output;
pub mod parsing;
pub mod validation;

pub use active_set::ActiveSet;
pub use output::BedWriter;
pub use parsing::{parse_bed_key, parse_u64_fast, should_skip_line, tab_fields};
pub use validation::{verify_sorted, SortValidator};
