//! Buffer size constants for streaming operations.

/// Default output buffer size (2 MB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Default input buffer size (256 KB).
/// Good balance for reading sorted bed files.
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Default line buffer capacity (1 KB).
/// Sufficient for most bed lines.
pub const DEFAULT_LINE_BUFFER: usize = 1024;

/// Initial capacity of the active interval set.
pub const DEFAULT_ACTIVE_CAPACITY: usize = 1024;
