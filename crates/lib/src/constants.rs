//! Constants used throughout the Quantum library.
//!
//! Default configuration values and the member names of the part hierarchy
//! conventions.

/// Number of node registrations between two automatic garbage sweeps of the
/// identity registry.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 256;

/// Default number of operations kept on an undo stack.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Default name of the back-link member from a part to its parent part.
pub const PARENT_MEMBER: &str = "Parent";

/// Default name of the member holding the child parts of a part.
pub const CHILDREN_MEMBER: &str = "Children";
