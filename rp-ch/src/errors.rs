//! Error taxonomy of the preprocessor.
//!
//! Every variant is fatal for the run that raised it: settings and graph errors are caught before
//! the first round, the other two abort mid-run because later rounds build on earlier ones.
use rp_core::err_impl;

err_impl! {
    /// Everything that can abort a preprocessing run.
    ContractionError,
    /// A setting is out of range.
    #[error("invalid preprocessor settings: {0}")]
    InvalidSettings(String),

    /// The graph references something that does not exist or carries an impossible value.
    #[error("inconsistent graph: {0}")]
    GraphConsistency(String),

    /// A round found no vertex to contract; carries the number of vertices left.
    #[error("no independent vertex found while {0} vertices remain unprocessed")]
    NonConvergence(usize),

    /// Internal bookkeeping went wrong, e.g. a vertex contracted twice.
    #[error("contraction invariant violated: {0}")]
    InvariantViolation(String),
}
