//! Error type for the puzzle core.

use thiserror::Error;

use crate::grid::Rank;

/// Errors reported at the configuration boundary of the puzzle core.
///
/// Geometry queries never fail: a ray that misses everything is simply `None`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Grid rank outside the supported range.
    #[error("unsupported grid rank {rank}; expected {min}..={max}", min = Rank::MIN, max = Rank::MAX)]
    InvalidRank { rank: usize },
    /// A configuration value that would produce a degenerate grid or camera.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
