//! Error surface for the synthesis engine.
//!
//! The original engine reports failures as a single boolean and never lets
//! an exception escape a driver call; `EngineError` keeps that same flat,
//! four-kind surface but expresses it as a proper `Result` so call sites
//! get `?` instead of checking a bool.

use thiserror::Error;

/// The four failure kinds the core can report. No partial mutation of the
/// output frame happens on any of these: the final frame is only written
/// once the finest-level optimizer has converged.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Dimensions disagree between frame/mask/filter, the channel count is
    /// outside 1..=4, the mask has no target pixels, or a homography is
    /// non-invertible.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Allocation of a pyramid level failed.
    #[error("resource exhaustion while allocating a pyramid level")]
    ResourceExhaustion,

    /// A pyramid level shrank below one pixel. The driver handles this
    /// internally by truncating the pyramid; this variant only escapes to
    /// the caller when truncation leaves no usable level at all.
    #[error("pyramid degenerated: no level with a non-empty target region")]
    NumericDegenerate,

    /// The caller's should-stop flag was observed set.
    #[error("synthesis cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, EngineError>;
