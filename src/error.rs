//! Structured error types for banded alignment.
//!
//! Every variant except `Io` is a precondition violation or an internal
//! consistency failure. None of them carry partial results.

use thiserror::Error;

/// Unified error type for all ferrous-dband operations.
#[derive(Debug, Error)]
pub enum DbandError {
    /// Gap penalties are magnitudes: both strictly positive, sum at most MAX_GAP_COST
    #[error(
        "gap penalties must be > 0 with opening+extension <= {max}, got opening={gap_opening} extension={gap_extension}",
        max = crate::defaults::MAX_GAP_COST
    )]
    InvalidGapPenalty { gap_opening: i32, gap_extension: i32 },

    /// The band does not contain an end-to-end path through the matrix
    #[error(
        "invalid band [{left_dist},{right_dist}] for ulen={ulen} vlen={vlen}: \
         need -ulen <= left_dist <= min(0,vlen-ulen) and max(0,vlen-ulen) <= right_dist <= vlen"
    )]
    InvalidBand {
        left_dist: i64,
        right_dist: i64,
        ulen: usize,
        vlen: usize,
    },

    /// Sentinel too close to i32::MIN to survive being summed with real scores
    #[error("sentinel score {sentinel} is not in (i32::MIN/2, 0)")]
    SentinelOverflow { sentinel: i64 },

    /// Sentinel not below every real path score, so out-of-band cells could win
    #[error("sentinel score {sentinel} must be <= {required} for these sequences and scores")]
    WeakSentinel { sentinel: i32, required: i32 },

    /// Exactly one of the two sequences is empty; no alignment ends on a substitution edge
    #[error("cannot align an empty sequence against one of length {other_len}")]
    EmptySequence { other_len: usize },

    /// The adaptive driver reached the full matrix without meeting its terminal condition
    #[error("band spans the full matrix but score {score} does not satisfy expected score {expected:?}")]
    BandExhausted { score: i32, expected: Option<i32> },

    /// Traceback reached a cell whose backpointer was never written
    #[error("traceback reached undefined edge at cell ({i},{j})")]
    CorruptTraceback { i: usize, j: usize },

    /// Edit operations do not consume the given sequences exactly
    #[error("edit operations consume ({aligned_u},{aligned_v}) but sequences have lengths ({ulen},{vlen})")]
    LengthMismatch {
        aligned_u: usize,
        aligned_v: usize,
        ulen: usize,
        vlen: usize,
    },

    /// Edit operation disagrees with the symbols it claims to align
    #[error("edit operation at u[{upos}], v[{vpos}] disagrees with the aligned symbols")]
    InconsistentOperation { upos: usize, vpos: usize },

    /// Malformed CIGAR string
    #[error("invalid CIGAR: {0}")]
    InvalidCigar(String),

    /// Malformed substitution score table
    #[error("invalid score model: {0}")]
    InvalidScoreModel(String),

    /// I/O error (file not found, malformed FASTA, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DbandError>;
