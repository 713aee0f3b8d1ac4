//! Substitution scores, gap costs and the sentinel used for cells outside
//! the band.

use crate::alignment::utils::NUCLEOTIDE_ALPHABET_SIZE;
use crate::defaults::MAX_GAP_COST;
use crate::error::{DbandError, Result};

/// Substitution scoring consumed by the DP core.
///
/// Symbols are small integer codes. A symbol is special (a wildcard) when
/// `is_special` says so; any pair involving a special symbol scores
/// `smallest_score()` instead of a table lookup.
pub trait ScoreModel {
    /// Table score for two non-special symbols.
    fn score(&self, a: u8, b: u8) -> i32;

    fn is_special(&self, c: u8) -> bool;

    /// Penalty applied to pairs involving a special symbol. Negative.
    fn smallest_score(&self) -> i32;

    /// Score of aligning `a` against `b`, specials included.
    #[inline]
    fn substitution(&self, a: u8, b: u8) -> i32 {
        if self.is_special(a) || self.is_special(b) {
            self.smallest_score()
        } else {
            self.score(a, b)
        }
    }

    /// True when `a` against `b` is an identity match. Specials never match,
    /// not even themselves.
    #[inline]
    fn is_match(&self, a: u8, b: u8) -> bool {
        a == b && !self.is_special(a)
    }
}

impl<M: ScoreModel + ?Sized> ScoreModel for &M {
    #[inline]
    fn score(&self, a: u8, b: u8) -> i32 {
        (**self).score(a, b)
    }

    #[inline]
    fn is_special(&self, c: u8) -> bool {
        (**self).is_special(c)
    }

    #[inline]
    fn smallest_score(&self) -> i32 {
        (**self).smallest_score()
    }
}

/// Dense `alphabet_size x alphabet_size` score table. Codes at or above
/// `alphabet_size` are special.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionMatrix {
    alphabet_size: usize,
    scores: Vec<i8>,
    smallest: i32,
}

impl SubstitutionMatrix {
    /// Build from a row-major table. `wildcard` is the score for pairs with a
    /// special symbol before it is folded into `smallest_score`.
    pub fn new(alphabet_size: usize, scores: Vec<i8>, wildcard: i8) -> Result<Self> {
        if alphabet_size == 0 || alphabet_size > u8::MAX as usize {
            return Err(DbandError::InvalidScoreModel(format!(
                "alphabet size {alphabet_size} not in 1..=255"
            )));
        }
        if scores.len() != alphabet_size * alphabet_size {
            return Err(DbandError::InvalidScoreModel(format!(
                "expected {} table entries for alphabet size {}, got {}",
                alphabet_size * alphabet_size,
                alphabet_size,
                scores.len()
            )));
        }
        let smallest = scores.iter().copied().chain(Some(wildcard)).min().unwrap_or(wildcard) as i32;
        if smallest >= 0 {
            return Err(DbandError::InvalidScoreModel(format!(
                "smallest score must be negative, got {smallest}"
            )));
        }
        Ok(Self {
            alphabet_size,
            scores,
            smallest,
        })
    }

    // Defaults, nucleotide(1, 1, -1), in the bwa_fill_scmat() shape. N is
    // special and takes the smallest score.
    //    A  C  G  T  N
    // A  1 -1 -1 -1 -1
    // C -1  1 -1 -1 -1
    // G -1 -1  1 -1 -1
    // T -1 -1 -1  1 -1
    // N -1 -1 -1 -1 -1

    /// A, C, G, T table with `match_score` on the diagonal and
    /// `-mismatch_penalty` elsewhere. N (code 4) and above are special.
    pub fn nucleotide(match_score: i8, mismatch_penalty: i8, wildcard: i8) -> Result<Self> {
        let n = NUCLEOTIDE_ALPHABET_SIZE;
        let mut scores = vec![0i8; n * n];
        for a in 0..n {
            for b in 0..n {
                scores[a * n + b] = if a == b {
                    match_score
                } else {
                    mismatch_penalty.saturating_neg()
                };
            }
        }
        Self::new(n, scores, wildcard)
    }

    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }
}

impl ScoreModel for SubstitutionMatrix {
    #[inline]
    fn score(&self, a: u8, b: u8) -> i32 {
        self.scores[a as usize * self.alphabet_size + b as usize] as i32
    }

    #[inline]
    fn is_special(&self, c: u8) -> bool {
        c as usize >= self.alphabet_size
    }

    #[inline]
    fn smallest_score(&self) -> i32 {
        self.smallest
    }
}

/// Affine gap penalties as positive magnitudes. A gap of length `k` costs
/// `gap_opening + k * gap_extension`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapCosts {
    gap_opening: i32,
    gap_extension: i32,
}

impl GapCosts {
    /// Both penalties must be positive and `gap_opening + gap_extension`
    /// must not exceed [`MAX_GAP_COST`].
    pub fn new(gap_opening: i32, gap_extension: i32) -> Result<Self> {
        let total = gap_opening.checked_add(gap_extension);
        if gap_opening <= 0 || gap_extension <= 0 || total.map_or(true, |t| t > MAX_GAP_COST) {
            return Err(DbandError::InvalidGapPenalty {
                gap_opening,
                gap_extension,
            });
        }
        Ok(Self {
            gap_opening,
            gap_extension,
        })
    }

    #[inline]
    pub fn gap_opening(&self) -> i32 {
        self.gap_opening
    }

    #[inline]
    pub fn gap_extension(&self) -> i32 {
        self.gap_extension
    }

    /// Score delta for the first column of a gap: `-(open + ext)`.
    #[inline]
    pub fn start_penalty(&self) -> i32 {
        -(self.gap_opening + self.gap_extension)
    }

    /// Score delta for each further column of a gap: `-ext`.
    #[inline]
    pub fn extend_penalty(&self) -> i32 {
        -self.gap_extension
    }

    /// Cost of one gap run of length `len`, as a negative score.
    #[inline]
    pub fn gap_score(&self, len: usize) -> i64 {
        if len == 0 {
            0
        } else {
            -(self.gap_opening as i64) - self.gap_extension as i64 * len as i64
        }
    }
}

/// Check that a sentinel stays negative and far enough from `i32::MIN`
/// that adding penalties to it cannot overflow.
#[inline]
pub fn check_sentinel(sentinel: i64) -> Result<i32> {
    if sentinel < 0 && sentinel > (i32::MIN / 2) as i64 {
        Ok(sentinel as i32)
    } else {
        Err(DbandError::SentinelOverflow { sentinel })
    }
}

/// Sentinel for sequences of length `ulen` and `vlen`:
/// `(ulen + vlen + 1) * min(smallest_score, -(open + ext))`.
///
/// Every real path score is at least `-(ulen + vlen) * max(|smallest|,
/// open + ext) - open`, so values derived from the sentinel never beat a
/// real one.
pub fn sentinel_for<M: ScoreModel + ?Sized>(
    ulen: usize,
    vlen: usize,
    model: &M,
    costs: &GapCosts,
) -> Result<i32> {
    let per_column = (model.smallest_score() as i64).min(costs.start_penalty() as i64);
    let columns = ulen as i64 + vlen as i64 + 1;
    check_sentinel(columns.saturating_mul(per_column))
}
