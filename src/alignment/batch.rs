//! Parallel alignment of many independent pairs.
//!
//! Every rayon worker owns one [`Reservoir`] for the whole batch, so buffers
//! are reused across the pairs a worker handles and never shared between
//! threads.

use rayon::prelude::*;

use crate::align_opt::AlignOpt;
use crate::alignment::driver::{align_adaptive, AdaptiveTarget};
use crate::alignment::eoplist::Eoplist;
use crate::alignment::reservoir::Reservoir;
use crate::alignment::scoring::{GapCosts, SubstitutionMatrix};
use crate::error::Result;

/// Result of aligning one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairAlignment {
    pub score: i32,
    pub cigar: String,
    pub eoplist: Eoplist,
    pub left_dist: i64,
    pub right_dist: i64,
    pub iterations: usize,
}

/// Scoring state shared read-only by all workers.
struct BatchContext {
    model: SubstitutionMatrix,
    costs: GapCosts,
    target: AdaptiveTarget,
    distinguish: bool,
}

impl BatchContext {
    fn new(opt: &AlignOpt) -> Result<Self> {
        Ok(Self {
            model: opt.substitution_matrix()?,
            costs: opt.gap_costs()?,
            target: opt.target(),
            distinguish: opt.distinguish_mismatch_match,
        })
    }

    fn align(&self, reservoir: &mut Reservoir, useq: &[u8], vseq: &[u8]) -> Result<PairAlignment> {
        let mut eoplist = Eoplist::new();
        let summary = align_adaptive(
            reservoir,
            Some(&mut eoplist),
            &self.model,
            &self.costs,
            useq,
            vseq,
            &self.target,
        )?;
        Ok(PairAlignment {
            score: summary.score,
            cigar: eoplist.to_cigar_string(self.distinguish),
            eoplist,
            left_dist: summary.left_dist,
            right_dist: summary.right_dist,
            iterations: summary.iterations,
        })
    }
}

/// Align one pair of encoded sequences with `opt`, reusing `reservoir`.
pub fn align_pair(
    reservoir: &mut Reservoir,
    opt: &AlignOpt,
    useq: &[u8],
    vseq: &[u8],
) -> Result<PairAlignment> {
    BatchContext::new(opt)?.align(reservoir, useq, vseq)
}

/// Align every `(u, v)` pair in parallel on the current rayon pool.
///
/// Results keep the input order. A failing pair does not stop the others;
/// only invalid options fail the whole batch.
pub fn align_batch<P>(pairs: &[P], opt: &AlignOpt) -> Result<Vec<Result<PairAlignment>>>
where
    P: PairRef + Sync,
{
    let ctx = BatchContext::new(opt)?;
    let encoding = opt.encoding;
    log::debug!(
        "aligning {} pairs on {} threads",
        pairs.len(),
        rayon::current_num_threads()
    );
    Ok(pairs
        .par_iter()
        .map_init(
            || Reservoir::new(encoding),
            |reservoir, pair| ctx.align(reservoir, pair.useq(), pair.vseq()),
        )
        .collect())
}

/// Access to the two sequences of a pair.
pub trait PairRef {
    fn useq(&self) -> &[u8];
    fn vseq(&self) -> &[u8];
}

impl<U: AsRef<[u8]>, V: AsRef<[u8]>> PairRef for (U, V) {
    fn useq(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn vseq(&self) -> &[u8] {
        self.1.as_ref()
    }
}

impl PairRef for crate::io::SequencePair {
    fn useq(&self) -> &[u8] {
        &self.useq
    }

    fn vseq(&self) -> &[u8] {
        &self.vseq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::utils::encode_sequence;

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let pairs = vec![
            (encode_sequence(b"ACGT"), encode_sequence(b"AGT")),
            (encode_sequence(b""), encode_sequence(b"A")),
            (encode_sequence(b"ACGTACGT"), encode_sequence(b"ACGTACGT")),
        ];
        let results = align_batch(&pairs, &AlignOpt::default()).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().score, 0);
        assert!(results[1].is_err());
        let identity = results[2].as_ref().unwrap();
        assert_eq!(identity.score, 8);
        assert_eq!(identity.cigar, "8M");
    }

    #[test]
    fn test_invalid_options_fail_the_batch() {
        let opt = AlignOpt {
            gap_opening: 0,
            ..AlignOpt::default()
        };
        let pairs: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        assert!(align_batch(&pairs, &opt).is_err());
    }

    #[test]
    fn test_out_of_range_scores_fail_instead_of_clamping() {
        let opt = AlignOpt {
            mismatch_penalty: 500,
            ..AlignOpt::default()
        };
        let mut reservoir = Reservoir::default();
        let u = encode_sequence(b"ACGT");
        assert!(matches!(
            align_pair(&mut reservoir, &opt, &u, &u),
            Err(crate::error::DbandError::InvalidScoreModel(_))
        ));
        let pairs = vec![(u.clone(), u)];
        assert!(align_batch(&pairs, &opt).is_err());
    }
}
