pub mod band;
pub mod batch;
pub mod driver;
pub mod eoplist;
pub mod fill;
pub mod reservoir;
pub mod scoring;
pub mod traceback;
pub mod types;
pub mod utils;

pub use band::Band;
pub use batch::{align_batch, align_pair, PairAlignment, PairRef};
pub use driver::{align_adaptive, align_in_band, AdaptiveTarget, AlignmentSummary, DiagonalBandAligner};
pub use eoplist::{CigarOp, Eop, Eoplist};
pub use fill::{fill, fill_score_only, fill_with_trace};
pub use reservoir::{Reservoir, ReservoirStats, TraceEncoding};
pub use scoring::{sentinel_for, GapCosts, ScoreModel, SubstitutionMatrix};
pub use traceback::traceback;
pub use types::{Edge, ScoreTriple, TraceBits};
