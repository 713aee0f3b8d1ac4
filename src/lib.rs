//! Banded affine-gap global alignment.
//!
//! The engine fills the Gotoh three-state DP inside a diagonal band using a
//! reusable [`alignment::Reservoir`], optionally keeps the band for traceback
//! (full scores or 2-bit backpointers), and can widen the band until a
//! target score is met.

pub mod align_opt;
pub mod alignment;
pub mod defaults;
pub mod error;
pub mod io;

pub use align_opt::AlignOpt;
pub use error::{DbandError, Result};
