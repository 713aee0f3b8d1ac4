// src/align_opt.rs
//
// Alignment options: scoring, band widening target and output shape

use clap::Args;

use crate::alignment::driver::AdaptiveTarget;
use crate::alignment::reservoir::TraceEncoding;
use crate::alignment::scoring::{GapCosts, SubstitutionMatrix};
use crate::defaults;
use crate::error::{DbandError, Result};

/// Options for banded global alignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignOpt {
    // Scoring parameters
    pub match_score: i32,      // Score for an identity (A)
    pub mismatch_penalty: i32, // Penalty for a substitution (B), positive
    pub wildcard_score: i32,   // Score for pairs involving N or other wildcards
    pub gap_opening: i32,      // Gap open penalty (O), positive
    pub gap_extension: i32,    // Gap extension penalty (E), positive

    // Band widening
    pub expected_score: Option<i32>, // Stop widening once the score reaches this
    pub converge: bool,              // Stop widening when the score stops changing

    // Traceback and output
    pub encoding: TraceEncoding,
    pub distinguish_mismatch_match: bool, // =/X instead of M in CIGAR output
    pub show_alignment: bool,
    pub line_width: usize,
}

impl Default for AlignOpt {
    fn default() -> Self {
        Self {
            match_score: defaults::MATCH_SCORE,
            mismatch_penalty: defaults::MISMATCH_PENALTY,
            wildcard_score: defaults::WILDCARD_SCORE,
            gap_opening: defaults::GAP_OPENING,
            gap_extension: defaults::GAP_EXTENSION,
            expected_score: None,
            converge: false,
            encoding: TraceEncoding::PackedBits,
            distinguish_mismatch_match: false,
            show_alignment: false,
            line_width: defaults::ALIGNMENT_LINE_WIDTH,
        }
    }
}

impl AlignOpt {
    /// Validate all parameters, collecting every problem.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Scoring validation. The table is stored as i8.
        let i8_range = i8::MIN as i32..=i8::MAX as i32;
        if !i8_range.contains(&self.match_score) {
            errors.push(format!(
                "match_score must fit in [-128, 127], got {}",
                self.match_score
            ));
        }
        if !(0..=i8::MAX as i32).contains(&self.mismatch_penalty) {
            errors.push(format!(
                "mismatch_penalty must be in [0, 127], got {}",
                self.mismatch_penalty
            ));
        }
        if !i8_range.contains(&self.wildcard_score) {
            errors.push(format!(
                "wildcard_score must fit in [-128, 127], got {}",
                self.wildcard_score
            ));
        }
        if self.mismatch_penalty <= 0 && self.wildcard_score >= 0 {
            errors.push("one of mismatch_penalty > 0 or wildcard_score < 0 is required".to_string());
        }
        if self.gap_opening <= 0 {
            errors.push(format!("gap_opening must be > 0, got {}", self.gap_opening));
        }
        if self.gap_extension <= 0 {
            errors.push(format!(
                "gap_extension must be > 0, got {}",
                self.gap_extension
            ));
        }
        if (self.gap_opening as i64 + self.gap_extension as i64) > defaults::MAX_GAP_COST as i64 {
            errors.push(format!(
                "gap_opening + gap_extension must be <= {}, got {}",
                defaults::MAX_GAP_COST,
                self.gap_opening as i64 + self.gap_extension as i64
            ));
        }

        if self.line_width == 0 {
            errors.push("line_width must be >= 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Nucleotide substitution table (A, C, G, T; N is special).
    pub fn substitution_matrix(&self) -> Result<SubstitutionMatrix> {
        SubstitutionMatrix::nucleotide(
            score_to_i8("match_score", self.match_score)?,
            score_to_i8("mismatch_penalty", self.mismatch_penalty)?,
            score_to_i8("wildcard_score", self.wildcard_score)?,
        )
    }

    pub fn gap_costs(&self) -> Result<GapCosts> {
        GapCosts::new(self.gap_opening, self.gap_extension)
    }

    pub fn target(&self) -> AdaptiveTarget {
        AdaptiveTarget {
            expected_score: self.expected_score,
            converge: self.converge,
        }
    }
}

// The table is stored as i8
fn score_to_i8(name: &str, value: i32) -> Result<i8> {
    i8::try_from(value).map_err(|_| {
        DbandError::InvalidScoreModel(format!("{} = {} does not fit in [-128, 127]", name, value))
    })
}

/// Scoring and output options shared by all subcommands
#[derive(Debug, Clone, Args)]
pub struct AlignCliOptions {
    // ===== Scoring Options =====
    /// Score for a sequence match
    #[arg(short = 'A', long, value_name = "INT", default_value_t = defaults::MATCH_SCORE)]
    pub match_score: i32,

    /// Penalty for a mismatch
    #[arg(short = 'B', long, value_name = "INT", default_value_t = defaults::MISMATCH_PENALTY)]
    pub mismatch_penalty: i32,

    /// Score for pairs involving N or any non-ACGT symbol
    #[arg(long, value_name = "INT", default_value_t = defaults::WILDCARD_SCORE, allow_hyphen_values = true)]
    pub wildcard_score: i32,

    /// Gap open penalty
    #[arg(short = 'O', long, value_name = "INT", default_value_t = defaults::GAP_OPENING)]
    pub gap_open: i32,

    /// Gap extension penalty
    #[arg(short = 'E', long, value_name = "INT", default_value_t = defaults::GAP_EXTENSION)]
    pub gap_extend: i32,

    // ===== Band Options =====
    /// Widen the band until the score reaches this value
    #[arg(long, value_name = "INT", allow_hyphen_values = true)]
    pub expected_score: Option<i32>,

    /// Stop widening when the score no longer changes
    #[arg(long)]
    pub converge: bool,

    /// Keep full (R,D,I) scores for traceback instead of 2-bit backpointers
    #[arg(long)]
    pub full_scores: bool,

    // ===== Output Options =====
    /// Use =/X instead of M in CIGAR strings
    #[arg(long)]
    pub distinguish: bool,

    /// Print each alignment in three-line form
    #[arg(long)]
    pub show: bool,

    /// Columns per line for --show
    #[arg(long, value_name = "INT", default_value_t = defaults::ALIGNMENT_LINE_WIDTH)]
    pub line_width: usize,
}

impl AlignCliOptions {
    pub fn to_align_opt(&self) -> AlignOpt {
        AlignOpt {
            match_score: self.match_score,
            mismatch_penalty: self.mismatch_penalty,
            wildcard_score: self.wildcard_score,
            gap_opening: self.gap_open,
            gap_extension: self.gap_extend,
            expected_score: self.expected_score,
            converge: self.converge,
            encoding: if self.full_scores {
                TraceEncoding::FullScores
            } else {
                TraceEncoding::PackedBits
            },
            distinguish_mismatch_match: self.distinguish,
            show_alignment: self.show,
            line_width: self.line_width,
        }
    }
}
