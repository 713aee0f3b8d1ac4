// src/defaults.rs

// Reservoir growth policy: new_capacity = max(requested, capacity * 1.2 + slack)
pub const GROWTH_FACTOR: f64 = 1.2;
pub const COLUMN_SLACK: usize = 128;
pub const POINTER_SLACK: usize = 128;
pub const BULK_SLACK: usize = 1024;

// Scoring Constants
pub const MATCH_SCORE: i32 = 1;
pub const MISMATCH_PENALTY: i32 = 1;
pub const WILDCARD_SCORE: i32 = -1;
pub const GAP_OPENING: i32 = 2;
pub const GAP_EXTENSION: i32 = 1;
// Largest gap_opening + gap_extension; a sentinel plus one gap start stays in i32
pub const MAX_GAP_COST: i32 = i32::MAX / 4;

// Band widening thresholds for the adaptive driver
pub const DOUBLING_LIMIT: usize = 4;
pub const THREE_HALVES_LIMIT: usize = 20;

// Other Constants
pub const VERBOSITY: i32 = 3;
pub const ALIGNMENT_LINE_WIDTH: usize = 70;
