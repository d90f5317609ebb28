//! One heuristic detector per analysis type.
//!
//! Every detector takes a decoded RGB image and returns findings plus an
//! overlay of identical dimensions. None of them is diagnostic.

pub mod brain_tumor;
pub mod fracture;
pub mod lung_nodule;
pub mod organ;
pub mod retinal;

use super::imaging::round2;

/// `value * multiplier`, clamped to `[0, ceiling]` and rounded to 2 decimals.
pub(crate) fn scaled_confidence(value: f64, multiplier: f64, ceiling: f64) -> f64 {
    round2((value * multiplier).clamp(0.0, ceiling))
}
