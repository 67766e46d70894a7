// Uniqueness scoring: fingerprints, the rarity curve, percentile tiers,
// temporal windows, and the store-backed scorer tying them together.

pub mod fingerprint;
pub mod percentile;
pub mod rarity;
pub mod temporal;
pub mod uniqueness;

pub use fingerprint::{fingerprint, normalize};
pub use percentile::{PercentileResult, PercentileTier};
pub use uniqueness::{LiveUniqueness, UniquenessScorer, UniquenessSnapshot};
