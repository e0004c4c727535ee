//! Reward tables: coin rolls and seal rarity draws.
//!
//! Everything here is pure. Randomness comes in through `&mut impl Rng`
//! so callers (and tests) control the seed.

use crate::models::{Difficulty, Rarity, Seal};
use rand::Rng;

/// Spread applied around the base coin value, inclusive on both ends.
pub const REWARD_VARIANCE: i32 = 5;

/// Roll a coin reward: base plus uniform variance, never below 1.
pub fn roll_reward(base: u32, rng: &mut impl Rng) -> u32 {
    let variance = rng.gen_range(-REWARD_VARIANCE..=REWARD_VARIANCE);
    (base as i64 + variance as i64).max(1) as u32
}

/// Cumulative thresholds for UR, SR, and R against one uniform [0,1) draw.
/// Anything past the R threshold is N.
fn rarity_thresholds(difficulty: Difficulty) -> [f64; 3] {
    match difficulty {
        Difficulty::Easy => [0.03, 0.13, 0.43],
        Difficulty::Normal => [0.05, 0.25, 0.65],
        Difficulty::Hard => [0.10, 0.40, 0.80],
    }
}

/// Roll a rarity tier. First match wins, checked UR then SR then R.
pub fn roll_rarity(difficulty: Difficulty, rng: &mut impl Rng) -> Rarity {
    let x: f64 = rng.gen();
    let [ur, sr, r] = rarity_thresholds(difficulty);
    if x < ur {
        Rarity::UR
    } else if x < sr {
        Rarity::SR
    } else if x < r {
        Rarity::R
    } else {
        Rarity::N
    }
}

/// Draw a seal from the pool: pick a rarity tier, then uniformly among the
/// seals of that tier. A tier with no seals falls back to a uniform pick
/// over the whole pool. Returns `None` only for an empty pool.
pub fn draw_seal<'a>(
    difficulty: Difficulty,
    pool: &'a [Seal],
    rng: &mut impl Rng,
) -> Option<&'a Seal> {
    if pool.is_empty() {
        return None;
    }

    let rarity = roll_rarity(difficulty, rng);
    let candidates: Vec<&Seal> = pool.iter().filter(|s| s.rarity == rarity).collect();

    if candidates.is_empty() {
        pool.get(rng.gen_range(0..pool.len()))
    } else {
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}
