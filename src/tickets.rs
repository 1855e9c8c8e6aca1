//! Combination generation and checkout validation.

use crate::error::{Error, Result};
use crate::numbers::DrawRules;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Draw a random combination ("quick pick"): distinct numbers from
/// `1..=pool_size`, sorted ascending.
#[must_use]
pub fn quick_pick<R: Rng + ?Sized>(rules: &DrawRules, rng: &mut R) -> Vec<u32> {
    let pool: Vec<u32> = (1..=rules.pool_size).collect();
    let mut picks: Vec<u32> = pool
        .choose_multiple(rng, rules.pick_size.min(pool.len()))
        .copied()
        .collect();
    picks.sort_unstable();
    picks
}

/// Check a combination before it is sold: exactly `pick_size` distinct
/// numbers, each within `1..=pool_size`.
///
/// # Errors
///
/// Returns [`Error::Validation`] describing the first problem found.
pub fn validate_combination(combination: &[u32], rules: &DrawRules) -> Result<()> {
    if combination.len() != rules.pick_size {
        return Err(Error::Validation(format!(
            "combination must have {} numbers, got {}",
            rules.pick_size,
            combination.len()
        )));
    }

    if let Some(n) = combination
        .iter()
        .find(|n| **n == 0 || **n > rules.pool_size)
    {
        return Err(Error::Validation(format!(
            "number {n} is outside 1..={}",
            rules.pool_size
        )));
    }

    let mut seen = HashSet::with_capacity(combination.len());
    if let Some(n) = combination.iter().find(|n| !seen.insert(**n)) {
        return Err(Error::Validation(format!("number {n} appears twice")));
    }

    Ok(())
}
