//! Recovery of number combinations from loosely-typed stored values.
//!
//! The `chosen_numbers` column has been written in several shapes over time:
//! a flat list, a list of lists, a comma separated string, a JSON string
//! holding a list (sometimes encoded twice) and occasionally an object keyed
//! by position. [`normalize`] accepts any of them and returns the
//! combinations in the order they were stored.
//!
//! Malformed input never fails: it only yields fewer combinations.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Maximum nesting depth visited before a branch is ignored.
pub const MAX_DEPTH: usize = 64;

/// Default amount of numbers in one combination.
pub const DEFAULT_PICK_SIZE: usize = 7;

/// Default size of the number pool (numbers run from 1 to this value).
pub const DEFAULT_POOL_SIZE: u32 = 60;

/// Shape of a draw: how many numbers make a combination and how large the
/// pool is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRules {
    /// Numbers per combination (N).
    #[serde(default = "default_pick_size")]
    pub pick_size: usize,
    /// Highest number in the pool (M).
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DrawRules {
    fn default() -> Self {
        Self {
            pick_size: DEFAULT_PICK_SIZE,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

const fn default_pick_size() -> usize {
    DEFAULT_PICK_SIZE
}

const fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

/// Recover the list of combinations held in `value`.
///
/// Numbers outside `0..=pool_size` are dropped, the rest is split into groups
/// of `pick_size`. A trailing group shorter than `pick_size` is kept as is.
#[must_use]
pub fn normalize(value: &Value, rules: &DrawRules) -> Vec<Vec<u32>> {
    let flat = filtered(value, rules);
    if flat.is_empty() {
        return Vec::new();
    }

    flat.chunks(rules.pick_size.max(1))
        .map(<[u32]>::to_vec)
        .collect()
}

/// Flatten combinations into the form written to storage.
#[must_use]
pub fn flatten(combinations: &[Vec<u32>]) -> Vec<u32> {
    combinations.iter().flatten().copied().collect()
}

/// Every number found in `value`, in visiting order, restricted to the pool.
fn filtered(value: &Value, rules: &DrawRules) -> Vec<u32> {
    if is_blank(value) {
        return Vec::new();
    }

    let mut flat = Vec::new();
    collect(value, 0, &mut flat);

    flat.into_iter()
        .filter_map(|n| u32::try_from(n).ok())
        .filter(|n| *n <= rules.pool_size)
        .collect()
}

/// Null, `false`, zero and the empty string count as "nothing stored".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn collect(value: &Value, depth: usize, out: &mut Vec<u64>) {
    if depth > MAX_DEPTH {
        return;
    }

    match value {
        Value::Number(n) => {
            if let Some(n) = whole_number(n) {
                out.push(n);
            }
        }
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(decoded) => collect(&decoded, depth + 1, out),
            Err(_) => out.extend(delimited_tokens(s)),
        },
        Value::Array(items) => {
            for item in items {
                collect(item, depth + 1, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect(item, depth + 1, out);
            }
        }
        Value::Null | Value::Bool(_) => {}
    }
}

/// Non-negative integral value of a JSON number, if it has one.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn whole_number(n: &Number) -> Option<u64> {
    if let Some(n) = n.as_u64() {
        return Some(n);
    }

    let f = n.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// Split on runs of commas/whitespace, keep only the digits of each token.
fn delimited_tokens(s: &str) -> impl Iterator<Item = u64> + '_ {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|token| {
            let digits: String = token.chars().filter(char::is_ascii_digit).collect();
            digits.parse::<u64>().ok()
        })
}
